//! Default values for download manager settings.

use std::time::Duration;

// =============================================================================
// Transfers
// =============================================================================

/// Maximum number of transfers in flight at once.
///
/// A value of `0` removes the bound entirely, which lets a burst of map
/// movement open one socket per queued tile.
pub const DEFAULT_MAX_CONCURRENT_TRANSFERS: usize = 8;

/// Shared network timeout in seconds. The connect timeout is half of this.
pub const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 120;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("tilefetch/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Freshness
// =============================================================================

/// Age below which a cached tile is not fetched again (7 days).
pub const DEFAULT_TILE_FRESHNESS: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// =============================================================================
// Worker pacing
// =============================================================================

/// Sleep between worker loop iterations.
///
/// Caps new transfer starts at roughly ten per second.
pub const DEFAULT_LOOP_INTERVAL: Duration = Duration::from_millis(100);

/// Sleep taken for each idle poll once the queue has drained.
pub const DEFAULT_IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Idle polls the worker sits through before it shuts itself down.
pub const DEFAULT_IDLE_POLLS_BEFORE_SHUTDOWN: u32 = 10;

/// Granularity of `DownloadManager::wait_until_idle`.
pub const DEFAULT_WAIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of the completion event channel.
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
