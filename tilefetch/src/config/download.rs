//! Download manager configuration.

use std::time::Duration;

use super::defaults::*;

/// Where the transfer loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// A background worker thread drains the queue and exits when idle.
    #[default]
    Background,
    /// No worker thread; `run_all_now` drains the queue on the caller's thread.
    Foreground,
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "background" => Ok(ExecutionMode::Background),
            "foreground" => Ok(ExecutionMode::Foreground),
            other => Err(format!("unknown execution mode '{}'", other)),
        }
    }
}

/// Tuning knobs for the download manager.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tilefetch::config::DownloadConfig;
///
/// let config = DownloadConfig::default();
/// assert_eq!(config.max_concurrent_transfers(), 8);
///
/// let config = DownloadConfig::new()
///     .with_max_concurrent_transfers(2)
///     .with_network_timeout(Duration::from_secs(30));
/// assert_eq!(config.connect_timeout(), Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Maximum transfers in flight (0 = unbounded)
    max_concurrent_transfers: usize,
    /// Whole-request timeout
    network_timeout: Duration,
    /// Cached tiles younger than this are not fetched again
    tile_freshness: Duration,
    /// Sleep between loop iterations
    loop_interval: Duration,
    /// Sleep per idle poll
    idle_poll_interval: Duration,
    /// Idle polls before the worker exits
    idle_polls_before_shutdown: u32,
    /// Polling granularity of `wait_until_idle`
    wait_poll_interval: Duration,
    execution_mode: ExecutionMode,
    user_agent: String,
    event_channel_capacity: usize,
}

impl DownloadConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of concurrent transfers.
    ///
    /// `0` means unbounded. That is accepted but discouraged.
    pub fn with_max_concurrent_transfers(mut self, max: usize) -> Self {
        self.max_concurrent_transfers = max;
        self
    }

    /// Set the shared network timeout. The connect timeout is derived as half.
    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Override the tile freshness window (default 7 days).
    pub fn with_tile_freshness(mut self, freshness: Duration) -> Self {
        self.tile_freshness = freshness;
        self
    }

    /// Set the sleep between worker loop iterations.
    pub fn with_loop_interval(mut self, interval: Duration) -> Self {
        self.loop_interval = interval;
        self
    }

    /// Set the idle poll length and the number of idle polls before shutdown.
    ///
    /// The worker's idle grace period is `interval * polls`.
    pub fn with_idle_shutdown(mut self, interval: Duration, polls: u32) -> Self {
        self.idle_poll_interval = interval;
        self.idle_polls_before_shutdown = polls;
        self
    }

    /// Set the polling granularity of `wait_until_idle`.
    pub fn with_wait_poll_interval(mut self, interval: Duration) -> Self {
        self.wait_poll_interval = interval;
        self
    }

    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Maximum concurrent transfers (0 = unbounded).
    pub fn max_concurrent_transfers(&self) -> usize {
        self.max_concurrent_transfers
    }

    /// Returns true if another transfer may start with `running` in flight.
    pub fn has_transfer_capacity(&self, running: usize) -> bool {
        self.max_concurrent_transfers == 0 || running < self.max_concurrent_transfers
    }

    pub fn network_timeout(&self) -> Duration {
        self.network_timeout
    }

    /// Connect timeout, half of the network timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.network_timeout / 2
    }

    pub fn tile_freshness(&self) -> Duration {
        self.tile_freshness
    }

    pub fn loop_interval(&self) -> Duration {
        self.loop_interval
    }

    pub fn idle_poll_interval(&self) -> Duration {
        self.idle_poll_interval
    }

    pub fn idle_polls_before_shutdown(&self) -> u32 {
        self.idle_polls_before_shutdown
    }

    /// Total time the worker lingers with nothing to do.
    pub fn idle_grace_period(&self) -> Duration {
        self.idle_poll_interval
            .saturating_mul(self.idle_polls_before_shutdown)
    }

    pub fn wait_poll_interval(&self) -> Duration {
        self.wait_poll_interval
    }

    pub fn execution_mode(&self) -> ExecutionMode {
        self.execution_mode
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn event_channel_capacity(&self) -> usize {
        self.event_channel_capacity
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_transfers: DEFAULT_MAX_CONCURRENT_TRANSFERS,
            network_timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
            tile_freshness: DEFAULT_TILE_FRESHNESS,
            loop_interval: DEFAULT_LOOP_INTERVAL,
            idle_poll_interval: DEFAULT_IDLE_POLL_INTERVAL,
            idle_polls_before_shutdown: DEFAULT_IDLE_POLLS_BEFORE_SHUTDOWN,
            wait_poll_interval: DEFAULT_WAIT_POLL_INTERVAL,
            execution_mode: ExecutionMode::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}
