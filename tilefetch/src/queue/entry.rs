//! Queue entry types.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Maximum length of an entry description.
const MAX_DESCRIPTION_CHARS: usize = 40;

/// Suffix appended to the target path while a transfer is in flight.
pub const TEMP_SUFFIX: &str = ".part";

/// Slippy-map tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Column, 0 at the west edge
    pub x: u32,
    /// Row, 0 at the north edge
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// What an entry downloads. Bulk abort filters on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Tile,
    File,
}

/// Lifecycle of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Waiting for a transfer slot
    Idle,
    /// Transfer in flight
    Running,
    /// Finished (committed or failed), about to be removed
    Done,
}

impl EntryState {
    /// Entries may only leave the store while nothing is writing their temp file.
    pub fn is_removable(self) -> bool {
        matches!(self, EntryState::Idle | EntryState::Done)
    }
}

/// How long a local copy of a requested file stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Always fetch, even if a local copy exists
    Always,
    /// Any existing local copy is good enough
    Never,
    /// Fetch again once the local copy is at least this old
    After(Duration),
}

impl Expiry {
    /// Maps the signed-seconds convention: `0` always fetches, negative
    /// never expires, positive is a maximum age.
    pub fn from_secs(secs: i64) -> Self {
        match secs {
            0 => Expiry::Always,
            s if s < 0 => Expiry::Never,
            s => Expiry::After(Duration::from_secs(s.unsigned_abs())),
        }
    }
}

/// Identity used by the dedup gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryIdentity {
    Tile(TileCoord),
    /// Files are identified by their target path
    File,
}

/// Store-assigned entry handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One pending, in-flight or finished download.
#[derive(Debug, Clone)]
pub(crate) struct QueueEntry {
    pub id: EntryId,
    pub identity: EntryIdentity,
    pub target_path: PathBuf,
    pub temp_path: PathBuf,
    pub source_url: String,
    pub state: EntryState,
    pub description: String,
}

impl QueueEntry {
    /// Builds a tile entry laid out as `base_dir/zoom/x/y.ext`.
    ///
    /// Returns `None` if any of the string inputs is empty.
    pub fn tile(server_url: &str, tile: TileCoord, base_dir: &Path, ext: &str) -> Option<Self> {
        let server_url = server_url.trim_end_matches('/');
        let ext = ext.trim_start_matches('.');
        if server_url.is_empty() || ext.is_empty() || base_dir.as_os_str().is_empty() {
            return None;
        }

        let relative = format!("{}/{}/{}.{}", tile.zoom, tile.x, tile.y, ext);
        let target_path = base_dir
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.{}", tile.y, ext));

        Some(Self {
            id: EntryId(0),
            identity: EntryIdentity::Tile(tile),
            temp_path: temp_path_for(&target_path),
            target_path,
            source_url: format!("{}/{}", server_url, relative),
            state: EntryState::Idle,
            description: format!("Tile:{}", tile),
        })
    }

    /// Builds a file entry downloading `url` into `local_path`.
    ///
    /// Returns `None` if the URL or path is empty.
    pub fn file(url: &str, local_path: &Path) -> Option<Self> {
        if url.trim().is_empty() || local_path.as_os_str().is_empty() {
            return None;
        }

        Some(Self {
            id: EntryId(0),
            identity: EntryIdentity::File,
            target_path: local_path.to_path_buf(),
            temp_path: temp_path_for(local_path),
            source_url: url.trim().to_string(),
            state: EntryState::Idle,
            description: file_description(local_path),
        })
    }

    pub fn kind(&self) -> EntryKind {
        match self.identity {
            EntryIdentity::Tile(_) => EntryKind::Tile,
            EntryIdentity::File => EntryKind::File,
        }
    }

    pub fn tile_coord(&self) -> Option<TileCoord> {
        match self.identity {
            EntryIdentity::Tile(coord) => Some(coord),
            EntryIdentity::File => None,
        }
    }
}

/// `target` with `.part` appended, in the same directory.
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// `File:<path>`, keeping only the tail of long paths.
fn file_description(path: &Path) -> String {
    let path = path.to_string_lossy();
    let budget = MAX_DESCRIPTION_CHARS - "File:".len();
    let count = path.chars().count();
    if count <= budget {
        return format!("File:{}", path);
    }

    let keep = budget - "...".len();
    let tail: String = path.chars().skip(count - keep).collect();
    format!("File:...{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_layout() {
        let entry = QueueEntry::tile(
            "https://tiles.example/",
            TileCoord::new(10, 20, 5),
            Path::new("/tmp/cache"),
            "png",
        )
        .unwrap();

        assert_eq!(entry.source_url, "https://tiles.example/5/10/20.png");
        assert_eq!(entry.target_path, PathBuf::from("/tmp/cache/5/10/20.png"));
        assert_eq!(entry.temp_path, PathBuf::from("/tmp/cache/5/10/20.png.part"));
        assert_eq!(entry.description, "Tile:5/10/20");
        assert_eq!(entry.state, EntryState::Idle);
        assert_eq!(entry.kind(), EntryKind::Tile);
        assert_eq!(entry.tile_coord(), Some(TileCoord::new(10, 20, 5)));
    }

    #[test]
    fn test_tile_without_trailing_slash() {
        let entry = QueueEntry::tile(
            "https://tiles.example",
            TileCoord::new(1, 2, 3),
            Path::new("cache"),
            ".jpg",
        )
        .unwrap();
        assert_eq!(entry.source_url, "https://tiles.example/3/1/2.jpg");
        assert_eq!(entry.target_path, PathBuf::from("cache/3/1/2.jpg"));
    }

    #[test]
    fn test_malformed_tile_rejected() {
        let coord = TileCoord::new(0, 0, 0);
        assert!(QueueEntry::tile("", coord, Path::new("/tmp"), "png").is_none());
        assert!(QueueEntry::tile("/", coord, Path::new("/tmp"), "png").is_none());
        assert!(QueueEntry::tile("https://t", coord, Path::new(""), "png").is_none());
        assert!(QueueEntry::tile("https://t", coord, Path::new("/tmp"), "").is_none());
    }

    #[test]
    fn test_file_entry() {
        let entry =
            QueueEntry::file("https://example.org/alerts.xml", Path::new("/tmp/alerts.xml"))
                .unwrap();
        assert_eq!(entry.temp_path, PathBuf::from("/tmp/alerts.xml.part"));
        assert_eq!(entry.description, "File:/tmp/alerts.xml");
        assert_eq!(entry.kind(), EntryKind::File);
        assert_eq!(entry.tile_coord(), None);
    }

    #[test]
    fn test_malformed_file_rejected() {
        assert!(QueueEntry::file("", Path::new("/tmp/a")).is_none());
        assert!(QueueEntry::file("  ", Path::new("/tmp/a")).is_none());
        assert!(QueueEntry::file("https://x", Path::new("")).is_none());
    }

    #[test]
    fn test_long_file_description_keeps_tail() {
        let path = Path::new("/var/cache/tilefetch/weather/alerts/region/eastern/latest.xml");
        let desc = file_description(path);
        assert!(desc.starts_with("File:..."));
        assert!(desc.ends_with("eastern/latest.xml"));
        assert_eq!(desc.chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_expiry_from_secs() {
        assert_eq!(Expiry::from_secs(0), Expiry::Always);
        assert_eq!(Expiry::from_secs(-1), Expiry::Never);
        assert_eq!(
            Expiry::from_secs(3600),
            Expiry::After(Duration::from_secs(3600))
        );
    }

    #[test]
    fn test_removable_states() {
        assert!(EntryState::Idle.is_removable());
        assert!(EntryState::Done.is_removable());
        assert!(!EntryState::Running.is_removable());
    }
}
