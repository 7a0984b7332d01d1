//! Directory timestamp reading and age computation.

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use agemark_core::age_days;

/// Creation timestamps that filesystems report when the real value is unknown.
const UNSET_CREATION_MILLIS: [i64; 2] = [0, -1];

/// Timestamps of one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirTimes {
    /// Creation time, when the platform and filesystem report one.
    pub created: Option<SystemTime>,
    /// Last modification time.
    pub modified: SystemTime,
}

impl DirTimes {
    /// Create timestamps with both times.
    pub fn new(created: Option<SystemTime>, modified: SystemTime) -> Self {
        Self { created, modified }
    }

    /// Milliseconds since the epoch of the timestamp used for aging.
    ///
    /// Creation time wins unless it is missing or one of the "unset" sentinels
    /// (the epoch itself or one millisecond before it), in which case the
    /// modification time is used.
    pub fn effective_millis(&self) -> i64 {
        self.created
            .map(system_time_millis)
            .filter(|&millis| !UNSET_CREATION_MILLIS.contains(&millis))
            .unwrap_or_else(|| system_time_millis(self.modified))
    }
}

/// Source of directory timestamps.
pub trait MetadataReader: Send + Sync {
    /// Read the timestamps of the directory at `path`.
    fn times(&self, path: &Path) -> io::Result<DirTimes>;
}

/// Reads timestamps from the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct FsMetadataReader {
    follow_symlinks: bool,
}

impl FsMetadataReader {
    /// Create a reader that reports the link target's times for symlinks.
    pub fn new() -> Self {
        Self::following_symlinks(true)
    }

    /// Create a reader that follows symlinks only when `follow_symlinks` is set.
    pub fn following_symlinks(follow_symlinks: bool) -> Self {
        Self { follow_symlinks }
    }
}

impl Default for FsMetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataReader for FsMetadataReader {
    fn times(&self, path: &Path) -> io::Result<DirTimes> {
        let metadata = if self.follow_symlinks {
            std::fs::metadata(path)?
        } else {
            std::fs::symlink_metadata(path)?
        };

        Ok(DirTimes::new(metadata.created().ok(), metadata.modified()?))
    }
}

/// Age in whole days of the directory at `path`, relative to `now_millis`.
pub fn read_age(reader: &dyn MetadataReader, path: &Path, now_millis: i64) -> io::Result<i64> {
    let times = reader.times(path)?;
    Ok(age_days(times.effective_millis(), now_millis))
}

/// Signed milliseconds between the Unix epoch and `time`.
pub fn system_time_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(err) => i64::try_from(err.duration().as_millis()).map_or(i64::MIN, |millis| -millis),
    }
}
