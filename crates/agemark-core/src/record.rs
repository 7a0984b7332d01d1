//! Scan findings and the records the sink collects.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// A directory whose age met the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Whole days since creation (or modification).
    pub age_days: i64,
}

impl Finding {
    /// Create a new finding.
    pub fn new(path: impl Into<PathBuf>, age_days: i64) -> Self {
        Self {
            path: path.into(),
            age_days,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Folder: \"{}\", days since creation: {}",
            self.path.display(),
            self.age_days
        )
    }
}

/// One entry in the result sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanRecord {
    Finding(Finding),
    Error(ScanError),
}

impl ScanRecord {
    /// Directory this record refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Finding(finding) => &finding.path,
            Self::Error(error) => &error.path,
        }
    }

    pub fn as_finding(&self) -> Option<&Finding> {
        match self {
            Self::Finding(finding) => Some(finding),
            Self::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ScanError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Finding(_) => None,
        }
    }
}

impl From<Finding> for ScanRecord {
    fn from(finding: Finding) -> Self {
        Self::Finding(finding)
    }
}

impl From<ScanError> for ScanRecord {
    fn from(error: ScanError) -> Self {
        Self::Error(error)
    }
}

impl fmt::Display for ScanRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finding(finding) => finding.fmt(f),
            Self::Error(error) => error.fmt(f),
        }
    }
}

/// Whole days between `timestamp_millis` and `now_millis`, truncated toward zero.
///
/// Timestamps in the future give a negative age.
pub fn age_days(timestamp_millis: i64, now_millis: i64) -> i64 {
    now_millis.saturating_sub(timestamp_millis) / MILLIS_PER_DAY
}
