//! Error types for scanning operations.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that end a scan without a result.
///
/// Problems with individual directories never end up here; those are
/// recorded as [`ScanError`] values and the scan carries on.
#[derive(Debug, Error)]
pub enum ScanFailed {
    /// The worker pool could not be created.
    #[error("Could not start worker pool: {message}")]
    ThreadPool { message: String },

    /// The thread driving the scan could not be started.
    #[error("Could not start scan thread: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked while visiting a directory.
    #[error("Scan worker panicked: {message}")]
    WorkerPanicked { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Kind of per-directory scan error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanErrorKind {
    /// The directory's children could not be enumerated.
    Listing,
    /// The directory's timestamps could not be read.
    AttributeRead,
}

/// Non-fatal error for one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    /// Directory the error refers to.
    pub path: PathBuf,
    /// Human-readable cause.
    pub reason: String,
    /// Which step failed.
    pub kind: ScanErrorKind,
}

impl ScanError {
    /// Create a new scan error.
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>, kind: ScanErrorKind) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            kind,
        }
    }

    /// Create an error for a directory that could not be listed.
    pub fn listing(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, error.to_string(), ScanErrorKind::Listing)
    }

    /// Create an error for a directory whose attributes could not be read.
    pub fn attribute_read(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::new(path, error.to_string(), ScanErrorKind::AttributeRead)
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScanErrorKind::Listing => {
                write!(f, "Could not access directory: {}", self.path.display())
            }
            ScanErrorKind::AttributeRead => write!(
                f,
                "Could not read folder info: {} - {}",
                self.path.display(),
                self.reason
            ),
        }
    }
}
