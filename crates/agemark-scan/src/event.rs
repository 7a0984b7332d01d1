//! Stream events and the terminal scan result.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use agemark_core::{Finding, ScanError, ScanRecord};

use crate::progress::ScanProgress;

/// One item of the live output stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanEvent {
    /// The scan began.
    Started { root: PathBuf },
    /// A finding or error was recorded.
    Record(ScanRecord),
    /// The whole tree was visited.
    Completed { progress: ScanProgress },
    /// The scan stopped early at the caller's request.
    Cancelled { progress: ScanProgress },
    /// The scan could not run to a terminal state.
    Failed { message: String },
}

impl ScanEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Cancelled { .. } | Self::Failed { .. }
        )
    }
}

impl fmt::Display for ScanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { root } => write!(f, "Scan started: {}", root.display()),
            Self::Record(record) => record.fmt(f),
            Self::Completed { .. } => f.write_str("Scan completed."),
            Self::Cancelled { .. } => f.write_str("Scan cancelled by user."),
            Self::Failed { message } => write!(f, "Scan failed: {message}"),
        }
    }
}

/// Aggregate outcome of a scan that reached a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Absolute root path that was scanned.
    pub root: PathBuf,
    /// Findings and errors in arrival order.
    pub records: Vec<ScanRecord>,
    /// Final progress snapshot.
    pub progress: ScanProgress,
    /// Whether the scan was cancelled before finishing.
    pub cancelled: bool,
    /// Wall-clock duration of the scan.
    pub duration: Duration,
}

impl ScanResult {
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.records.iter().filter_map(ScanRecord::as_finding)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ScanError> {
        self.records.iter().filter_map(ScanRecord::as_error)
    }

    pub fn finding_count(&self) -> usize {
        self.findings().count()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agemark_core::ScanErrorKind;

    #[test]
    fn test_lifecycle_rendering() {
        let progress = ScanProgress::new();
        assert_eq!(
            ScanEvent::Started { root: "/data".into() }.to_string(),
            "Scan started: /data"
        );
        assert_eq!(ScanEvent::Completed { progress }.to_string(), "Scan completed.");
        assert_eq!(
            ScanEvent::Cancelled { progress }.to_string(),
            "Scan cancelled by user."
        );
        assert_eq!(
            ScanEvent::Failed { message: "no threads".into() }.to_string(),
            "Scan failed: no threads"
        );
    }

    #[test]
    fn test_terminal_events() {
        let progress = ScanProgress::new();
        assert!(!ScanEvent::Started { root: "/".into() }.is_terminal());
        assert!(!ScanEvent::Record(Finding::new("/a", 1).into()).is_terminal());
        assert!(ScanEvent::Completed { progress }.is_terminal());
        assert!(ScanEvent::Cancelled { progress }.is_terminal());
    }

    #[test]
    fn test_result_partitions_records() {
        let result = ScanResult {
            root: "/data".into(),
            records: vec![
                Finding::new("/data/a", 40).into(),
                ScanError::new("/data/b", "denied", ScanErrorKind::AttributeRead).into(),
                Finding::new("/data/c", 31).into(),
            ],
            progress: ScanProgress::new(),
            cancelled: false,
            duration: Duration::ZERO,
        };

        assert_eq!(result.finding_count(), 2);
        assert_eq!(result.error_count(), 1);
        let ages: Vec<_> = result.findings().map(|f| f.age_days).collect();
        assert_eq!(ages, vec![40, 31]);
    }
}
