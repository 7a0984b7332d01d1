//! Scan progress reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Processed directories between two progress broadcasts.
pub const PROGRESS_BROADCAST_INTERVAL: u64 = 64;

const PROGRESS_CHANNEL_SIZE: usize = 100;

/// Progress information during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Directories evaluated so far.
    pub processed: u64,
    /// Directories discovered so far.
    pub total: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            processed: 0,
            total: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Completion ratio in `[0.0, 1.0]`, 0 while nothing has been discovered.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.processed as f64 / self.total as f64).min(1.0)
        }
    }

    /// Whether every discovered directory has been evaluated.
    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// Calculate scan rate in directories per second.
    pub fn dirs_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.processed as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared discovered/processed counters.
///
/// The total grows as directories are discovered during the single traversal
/// pass. A directory is always discovered before it is processed, so a
/// snapshot never shows more processed than discovered directories.
#[derive(Debug)]
pub struct ProgressTracker {
    start_time: Instant,
    processed: AtomicU64,
    total: AtomicU64,
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_SIZE);
        Self {
            start_time: Instant::now(),
            processed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            progress_tx,
        }
    }

    /// Subscribe to throttled progress snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Add newly discovered directories to the total.
    pub fn discover(&self, count: u64) {
        self.total.fetch_add(count, Ordering::AcqRel);
    }

    /// Count one evaluated directory.
    pub fn increment(&self) {
        let processed = self.processed.fetch_add(1, Ordering::AcqRel) + 1;
        if processed % PROGRESS_BROADCAST_INTERVAL == 0 {
            self.broadcast();
        }
    }

    /// Send the current snapshot to subscribers.
    pub fn broadcast(&self) {
        // No subscribers is fine.
        let _ = self.progress_tx.send(self.snapshot());
    }

    pub fn snapshot(&self) -> ScanProgress {
        // Processed is read first: total only grows, and always ahead of it.
        let processed = self.processed.load(Ordering::Acquire);
        let total = self.total.load(Ordering::Acquire);
        ScanProgress {
            processed,
            total,
            elapsed: self.start_time.elapsed(),
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ratio() {
        let mut progress = ScanProgress::new();
        assert_eq!(progress.ratio(), 0.0);
        assert!(progress.is_complete());

        progress.total = 4;
        progress.processed = 1;
        assert_eq!(progress.ratio(), 0.25);
        assert!(!progress.is_complete());

        progress.processed = 4;
        assert_eq!(progress.ratio(), 1.0);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_dirs_per_second() {
        let mut progress = ScanProgress::new();
        progress.processed = 50;
        assert_eq!(progress.dirs_per_second(), 0.0);

        progress.elapsed = Duration::from_millis(500);
        assert_eq!(progress.dirs_per_second(), 100.0);
    }

    #[test]
    fn test_tracker_counts() {
        let tracker = ProgressTracker::new();
        tracker.discover(3);
        tracker.increment();
        tracker.increment();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.total, 3);
        assert_eq!(snapshot.processed, 2);
    }

    #[test]
    fn test_concurrent_increments() {
        let tracker = Arc::new(ProgressTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        tracker.discover(1);
                        tracker.increment();
                        let snapshot = tracker.snapshot();
                        assert!(snapshot.processed <= snapshot.total);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.processed, 8000);
        assert_eq!(snapshot.total, 8000);
    }

    #[test]
    fn test_broadcast_is_throttled() {
        let tracker = ProgressTracker::new();
        let mut rx = tracker.subscribe();
        tracker.discover(PROGRESS_BROADCAST_INTERVAL);

        for _ in 0..PROGRESS_BROADCAST_INTERVAL - 1 {
            tracker.increment();
        }
        assert!(rx.try_recv().is_err());

        tracker.increment();
        let progress = rx.try_recv().unwrap();
        assert_eq!(progress.processed, PROGRESS_BROADCAST_INTERVAL);
    }
}
