//! Concurrent directory-age scanning engine for agemark.
//!
//! This crate walks a directory tree on a bounded worker pool and reports every
//! sub-directory whose age (days since creation, or since modification where
//! creation time is unavailable) meets a threshold.
//!
//! # Overview
//!
//! - **Fan-out traversal** - each directory is one unit of work on a rayon
//!   pool; its sub-directories are spawned as new units
//! - **Cooperative cancellation** via a shared [`CancellationToken`]
//! - **Progress** pollable or via broadcast channels
//! - **Streaming** of findings and errors as they are recorded
//!
//! # Example
//!
//! ```rust,no_run
//! use agemark_scan::{ScanConfig, ScanCoordinator};
//!
//! let config = ScanConfig::builder().root("/data").min_days(30i64).build().unwrap();
//! let mut handle = ScanCoordinator::new().stream_events(true).start(config).unwrap();
//! let mut events = handle.take_events().unwrap();
//!
//! std::thread::spawn(move || {
//!     while let Some(event) = events.blocking_recv() {
//!         println!("{event}");
//!     }
//! });
//!
//! let result = handle.wait().unwrap();
//! println!("{} old directories", result.finding_count());
//! ```

mod coordinator;
mod event;
mod metadata;
mod progress;
mod sink;
mod task;

pub use coordinator::{ScanCanceller, ScanCoordinator, ScanHandle};
pub use event::{ScanEvent, ScanResult};
pub use metadata::{DirTimes, FsMetadataReader, MetadataReader, read_age, system_time_millis};
pub use progress::{PROGRESS_BROADCAST_INTERVAL, ProgressTracker, ScanProgress};
pub use sink::ResultSink;
pub use tokio_util::sync::CancellationToken;

// Re-export core types for convenience
pub use agemark_core::{
    Finding, ScanConfig, ScanError, ScanErrorKind, ScanFailed, ScanRecord, parse_min_days,
};
