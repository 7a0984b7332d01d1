//! Scan lifecycle: worker pool, root task, cancellation and result collection.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use rayon::ThreadPoolBuilder;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use agemark_core::{ScanConfig, ScanFailed};

use crate::event::{ScanEvent, ScanResult};
use crate::metadata::{FsMetadataReader, MetadataReader};
use crate::progress::{ProgressTracker, ScanProgress};
use crate::sink::ResultSink;
use crate::task::{ScanContext, ScanTask};

/// Starts scans on a dedicated, bounded worker pool.
///
/// ```rust,no_run
/// use agemark_scan::{ScanConfig, ScanCoordinator};
///
/// let config = ScanConfig::builder().root("/data").min_days(30i64).build().unwrap();
/// let handle = ScanCoordinator::new().start(config).unwrap();
/// let result = handle.wait().unwrap();
///
/// for finding in result.findings() {
///     println!("{finding}");
/// }
/// ```
#[derive(Clone, Default)]
pub struct ScanCoordinator {
    threads: Option<usize>,
    reader: Option<Arc<dyn MetadataReader>>,
    token: Option<CancellationToken>,
    stream_events: bool,
}

impl ScanCoordinator {
    /// Create a coordinator that sizes its pool from the scan config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force the worker pool size, overriding `ScanConfig::threads`.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Read directory timestamps through `reader` instead of the filesystem.
    pub fn with_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Use an existing cancellation token, e.g. one tied to process shutdown.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Stream every event; the receiver is available from [`ScanHandle::take_events`].
    pub fn stream_events(mut self, enabled: bool) -> Self {
        self.stream_events = enabled;
        self
    }

    /// Start scanning in the background and return immediately.
    pub fn start(&self, mut config: ScanConfig) -> Result<ScanHandle, ScanFailed> {
        if config.root.as_os_str().is_empty() {
            return Err(ScanFailed::InvalidConfig {
                message: "Root path cannot be empty".to_string(),
            });
        }
        if let Ok(absolute) = std::path::absolute(&config.root) {
            config.root = absolute;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }

        let token = self.token.clone().unwrap_or_default();
        let (sink, events) = if self.stream_events {
            let (tx, rx) = mpsc::unbounded_channel();
            (ResultSink::streaming(token.clone(), tx), Some(rx))
        } else {
            (ResultSink::new(token.clone()), None)
        };

        let shared = Arc::new(ScanShared {
            sink,
            progress: ProgressTracker::new(),
        });
        let reader = self.reader.clone().unwrap_or_else(|| {
            Arc::new(FsMetadataReader::following_symlinks(config.follow_symlinks))
        });

        let root = config.root.clone();
        let driver = std::thread::Builder::new()
            .name("agemark-scan".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                let token = token.clone();
                move || drive(&config, reader.as_ref(), &shared, &token)
            })
            .map_err(|source| ScanFailed::Spawn { source })?;

        Ok(ScanHandle {
            root,
            canceller: ScanCanceller { token, shared },
            driver,
            events,
        })
    }
}

struct ScanShared {
    sink: ResultSink,
    progress: ProgressTracker,
}

/// Runs the whole scan on the driver thread.
fn drive(
    config: &ScanConfig,
    reader: &dyn MetadataReader,
    shared: &ScanShared,
    token: &CancellationToken,
) -> Result<ScanResult, ScanFailed> {
    let started = Instant::now();
    let threads = config.worker_threads();

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("agemark-worker-{i}"))
        .build()
        .map_err(|err| fail(shared, ScanFailed::ThreadPool {
            message: err.to_string(),
        }))?;

    tracing::info!(
        root = %config.root.display(),
        min_days = config.min_days,
        threads,
        "scan started"
    );
    shared.sink.emit(ScanEvent::Started {
        root: config.root.clone(),
    });

    let ctx = ScanContext {
        config,
        reader,
        sink: &shared.sink,
        progress: &shared.progress,
        token,
    };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pool.scope(|scope| ScanTask::root(&config.root).run(&ctx, scope))
    }));
    if let Err(payload) = outcome {
        return Err(fail(shared, ScanFailed::WorkerPanicked {
            message: panic_message(payload.as_ref()),
        }));
    }

    let cancelled = token.is_cancelled();
    shared.sink.seal();
    shared.progress.broadcast();
    let progress = shared.progress.snapshot();
    let records = shared.sink.drain();

    tracing::info!(
        root = %config.root.display(),
        records = records.len(),
        processed = progress.processed,
        total = progress.total,
        cancelled,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "scan finished"
    );

    shared.sink.emit(if cancelled {
        ScanEvent::Cancelled { progress }
    } else {
        ScanEvent::Completed { progress }
    });

    Ok(ScanResult {
        root: config.root.clone(),
        records,
        progress,
        cancelled,
        duration: started.elapsed(),
    })
}

fn fail(shared: &ScanShared, failed: ScanFailed) -> ScanFailed {
    tracing::error!(error = %failed, "scan failed");
    shared.sink.emit(ScanEvent::Failed {
        message: failed.to_string(),
    });
    failed
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Cancels a running scan. Cheap to clone and usable from any thread.
#[derive(Clone)]
pub struct ScanCanceller {
    token: CancellationToken,
    shared: Arc<ScanShared>,
}

impl ScanCanceller {
    /// Request cancellation. Idempotent.
    ///
    /// Once this returns, no further finding or error is recorded.
    pub fn cancel(&self) {
        self.token.cancel();
        self.shared.sink.seal();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Handle to a scan started by [`ScanCoordinator::start`].
pub struct ScanHandle {
    root: PathBuf,
    canceller: ScanCanceller,
    driver: JoinHandle<Result<ScanResult, ScanFailed>>,
    events: Option<mpsc::UnboundedReceiver<ScanEvent>>,
}

impl ScanHandle {
    /// Absolute root path being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.canceller.is_cancelled()
    }

    /// A cloneable canceller for use after the handle has been moved.
    pub fn canceller(&self) -> ScanCanceller {
        self.canceller.clone()
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> ScanProgress {
        self.canceller.shared.progress.snapshot()
    }

    /// Subscribe to throttled progress snapshots.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ScanProgress> {
        self.canceller.shared.progress.subscribe()
    }

    /// Take the event stream. `None` unless streaming was enabled, or if already taken.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ScanEvent>> {
        self.events.take()
    }

    /// Block until every task has finished or observed cancellation.
    pub fn wait(self) -> Result<ScanResult, ScanFailed> {
        self.driver.join().unwrap_or_else(|payload| {
            Err(ScanFailed::WorkerPanicked {
                message: panic_message(payload.as_ref()),
            })
        })
    }
}
