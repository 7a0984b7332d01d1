//! Per-directory unit of recursive scanning work.

use std::fs::DirEntry;
use std::io;
use std::path::PathBuf;

use rayon::Scope;
use tokio_util::sync::CancellationToken;

use agemark_core::{Finding, ScanConfig, ScanError};

use crate::metadata::{MetadataReader, read_age};
use crate::progress::ProgressTracker;
use crate::sink::ResultSink;

/// Shared state every task of one scan reads from or reports to.
pub(crate) struct ScanContext<'a> {
    pub config: &'a ScanConfig,
    pub reader: &'a dyn MetadataReader,
    pub sink: &'a ResultSink,
    pub progress: &'a ProgressTracker,
    pub token: &'a CancellationToken,
}

/// How a single directory visit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskState {
    /// Children were evaluated and their visits scheduled.
    Done,
    /// Cancellation was observed before the visit finished.
    Cancelled,
}

/// A directory waiting to be visited.
#[derive(Debug, Clone)]
pub(crate) struct ScanTask {
    path: PathBuf,
    /// The parent already recorded an attribute-read error for this directory.
    attribute_failed: bool,
}

impl ScanTask {
    /// The task for the scan root, which is never aged itself.
    pub fn root(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            attribute_failed: false,
        }
    }

    /// Visit the directory: list it, evaluate each sub-directory against the
    /// threshold in listing order, then fan out one task per sub-directory
    /// onto `scope`.
    pub(crate) fn run<'s, 'a: 's>(self, ctx: &'s ScanContext<'a>, scope: &Scope<'s>) -> TaskState {
        if ctx.token.is_cancelled() {
            return TaskState::Cancelled;
        }

        let entries = match list(&self.path) {
            Ok(entries) => entries,
            Err(err) => {
                self.report_listing_error(ctx, &err);
                return TaskState::Done;
            }
        };

        let subdirs: Vec<PathBuf> = entries
            .iter()
            .filter(|entry| is_directory(entry, ctx.config.follow_symlinks))
            .map(DirEntry::path)
            .collect();

        tracing::trace!(
            path = %self.path.display(),
            entries = entries.len(),
            subdirs = subdirs.len(),
            "listed directory"
        );

        if subdirs.is_empty() {
            return TaskState::Done;
        }

        ctx.progress.discover(subdirs.len() as u64);

        let mut children = Vec::with_capacity(subdirs.len());
        for path in subdirs {
            if ctx.token.is_cancelled() {
                return TaskState::Cancelled;
            }

            let attribute_failed = match read_age(ctx.reader, &path, ctx.config.now_millis) {
                Ok(age) => {
                    if ctx.config.is_old_enough(age) {
                        ctx.sink.record(Finding::new(path.clone(), age));
                    }
                    false
                }
                Err(err) => {
                    ctx.sink.record(ScanError::attribute_read(path.clone(), &err));
                    true
                }
            };
            ctx.progress.increment();

            children.push(ScanTask {
                path,
                attribute_failed,
            });
        }

        for child in children {
            if ctx.token.is_cancelled() {
                return TaskState::Cancelled;
            }
            scope.spawn(move |scope| {
                child.run(ctx, scope);
            });
        }

        TaskState::Done
    }

    fn report_listing_error(&self, ctx: &ScanContext<'_>, err: &io::Error) {
        // At most one error per directory.
        if self.attribute_failed {
            tracing::warn!(
                path = %self.path.display(),
                %err,
                "could not list directory whose attributes were unreadable"
            );
            return;
        }
        tracing::debug!(path = %self.path.display(), %err, "could not list directory");
        ctx.sink.record(ScanError::listing(self.path.clone(), err));
    }
}

/// Read every entry of a directory, failing if any entry cannot be read.
fn list(path: &std::path::Path) -> io::Result<Vec<DirEntry>> {
    std::fs::read_dir(path)?.collect()
}

fn is_directory(entry: &DirEntry, follow_symlinks: bool) -> bool {
    let file_type = match entry.file_type() {
        Ok(file_type) => file_type,
        Err(err) => {
            tracing::debug!(path = %entry.path().display(), %err, "could not classify entry");
            return false;
        }
    };

    if file_type.is_symlink() && follow_symlinks {
        // Broken links and links to files are not directories.
        return std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
    }
    file_type.is_dir()
}
