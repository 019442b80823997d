//! Async watch orchestrator.
//!
//! Wires a [`FileSource`], a [`RefreshController`] and a filesystem watcher
//! together, runs the controller loop in a tokio task, and hands the caller a
//! [`SnapshotReader`] for the live aggregate.

use std::path::PathBuf;

use fruitpal_core::error::Result;
use fruitpal_core::models::InputFormat;
use notify::RecommendedWatcher;

use crate::refresh_controller::{FileSource, RefreshController, SnapshotReader};
use crate::watcher::{watch_directory, FileFilter};

// ── WatchOrchestrator ─────────────────────────────────────────────────────────

/// Background refresh coordinator for one data file.
pub struct WatchOrchestrator {
    data_path: PathBuf,
    format: InputFormat,
    watch_dir: PathBuf,
    filter: FileFilter,
}

impl WatchOrchestrator {
    /// # Parameters
    /// - `data_path` – file re-parsed on every refresh.
    /// - `format`    – input format of `data_path`.
    /// - `watch_dir` – directory whose direct children are watched.
    /// - `suffix`    – only files ending in this suffix trigger a refresh.
    pub fn new(
        data_path: impl Into<PathBuf>,
        format: InputFormat,
        watch_dir: impl Into<PathBuf>,
        suffix: &str,
    ) -> Self {
        Self {
            data_path: data_path.into(),
            format,
            watch_dir: watch_dir.into(),
            filter: FileFilter::new(suffix),
        }
    }

    /// Start watching.
    ///
    /// The watcher is installed before the initial load so no change is
    /// missed between the two. The initial load runs on the blocking pool;
    /// if it fails the reader starts on an empty snapshot.
    pub async fn start(self) -> Result<(SnapshotReader, WatchHandle)> {
        let controller = RefreshController::new(
            FileSource::new(self.data_path.clone(), self.format),
            self.filter,
        );

        let watcher = watch_directory(&self.watch_dir, controller.trigger())?;
        if !controller.refresh_once().await {
            tracing::warn!(
                path = %self.data_path.display(),
                "initial load failed; serving an empty snapshot until the next change"
            );
        }

        let reader = controller.reader();
        let task = tokio::spawn(controller.run());

        Ok((
            reader,
            WatchHandle {
                task,
                _watcher: watcher,
            },
        ))
    }
}

// ── WatchHandle ───────────────────────────────────────────────────────────────

/// Keeps the watcher alive and owns the controller task.
///
/// Dropping the handle stops filesystem events; call [`WatchHandle::abort`]
/// to stop the controller loop as well.
pub struct WatchHandle {
    task: tokio::task::JoinHandle<()>,
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.task.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
