//! Change-triggered snapshot refresh.
//!
//! [`RefreshController`] owns the published [`AggregateSnapshot`]. Change
//! notifications arrive through a [`RefreshTrigger`]; the controller task
//! re-runs the parse + aggregate pipeline and atomically swaps in the new
//! snapshot. Readers hold a [`SnapshotReader`] and never block on a refresh:
//! they see either the previous snapshot or the new one, never a mix.
//!
//! Notifications are coalesced through a single [`Notify`] permit, so any
//! number of notifications during one refresh cause exactly one more.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use fruitpal_core::error::{FruitpalError, Result};
use fruitpal_core::models::InputFormat;
use fruitpal_data::aggregator::{AggregateSnapshot, TradeAggregator};
use fruitpal_data::reader::load_entries;
use tokio::sync::{watch, Notify};

use crate::watcher::{ChangeEvent, FileFilter};

// ── SnapshotSource ────────────────────────────────────────────────────────────

/// Anything that can produce a fresh snapshot on demand.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Run the full parse + aggregate pipeline.
    fn load(&self) -> Result<AggregateSnapshot>;
    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Loads snapshots from a trade data file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: InputFormat,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, format: InputFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn load(&self) -> Result<AggregateSnapshot> {
        let entries = load_entries(&self.path, self.format)?;
        Ok(TradeAggregator::aggregate(&entries))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Holding the last good snapshot.
    Idle,
    /// A re-parse is in flight.
    Refreshing,
}

/// Counters since the controller was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Notifications that passed the file filter (or explicit requests).
    pub requested: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Written only by the controller task, except `requested`.
#[derive(Debug, Default)]
struct Shared {
    refreshing: AtomicBool,
    requested: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Shared {
    fn state(&self) -> RefreshState {
        if self.refreshing.load(Ordering::Acquire) {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    fn stats(&self) -> RefreshStats {
        RefreshStats {
            requested: self.requested.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// ── SnapshotReader ────────────────────────────────────────────────────────────

/// Read-only handle on the published snapshot.
#[derive(Clone)]
pub struct SnapshotReader {
    published: Arc<ArcSwap<AggregateSnapshot>>,
    generation: watch::Receiver<u64>,
    shared: Arc<Shared>,
}

impl SnapshotReader {
    /// The currently published snapshot.
    pub fn current(&self) -> Arc<AggregateSnapshot> {
        self.published.load_full()
    }

    /// Number of snapshots published so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Wait until a newer snapshot is published.
    ///
    /// Returns `false` once the controller has gone away.
    pub async fn changed(&mut self) -> bool {
        self.generation.changed().await.is_ok()
    }

    pub fn state(&self) -> RefreshState {
        self.shared.state()
    }

    pub fn stats(&self) -> RefreshStats {
        self.shared.stats()
    }
}

// ── RefreshTrigger ────────────────────────────────────────────────────────────

/// Delivers change notifications to the controller. Cheap to clone and safe
/// to call from any thread, including the filesystem watcher's.
#[derive(Clone)]
pub struct RefreshTrigger {
    filter: FileFilter,
    pending: Arc<Notify>,
    shared: Arc<Shared>,
}

impl RefreshTrigger {
    /// Request a refresh if `event` passes the file filter.
    ///
    /// Returns whether the event was accepted.
    pub fn on_change(&self, event: &ChangeEvent) -> bool {
        if !self.filter.matches(event) {
            tracing::trace!(path = %event.path.display(), "ignoring change event");
            return false;
        }
        tracing::debug!(
            kind = ?event.kind,
            path = %event.path.display(),
            "data file changed"
        );
        self.request();
        true
    }

    /// Request a refresh unconditionally.
    pub fn request(&self) {
        self.shared.requested.fetch_add(1, Ordering::Relaxed);
        self.pending.notify_one();
    }
}

// ── RefreshController ─────────────────────────────────────────────────────────

/// Single writer of the published snapshot.
pub struct RefreshController<S: SnapshotSource> {
    source: Arc<S>,
    filter: FileFilter,
    published: Arc<ArcSwap<AggregateSnapshot>>,
    generation: watch::Sender<u64>,
    pending: Arc<Notify>,
    shared: Arc<Shared>,
}

impl<S: SnapshotSource> RefreshController<S> {
    /// Create a controller publishing an empty snapshot.
    pub fn new(source: S, filter: FileFilter) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            source: Arc::new(source),
            filter,
            published: Arc::new(ArcSwap::from_pointee(AggregateSnapshot::default())),
            generation,
            pending: Arc::new(Notify::new()),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            published: Arc::clone(&self.published),
            generation: self.generation.subscribe(),
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn trigger(&self) -> RefreshTrigger {
        RefreshTrigger {
            filter: self.filter.clone(),
            pending: Arc::clone(&self.pending),
            shared: Arc::clone(&self.shared),
        }
    }

    /// Load synchronously on the calling thread, for callers outside an
    /// async context.
    pub fn prime(&self) -> bool {
        self.shared.refreshing.store(true, Ordering::Release);
        let outcome = self.source.load();
        let published = self.settle(outcome);
        self.shared.refreshing.store(false, Ordering::Release);
        published
    }

    /// Run one refresh cycle. Returns `true` when a new snapshot was
    /// published; on failure the previous snapshot stays in place.
    pub async fn refresh_once(&self) -> bool {
        self.shared.refreshing.store(true, Ordering::Release);

        let source = Arc::clone(&self.source);
        let outcome = match tokio::task::spawn_blocking(move || source.load()).await {
            Ok(result) => result,
            Err(join_err) => Err(FruitpalError::RefreshFailed(join_err.to_string())),
        };
        let published = self.settle(outcome);

        self.shared.refreshing.store(false, Ordering::Release);
        published
    }

    /// Wait for notifications and refresh, one cycle at a time, forever.
    pub async fn run(self) {
        tracing::info!(source = %self.source.describe(), "refresh controller started");
        loop {
            self.pending.notified().await;
            self.refresh_once().await;
        }
    }

    fn settle(&self, outcome: Result<AggregateSnapshot>) -> bool {
        match outcome {
            Ok(snapshot) => {
                self.publish(snapshot);
                true
            }
            Err(e) => {
                let err = match e {
                    FruitpalError::RefreshFailed(_) => e,
                    other => FruitpalError::RefreshFailed(other.to_string()),
                };
                self.shared.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %err,
                    "keeping previous snapshot"
                );
                false
            }
        }
    }

    fn publish(&self, snapshot: AggregateSnapshot) {
        tracing::info!(
            records = snapshot.record_count,
            commodities = snapshot.commodities.len(),
            countries = snapshot.countries.len(),
            "publishing snapshot"
        );
        self.published.store(Arc::new(snapshot));
        self.shared.succeeded.fetch_add(1, Ordering::Relaxed);
        self.generation.send_modify(|g| *g += 1);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
