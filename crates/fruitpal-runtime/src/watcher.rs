//! Filesystem change notifications.
//!
//! Translates raw `notify` events into [`ChangeEvent`]s and forwards them to a
//! [`RefreshTrigger`]. Only direct children of the watched directory are seen.

use std::path::{Path, PathBuf};

use fruitpal_core::error::{FruitpalError, Result};
use notify::event::{CreateKind, EventKind};
use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::refresh_controller::RefreshTrigger;

/// Default suffix of files whose changes trigger a refresh.
pub const DEFAULT_SUFFIX: &str = ".txt";

// ── ChangeEvent ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
}

/// A single filesystem change under the watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub is_directory: bool,
    pub path: PathBuf,
}

/// Map a raw watcher event to zero or more change events.
///
/// Removals, renames-away and access events produce nothing.
pub fn change_events(event: &Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(_) => ChangeKind::Modified,
        _ => return Vec::new(),
    };
    let created_folder = matches!(event.kind, EventKind::Create(CreateKind::Folder));

    event
        .paths
        .iter()
        .map(|path| ChangeEvent {
            kind,
            is_directory: created_folder || path.is_dir(),
            path: path.clone(),
        })
        .collect()
}

// ── FileFilter ────────────────────────────────────────────────────────────────

/// Accepts non-directory changes whose file name ends with `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    suffix: String,
}

impl FileFilter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.is_directory {
            return false;
        }
        event
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(&self.suffix))
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

// ── Watcher ───────────────────────────────────────────────────────────────────

/// Watch `dir` (non-recursively) and feed every change into `trigger`.
///
/// The returned watcher stops delivering events when dropped.
pub fn watch_directory(dir: &Path, trigger: RefreshTrigger) -> Result<RecommendedWatcher> {
    let handler = move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for change in change_events(&event) {
                trigger.on_change(&change);
            }
        }
        Err(e) => tracing::warn!(error = %e, "filesystem watcher error"),
    };

    let mut watcher = RecommendedWatcher::new(handler, NotifyConfig::default())
        .map_err(|e| FruitpalError::Watch(e.to_string()))?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| FruitpalError::Watch(format!("{}: {}", dir.display(), e)))?;

    tracing::info!(dir = %dir.display(), "watching for data file changes");
    Ok(watcher)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
