//! File watching for automatic rebuilds.
//!
//! Uses `notify-debouncer-full` to watch the input directory (content,
//! includes, data and passthrough assets) and the config file for changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{
    Config as NotifyConfig, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher,
};
use notify_debouncer_full::{
    DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, new_debouncer_opt,
};

use crate::config::WatchConfig;
use crate::site::BuildConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Change kinds
// =============================================================================

/// What kind of file changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// The project config file
    Config,
    /// A layout or partial in the includes directory
    Template { path: PathBuf },
    /// A global data file
    Data { path: PathBuf },
    /// A content document
    Content { path: PathBuf, deleted: bool },
    /// Anything else under the input directory, e.g. passthrough assets
    Asset { path: PathBuf, deleted: bool },
}

impl ChangeKind {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ChangeKind::Config => None,
            ChangeKind::Template { path }
            | ChangeKind::Data { path }
            | ChangeKind::Content { path, .. }
            | ChangeKind::Asset { path, .. } => Some(path),
        }
    }

    /// Whether the file is gone rather than modified.
    pub fn is_removal(&self) -> bool {
        matches!(
            self,
            ChangeKind::Content { deleted: true, .. } | ChangeKind::Asset { deleted: true, .. }
        )
    }
}

// =============================================================================
// Watch events
// =============================================================================

/// Events sent from the file watcher.
#[derive(Debug)]
pub enum WatchEvent {
    /// Files changed, rebuild needed.
    FilesChanged(Vec<ChangeKind>),
    /// Watcher error occurred.
    Error(String),
}

// =============================================================================
// Path classification
// =============================================================================

/// Paths to watch for changes.
#[derive(Debug, Clone)]
pub struct WatchPaths {
    /// The input directory (watched recursively).
    pub input_dir: PathBuf,
    /// Output directory; changes there come from the build itself.
    pub output_dir: PathBuf,
    /// Config file path.
    pub config_path: PathBuf,
}

/// Classifies file paths into change types.
#[derive(Clone)]
pub struct PathClassifier {
    paths: WatchPaths,
    includes_dir: PathBuf,
    data_dir: PathBuf,
    /// Extensions rendered as content
    template_formats: Vec<String>,
}

impl PathClassifier {
    /// Create a new path classifier.
    pub fn new(paths: WatchPaths, config: &BuildConfig) -> Self {
        Self {
            includes_dir: paths.input_dir.join(&config.dir.includes),
            data_dir: paths.input_dir.join(&config.dir.data),
            template_formats: config.template_formats.clone(),
            paths,
        }
    }

    /// Classify a changed path into a ChangeKind.
    pub fn classify(&self, path: &Path, deleted: bool) -> Option<ChangeKind> {
        if path == self.paths.config_path {
            return Some(ChangeKind::Config);
        }

        if path.starts_with(&self.paths.output_dir) {
            return None;
        }
        let relative = path.strip_prefix(&self.paths.input_dir).ok()?;

        // Skip hidden files and directories
        if relative
            .components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        {
            return None;
        }

        let path_buf = path.to_path_buf();
        if path.starts_with(&self.includes_dir) {
            return Some(ChangeKind::Template { path: path_buf });
        }
        if path.starts_with(&self.data_dir) {
            return Some(ChangeKind::Data { path: path_buf });
        }

        let is_content = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.template_formats.iter().any(|f| f == ext));

        if is_content {
            Some(ChangeKind::Content {
                path: path_buf,
                deleted,
            })
        } else {
            Some(ChangeKind::Asset {
                path: path_buf,
                deleted,
            })
        }
    }
}

// =============================================================================
// File watcher
// =============================================================================

/// A file watcher that can use either native or polling backend.
pub enum FileWatcher {
    /// Native file system watcher (recommended for local development).
    Native {
        _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
    /// Polling-based watcher (for network filesystems, Docker, etc.).
    Polling {
        _debouncer: Debouncer<PollWatcher, RecommendedCache>,
        rx: Receiver<WatchEvent>,
    },
}

impl FileWatcher {
    /// Create a new file watcher.
    pub fn new(
        config: &WatchConfig,
        paths: &WatchPaths,
        classifier: PathClassifier,
    ) -> Result<Self, WatchError> {
        let debounce_timeout = Duration::from_millis(config.debounce_ms);

        // Create channel for events
        let (tx, rx) = mpsc::channel();

        // Callback to convert notify events to our WatchEvent type
        let classifier = classifier.clone();
        let callback = move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changes: Vec<ChangeKind> = events
                        .iter()
                        .filter_map(|event| {
                            let deleted = matches!(event.kind, EventKind::Remove(_));
                            // Only process events for actual file changes
                            if !is_relevant_event(&event.kind) {
                                return None;
                            }
                            // Classify the first path (usually there's only one)
                            event
                                .paths
                                .first()
                                .and_then(|p| classifier.classify(p, deleted))
                        })
                        .collect();

                    if !changes.is_empty() {
                        let _ = tx.send(WatchEvent::FilesChanged(changes));
                    }
                }
                Err(errors) => {
                    for e in errors {
                        let _ = tx.send(WatchEvent::Error(e.to_string()));
                    }
                }
            }
        };

        if config.poll {
            // Use polling watcher
            let poll_interval = Duration::from_millis(config.poll_interval_ms);
            let notify_config = NotifyConfig::default().with_poll_interval(poll_interval);

            let mut debouncer = new_debouncer_opt::<_, PollWatcher, RecommendedCache>(
                debounce_timeout,
                None,
                callback,
                RecommendedCache::default(),
                notify_config,
            )
            .map_err(WatchError::Notify)?;

            add_watch_paths_to_debouncer(&mut debouncer, paths)?;

            Ok(FileWatcher::Polling {
                _debouncer: debouncer,
                rx,
            })
        } else {
            // Use native watcher
            let mut debouncer =
                new_debouncer(debounce_timeout, None, callback).map_err(WatchError::Notify)?;

            add_watch_paths_to_debouncer(&mut debouncer, paths)?;

            Ok(FileWatcher::Native {
                _debouncer: debouncer,
                rx,
            })
        }
    }

    /// Receive the next watch event (blocking).
    pub fn recv(&self) -> Option<WatchEvent> {
        match self {
            FileWatcher::Native { rx, .. } => rx.recv().ok(),
            FileWatcher::Polling { rx, .. } => rx.recv().ok(),
        }
    }
}

/// Add watch paths to a debouncer.
fn add_watch_paths_to_debouncer<W: Watcher, C: notify_debouncer_full::FileIdCache>(
    debouncer: &mut Debouncer<W, C>,
    paths: &WatchPaths,
) -> Result<(), WatchError> {
    // Content, includes, data and assets all live under the input directory
    if paths.input_dir.exists() {
        debouncer.watch(&paths.input_dir, RecursiveMode::Recursive)?;
    }

    // Watch config file's parent directory (to catch config changes)
    if let Some(parent) = paths.config_path.parent()
        && parent.exists()
    {
        debouncer.watch(parent, RecursiveMode::NonRecursive)?;
    }

    Ok(())
}

/// Check if an event kind is relevant for rebuilds.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
    )
}
