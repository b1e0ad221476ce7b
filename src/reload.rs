//! Hot reload of the active rule set.
//!
//! Readers take a cheap `Arc` clone of the current [`RuleSet`] and evaluate
//! with no lock held. A reload builds a complete new set first and then
//! replaces the pointer, so a reader observes either the old set or the new
//! one, never a mixture.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::{Config, KeyrulesError, RuleSet, RuleSetLoader};

/// Kind of filesystem change reported for a path in a rule directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Deleted,
    /// The writer finished changing the file.
    ChangesDone,
    /// Contents changed and more changes may follow.
    Modified,
    AttributesChanged,
    Other,
}

impl ChangeKind {
    fn triggers_reload(self) -> bool {
        matches!(
            self,
            ChangeKind::Created | ChangeKind::Deleted | ChangeKind::ChangesDone
        )
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Deleted,
            EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::ChangesDone,
            EventKind::Modify(ModifyKind::Data(_)) => data_change(),
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::AttributesChanged,
            EventKind::Modify(_) => ChangeKind::Modified,
            _ => ChangeKind::Other,
        }
    }
}

/// inotify reports every partial write as a data change and signals the end
/// of a write with close-after-write.
#[cfg(target_os = "linux")]
fn data_change() -> ChangeKind {
    ChangeKind::Modified
}

/// Other backends never report close-after-write, so a data change is the
/// only signal that a write happened.
#[cfg(not(target_os = "linux"))]
fn data_change() -> ChangeKind {
    ChangeKind::ChangesDone
}

/// Emitted to change listeners after a new rule set has been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadEvent {
    pub generation: u64,
    pub files_loaded: usize,
    pub files_failed: usize,
}

type Listener = Arc<dyn Fn(&ReloadEvent) + Send + Sync>;

/// Owns the active rule set and replaces it when rule files change.
pub struct ReloadController {
    loader: RuleSetLoader,
    suffix: String,
    current: RwLock<Arc<RuleSet>>,
    reload_lock: Mutex<()>,
    generation: AtomicU64,
    listeners: RwLock<Vec<Listener>>,
}

impl std::fmt::Debug for ReloadController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadController")
            .field("dirs", &self.loader.dirs())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl ReloadController {
    /// Perform the initial load. When no directory can be read the controller
    /// starts with an empty rule set.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let loader = RuleSetLoader::new(config);
        let initial = match loader.load() {
            Ok(report) => report.into_rule_set(),
            Err(e) => {
                warn!(error = %e, "initial rules load failed, starting with no rules");
                RuleSet::empty(config.wheel_group())
            }
        };
        Self {
            loader,
            suffix: config.suffix().to_owned(),
            current: RwLock::new(Arc::new(initial)),
            reload_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// The active rule set. Holding the returned `Arc` keeps that snapshot
    /// alive across later reloads.
    #[must_use]
    pub fn current(&self) -> Arc<RuleSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of rule sets published since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Register a listener called after every successful reload.
    ///
    /// Listeners run on the reloading thread after the new set is visible,
    /// in generation order. A listener must not call [`reload`](Self::reload).
    pub fn on_changed(&self, listener: impl Fn(&ReloadEvent) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Rebuild the rule set from disk and publish it.
    ///
    /// # Errors
    ///
    /// Returns [`KeyrulesError::NoReadableDirectory`] when no rule directory
    /// could be read; the previous rule set stays active.
    pub fn reload(&self) -> Result<ReloadEvent, KeyrulesError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let report = self.loader.load()?;
        let (files_loaded, files_failed) = (report.loaded(), report.failed());
        let next = Arc::new(report.into_rule_set());

        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, next)
        };
        // Freed outside the write lock so readers are not held up.
        drop(previous);

        let event = ReloadEvent {
            generation: self.generation.fetch_add(1, Ordering::AcqRel) + 1,
            files_loaded,
            files_failed,
        };
        info!(
            generation = event.generation,
            files = event.files_loaded,
            failed = event.files_failed,
            "reloaded rules"
        );

        // Still under the reload lock, so listeners see generations in order.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(&event);
        }
        Ok(event)
    }

    /// Whether a change to `path` warrants a reload.
    #[must_use]
    pub fn is_qualifying(&self, path: &Path, kind: ChangeKind) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        kind.triggers_reload()
            && !name.starts_with('.')
            && !name.starts_with('#')
            && name.ends_with(&self.suffix)
    }

    /// Change notification hook. Reloads when the change qualifies and
    /// returns whether a new rule set was published.
    pub fn on_change(&self, path: &Path, kind: ChangeKind) -> bool {
        if !self.is_qualifying(path, kind) {
            debug!(path = %path.display(), ?kind, "ignoring change");
            return false;
        }
        info!(path = %path.display(), ?kind, "rules file changed, reloading");
        match self.reload() {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "reload failed, keeping previous rules");
                false
            }
        }
    }

    fn handle_event(&self, event: &Event) {
        let kind = ChangeKind::from(&event.kind);
        if let Some(path) = event.paths.iter().find(|p| self.is_qualifying(p, kind)) {
            self.on_change(path, kind);
        }
    }

    /// Start watching every configured directory that exists.
    ///
    /// Directories that cannot be watched are logged and skipped. Watching
    /// stops when the returned [`RulesWatcher`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`KeyrulesError::Watch`] if a watcher cannot be created.
    pub fn watch(self: &Arc<Self>) -> Result<RulesWatcher, KeyrulesError> {
        let mut watchers = Vec::new();
        for dir in self.loader.dirs() {
            let controller = Arc::clone(self);
            let mut watcher =
                notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                    Ok(event) => controller.handle_event(&event),
                    Err(e) => warn!(error = %e, "filesystem watcher error"),
                })?;
            match watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    info!(path = %dir.display(), "watching rules directory for changes");
                    watchers.push(watcher);
                }
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "cannot watch rules directory");
                }
            }
        }
        Ok(RulesWatcher { watchers })
    }
}

/// Keeps the directory watchers alive.
pub struct RulesWatcher {
    watchers: Vec<RecommendedWatcher>,
}

impl RulesWatcher {
    /// Number of directories being watched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}
