use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::scope::SettingsScope;

/// Watches settings files for external edits and reports, debounced, which
/// scopes changed so the caller can reload them.
///
/// The parent directory of each file is watched rather than the file itself:
/// flushes replace the file through a rename, which would orphan a watch on
/// the old inode. Directories that do not exist yet are skipped; nothing is
/// created to make them watchable.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<Result<Event, notify::Error>>,
    targets: Vec<(SettingsScope, PathBuf)>,
    debounce_duration: Duration,
    last_event_time: Option<Instant>,
    pending_changes: HashSet<SettingsScope>,
}

impl SettingsWatcher {
    /// Start watching `targets` (scope and settings file path pairs), e.g.
    /// [`SettingsManager::watch_targets`](crate::SettingsManager::watch_targets).
    pub fn new(targets: Vec<(SettingsScope, PathBuf)>, debounce_ms: u64) -> notify::Result<Self> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;

        let mut watched = HashSet::new();
        for (scope, path) in &targets {
            let Some(dir) = path.parent() else {
                continue;
            };
            if !dir.is_dir() {
                tracing::debug!(%scope, dir = %dir.display(), "settings directory absent, not watching");
                continue;
            }
            if watched.insert(dir.to_path_buf()) {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
            }
        }

        Ok(Self {
            _watcher: watcher,
            rx,
            targets,
            debounce_duration: Duration::from_millis(debounce_ms),
            last_event_time: None,
            pending_changes: HashSet::new(),
        })
    }

    /// Scopes whose files changed, once the debounce period has elapsed
    /// since the last event. `None` while quiet or still debouncing.
    pub fn check_for_changes(&mut self) -> Option<Vec<SettingsScope>> {
        let mut has_new_events = false;

        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if !should_process_event(&event) {
                        continue;
                    }
                    for path in &event.paths {
                        if let Some(scope) = scope_for_path(&self.targets, path) {
                            self.pending_changes.insert(scope);
                            has_new_events = true;
                        }
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!("settings watcher error: {e}");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if has_new_events {
            self.last_event_time = Some(Instant::now());
        }

        if let Some(last_time) = self.last_event_time
            && !self.pending_changes.is_empty()
            && last_time.elapsed() >= self.debounce_duration
        {
            let mut changes: Vec<SettingsScope> = self.pending_changes.drain().collect();
            changes.sort();
            self.last_event_time = None;
            return Some(changes);
        }

        None
    }

    #[cfg(test)]
    pub fn debounce_duration(&self) -> Duration {
        self.debounce_duration
    }
}

/// Only content-affecting events trigger a reload.
fn should_process_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Map an event path to the scope whose settings file it is. The `.tmp`
/// sibling written during a flush counts as its file.
fn scope_for_path(targets: &[(SettingsScope, PathBuf)], path: &Path) -> Option<SettingsScope> {
    targets.iter().find_map(|(scope, target)| {
        let tmp = target.with_extension("json.tmp");
        (path == target || path == tmp).then_some(*scope)
    })
}
