//! One scope's settings file: last-loaded snapshot plus staged edits.
//!
//! Reads never create anything on disk. The only write path is
//! [`ScopedStore::reconcile_and_persist`], which re-reads the file right before
//! writing so edits made by other processes since the last load survive.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::{self, SettingsDocument};
use crate::error::PersistenceError;
use crate::error_sink::ErrorSink;
use crate::scope::SettingsScope;

/// A staged, not yet persisted, change to one top-level key.
#[derive(Debug, Clone, PartialEq)]
enum PendingChange {
    Set(Value),
    Remove,
}

#[derive(Debug)]
pub struct ScopedStore {
    scope: SettingsScope,
    path: PathBuf,
    last_loaded: SettingsDocument,
    pending: BTreeMap<String, PendingChange>,
    errors: ErrorSink,
}

impl ScopedStore {
    /// Create the store and load its file once.
    pub fn open(scope: SettingsScope, path: PathBuf, errors: ErrorSink) -> Self {
        let mut store = Self {
            scope,
            path,
            last_loaded: SettingsDocument::new(),
            pending: BTreeMap::new(),
            errors,
        };
        store.load();
        store
    }

    pub fn scope(&self) -> SettingsScope {
        self.scope
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Refresh `last_loaded` from disk.
    ///
    /// A missing file loads as an empty document. A file that cannot be read
    /// or parsed is reported to the error sink and the previous snapshot is
    /// kept.
    pub fn load(&mut self) {
        match document::read_document(&self.path) {
            Ok(Some(mut doc)) => {
                if document::migrate_legacy_keys(&mut doc) {
                    tracing::debug!(scope = %self.scope, "migrated legacy settings keys");
                }
                tracing::debug!(
                    scope = %self.scope,
                    path = %self.path.display(),
                    keys = doc.len(),
                    "loaded settings"
                );
                self.last_loaded = doc;
            }
            Ok(None) => {
                tracing::debug!(
                    scope = %self.scope,
                    path = %self.path.display(),
                    "settings file not found, using empty document"
                );
                self.last_loaded = SettingsDocument::new();
            }
            Err(message) => {
                tracing::warn!(
                    scope = %self.scope,
                    path = %self.path.display(),
                    "failed to load settings: {message}"
                );
                self.errors.record(self.scope, message);
            }
        }
    }

    /// Re-read from disk. Staged edits are kept and still win.
    pub fn reload(&mut self) {
        self.load();
    }

    /// Staged value if any (a staged removal reads as absent), else the
    /// last-loaded one.
    pub fn effective_value(&self, key: &str) -> Option<&Value> {
        match self.pending.get(key) {
            Some(PendingChange::Set(value)) => Some(value),
            Some(PendingChange::Remove) => None,
            None => self.last_loaded.get(key),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.effective_value(key).is_some()
    }

    /// Stage `value` under `key`. Never touches disk.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.pending.insert(key.into(), PendingChange::Set(value));
    }

    /// Stage the removal of `key`. Never touches disk.
    pub fn unset(&mut self, key: impl Into<String>) {
        self.pending.insert(key.into(), PendingChange::Remove);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Keys staged since the last successful flush.
    pub fn pending_keys(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }

    /// Snapshot of the file as of the last load or flush.
    pub fn last_loaded(&self) -> &SettingsDocument {
        &self.last_loaded
    }

    /// The document this store currently represents: last-loaded content
    /// with staged edits applied.
    pub fn effective_document(&self) -> SettingsDocument {
        self.overlay_pending(self.last_loaded.clone())
    }

    /// Merge staged edits into the file's current content and write it.
    ///
    /// The file is re-read first so keys changed on disk since the last load
    /// are kept unless this store staged the same key, in which case the
    /// staged value wins. The parent directory is created here and nowhere
    /// else. On failure nothing in memory changes, so the call can be retried.
    pub async fn reconcile_and_persist(&mut self) -> Result<(), PersistenceError> {
        let current = match document::read_document_async(&self.path).await {
            Ok(Some(mut doc)) => {
                document::migrate_legacy_keys(&mut doc);
                doc
            }
            Ok(None) => SettingsDocument::new(),
            Err(message) => {
                tracing::warn!(
                    scope = %self.scope,
                    path = %self.path.display(),
                    "re-read before flush failed, merging onto last loaded snapshot: {message}"
                );
                self.last_loaded.clone()
            }
        };

        let merged = self.overlay_pending(current);
        write_document(self.scope, &self.path, &merged).await?;

        tracing::info!(
            scope = %self.scope,
            path = %self.path.display(),
            keys = self.pending.len(),
            "persisted settings"
        );
        self.last_loaded = merged;
        self.pending.clear();
        Ok(())
    }

    fn overlay_pending(&self, mut base: SettingsDocument) -> SettingsDocument {
        for (key, change) in &self.pending {
            match change {
                PendingChange::Set(value) => {
                    base.insert(key.clone(), value.clone());
                }
                PendingChange::Remove => {
                    base.shift_remove(key);
                }
            }
        }
        base
    }
}

/// Atomically replace `path` with the pretty-printed document via a `.tmp`
/// sibling, creating the parent directory first.
async fn write_document(
    scope: SettingsScope,
    path: &Path,
    doc: &SettingsDocument,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|source| PersistenceError::Serialize { scope, source })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| PersistenceError::CreateDir {
                scope,
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json.as_bytes())
        .await
        .map_err(|source| PersistenceError::Write {
            scope,
            path: tmp.clone(),
            source,
        })?;

    if let Err(source) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(PersistenceError::Write {
            scope,
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
