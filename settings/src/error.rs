use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scope::SettingsScope;

/// A settings file that exists but could not be read or parsed.
///
/// Load errors never abort construction or reload; they are queued in the
/// manager's [`ErrorSink`](crate::ErrorSink) until drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("failed to load {scope} settings: {message}")]
pub struct LoadError {
    pub scope: SettingsScope,
    pub message: String,
}

impl LoadError {
    pub fn new(scope: SettingsScope, message: impl Into<String>) -> Self {
        Self {
            scope,
            message: message.into(),
        }
    }
}

/// Errors from writing one scope's settings file during a flush.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The scope directory could not be created.
    #[error("failed to create {scope} settings directory {path}: {source}")]
    CreateDir {
        scope: SettingsScope,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file (or its temp sibling) could not be written.
    #[error("failed to write {scope} settings to {path}: {source}")]
    Write {
        scope: SettingsScope,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The merged document could not be serialized.
    #[error("failed to serialize {scope} settings: {source}")]
    Serialize {
        scope: SettingsScope,
        source: serde_json::Error,
    },
}

impl PersistenceError {
    /// Scope whose flush failed.
    pub fn scope(&self) -> SettingsScope {
        match self {
            PersistenceError::CreateDir { scope, .. }
            | PersistenceError::Write { scope, .. }
            | PersistenceError::Serialize { scope, .. } => *scope,
        }
    }
}

/// Every scope that failed during one [`SettingsManager::flush`](crate::SettingsManager::flush).
///
/// Scopes are flushed independently, so a failure here says nothing about the
/// other scope: it either persisted or had nothing pending.
#[derive(Debug, Error)]
#[error("failed to persist settings: {}", describe(.failures))]
pub struct FlushError {
    pub failures: Vec<PersistenceError>,
}

impl FlushError {
    pub fn scopes(&self) -> Vec<SettingsScope> {
        self.failures.iter().map(PersistenceError::scope).collect()
    }
}

fn describe(failures: &[PersistenceError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The agent directory could not be determined.
#[derive(Debug, Error)]
#[error("cannot determine agent directory: set $PI_CODING_AGENT_DIR or a home directory")]
pub struct AgentDirError;
