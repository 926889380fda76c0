//! Root of the `pi-settings` library.
//!
//! Layered settings for the coding agent: a user-wide file under the agent
//! directory and a per-project file under `<project>/.pi/`. Each file is owned
//! by a [`ScopedStore`]; the [`SettingsManager`] composes the two, applies
//! project-over-global precedence on reads, and reconciles staged edits with
//! whatever is on disk at flush time.

// Library code reports through `tracing`, never straight to stdout/stderr.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod document;
pub mod error;
pub mod error_sink;
pub mod manager;
pub mod packages;
pub mod paths;
pub mod scope;
pub mod store;
pub mod types;
pub mod watcher;

pub use document::SettingsDocument;
pub use error::AgentDirError;
pub use error::FlushError;
pub use error::LoadError;
pub use error::PersistenceError;
pub use error_sink::ErrorSink;
pub use manager::SettingsManager;
pub use packages::PackageSource;
pub use packages::PackageSourceFilter;
pub use packages::ResourceKind;
pub use scope::SettingsScope;
pub use store::ScopedStore;
pub use types::CompactionSettings;
pub use types::QueueMode;
pub use types::RetrySettings;
pub use types::ThinkingLevel;
pub use watcher::SettingsWatcher;
