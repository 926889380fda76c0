//! Global + project settings behind one typed surface.
//!
//! Reads apply project-over-global precedence per key. Writes are staged in
//! memory on a specific scope and only reach disk on [`SettingsManager::flush`].
//!
//! ## Example
//!
//! ```no_run
//! use pi_settings::{SettingsManager, ThinkingLevel};
//! use std::path::Path;
//!
//! # async fn demo() -> Result<(), pi_settings::FlushError> {
//! let mut settings = SettingsManager::create(Path::new("."), Path::new("/home/me/.pi/agent"));
//! settings.set_default_thinking_level(ThinkingLevel::High);
//! settings.flush().await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::document::SettingsDocument;
use crate::error::{AgentDirError, FlushError, LoadError};
use crate::error_sink::ErrorSink;
use crate::packages::{self, EXTENSIONS_KEY, PACKAGES_KEY, PackageSource};
use crate::paths;
use crate::scope::SettingsScope;
use crate::store::ScopedStore;
use crate::types::{CompactionSettings, QueueMode, RetrySettings, ThinkingLevel};

const THEME: &str = "theme";
const DEFAULT_PROVIDER: &str = "defaultProvider";
const DEFAULT_MODEL: &str = "defaultModel";
const DEFAULT_THINKING_LEVEL: &str = "defaultThinkingLevel";
const STEERING_MODE: &str = "steeringMode";
const FOLLOW_UP_MODE: &str = "followUpMode";
const COMPACTION: &str = "compaction";
const RETRY: &str = "retry";
const HIDE_THINKING_BLOCK: &str = "hideThinkingBlock";
const SHELL_PATH: &str = "shellPath";
const SHELL_COMMAND_PREFIX: &str = "shellCommandPrefix";
const QUIET_STARTUP: &str = "quietStartup";
const COLLAPSE_CHANGELOG: &str = "collapseChangelog";
const LAST_CHANGELOG_VERSION: &str = "lastChangelogVersion";
const ENABLED_MODELS: &str = "enabledModels";
const SKILLS: &str = "skills";
const PROMPTS: &str = "prompts";
const THEMES: &str = "themes";
const ENABLE_SKILL_COMMANDS: &str = "enableSkillCommands";
const IMAGES: &str = "images";
const TERMINAL: &str = "terminal";

#[derive(Debug)]
pub struct SettingsManager {
    global: ScopedStore,
    project: ScopedStore,
    errors: ErrorSink,
}

impl SettingsManager {
    /// Load `<agent_dir>/settings.json` and `<project_root>/.pi/settings.json`.
    ///
    /// Read-only: neither file nor directory is created. Load failures are
    /// queued for [`drain_errors`](Self::drain_errors) instead of returned.
    pub fn create(project_root: &Path, agent_dir: &Path) -> Self {
        let errors = ErrorSink::new();
        let global = ScopedStore::open(
            SettingsScope::Global,
            paths::global_settings_path(agent_dir),
            errors.clone(),
        );
        let project = ScopedStore::open(
            SettingsScope::Project,
            paths::project_settings_path(project_root),
            errors.clone(),
        );
        Self {
            global,
            project,
            errors,
        }
    }

    /// [`create`](Self::create) with the agent directory resolved from the
    /// environment.
    pub fn for_project(project_root: &Path) -> Result<Self, AgentDirError> {
        let agent_dir = paths::resolve_agent_dir()?;
        Ok(Self::create(project_root, &agent_dir))
    }

    pub fn store(&self, scope: SettingsScope) -> &ScopedStore {
        match scope {
            SettingsScope::Global => &self.global,
            SettingsScope::Project => &self.project,
        }
    }

    fn store_mut(&mut self, scope: SettingsScope) -> &mut ScopedStore {
        match scope {
            SettingsScope::Global => &mut self.global,
            SettingsScope::Project => &mut self.project,
        }
    }

    pub fn settings_path(&self, scope: SettingsScope) -> &Path {
        self.store(scope).path()
    }

    /// Paths worth watching for external edits, with their scopes.
    pub fn watch_targets(&self) -> Vec<(SettingsScope, PathBuf)> {
        [&self.global, &self.project]
            .into_iter()
            .map(|store| (store.scope(), store.path().to_path_buf()))
            .collect()
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    /// Re-read both files. Staged edits on either scope are kept.
    pub fn reload(&mut self) {
        self.global.reload();
        self.project.reload();
    }

    /// Reload only the given scope, e.g. after a watcher reported it changed.
    pub fn reload_scope(&mut self, scope: SettingsScope) {
        self.store_mut(scope).reload();
    }

    /// Persist every scope with staged edits.
    ///
    /// Scopes without staged edits are not touched at all. Each scope is
    /// attempted even if the other fails; all failures are returned together
    /// and the failed scopes keep their staged edits for a retry.
    pub async fn flush(&mut self) -> Result<(), FlushError> {
        let mut failures = Vec::new();
        for store in [&mut self.global, &mut self.project] {
            if !store.has_pending() {
                tracing::debug!(scope = %store.scope(), "nothing staged, skipping flush");
                continue;
            }
            if let Err(err) = store.reconcile_and_persist().await {
                tracing::warn!("{err}");
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }

    /// Take every load error recorded since the last drain.
    pub fn drain_errors(&self) -> Vec<LoadError> {
        self.errors.drain()
    }

    pub fn has_pending(&self) -> bool {
        self.global.has_pending() || self.project.has_pending()
    }

    // ── Untyped access ───────────────────────────────────────────────────

    /// Effective value of `key`: the project's if it has one, else global's.
    ///
    /// Masking is per top-level key. A project object replaces the global
    /// object for that key wholesale; fields are never mixed across scopes.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.project
            .effective_value(key)
            .or_else(|| self.global.effective_value(key))
            .cloned()
    }

    /// Both scopes combined into the document callers actually see.
    pub fn effective_document(&self) -> SettingsDocument {
        let mut combined = self.global.effective_document();
        combined.extend(self.project.effective_document());
        combined
    }

    /// Stage `value` under `key` in `scope`.
    pub fn set(&mut self, scope: SettingsScope, key: &str, value: Value) {
        self.store_mut(scope).set(key, value);
    }

    /// Stage removal of `key` from `scope`.
    pub fn unset(&mut self, scope: SettingsScope, key: &str) {
        self.store_mut(scope).unset(key);
    }

    fn typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.value(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!("ignoring invalid `{key}` setting: {e}");
                None
            }
        }
    }

    fn set_global(&mut self, key: &str, value: impl Into<Value>) {
        self.global.set(key, value.into());
    }

    fn set_global_optional(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(value) => self.global.set(key, Value::String(value)),
            None => self.global.unset(key),
        }
    }

    /// Update one field of a global object-valued setting, keeping the
    /// object's other fields.
    fn set_global_field(&mut self, key: &str, field: &str, value: impl Into<Value>) {
        let mut obj = match self.global.effective_value(key) {
            Some(Value::Object(obj)) => obj.clone(),
            _ => Map::new(),
        };
        obj.insert(field.to_string(), value.into());
        self.global.set(key, Value::Object(obj));
    }

    fn nested_bool(&self, key: &str, field: &str) -> Option<bool> {
        self.value(key)?.get(field)?.as_bool()
    }

    fn string_list(&self, key: &str) -> Vec<String> {
        packages::string_list(&self.effective_document(), key)
    }

    // ── Model & appearance ───────────────────────────────────────────────

    pub fn theme(&self) -> Option<String> {
        self.typed(THEME)
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.set_global(THEME, Value::String(theme.into()));
    }

    pub fn default_provider(&self) -> Option<String> {
        self.typed(DEFAULT_PROVIDER)
    }

    pub fn set_default_provider(&mut self, provider: impl Into<String>) {
        self.set_global(DEFAULT_PROVIDER, Value::String(provider.into()));
    }

    pub fn default_model(&self) -> Option<String> {
        self.typed(DEFAULT_MODEL)
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.set_global(DEFAULT_MODEL, Value::String(model.into()));
    }

    pub fn set_default_model_and_provider(
        &mut self,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) {
        self.set_default_provider(provider);
        self.set_default_model(model);
    }

    /// `None` when unset or not one of the known levels.
    pub fn default_thinking_level(&self) -> Option<ThinkingLevel> {
        self.typed(DEFAULT_THINKING_LEVEL)
    }

    pub fn set_default_thinking_level(&mut self, level: ThinkingLevel) {
        self.set_global(DEFAULT_THINKING_LEVEL, level.to_string());
    }

    pub fn enabled_models(&self) -> Option<Vec<String>> {
        self.typed(ENABLED_MODELS)
    }

    pub fn set_enabled_models(&mut self, models: Option<Vec<String>>) {
        match models {
            Some(models) => self.set_global(ENABLED_MODELS, models),
            None => self.global.unset(ENABLED_MODELS),
        }
    }

    pub fn hide_thinking_block(&self) -> bool {
        self.typed(HIDE_THINKING_BLOCK).unwrap_or(false)
    }

    pub fn set_hide_thinking_block(&mut self, hide: bool) {
        self.set_global(HIDE_THINKING_BLOCK, hide);
    }

    // ── Message queueing ─────────────────────────────────────────────────

    pub fn steering_mode(&self) -> QueueMode {
        self.typed(STEERING_MODE).unwrap_or_default()
    }

    pub fn set_steering_mode(&mut self, mode: QueueMode) {
        self.set_global(STEERING_MODE, mode.to_string());
    }

    pub fn follow_up_mode(&self) -> QueueMode {
        self.typed(FOLLOW_UP_MODE).unwrap_or_default()
    }

    pub fn set_follow_up_mode(&mut self, mode: QueueMode) {
        self.set_global(FOLLOW_UP_MODE, mode.to_string());
    }

    // ── Compaction & retry ───────────────────────────────────────────────

    pub fn compaction_settings(&self) -> CompactionSettings {
        self.typed(COMPACTION).unwrap_or_default()
    }

    pub fn set_compaction_enabled(&mut self, enabled: bool) {
        self.set_global_field(COMPACTION, "enabled", enabled);
    }

    pub fn retry_settings(&self) -> RetrySettings {
        self.typed(RETRY).unwrap_or_default()
    }

    pub fn set_retry_enabled(&mut self, enabled: bool) {
        self.set_global_field(RETRY, "enabled", enabled);
    }

    // ── Shell ────────────────────────────────────────────────────────────

    pub fn shell_path(&self) -> Option<String> {
        self.typed(SHELL_PATH)
    }

    /// `None` removes the setting.
    pub fn set_shell_path(&mut self, path: Option<String>) {
        self.set_global_optional(SHELL_PATH, path);
    }

    pub fn shell_command_prefix(&self) -> Option<String> {
        self.typed(SHELL_COMMAND_PREFIX)
    }

    /// `None` removes the setting.
    pub fn set_shell_command_prefix(&mut self, prefix: Option<String>) {
        self.set_global_optional(SHELL_COMMAND_PREFIX, prefix);
    }

    // ── Startup & changelog ──────────────────────────────────────────────

    pub fn quiet_startup(&self) -> bool {
        self.typed(QUIET_STARTUP).unwrap_or(false)
    }

    pub fn set_quiet_startup(&mut self, quiet: bool) {
        self.set_global(QUIET_STARTUP, quiet);
    }

    pub fn collapse_changelog(&self) -> bool {
        self.typed(COLLAPSE_CHANGELOG).unwrap_or(false)
    }

    pub fn set_collapse_changelog(&mut self, collapse: bool) {
        self.set_global(COLLAPSE_CHANGELOG, collapse);
    }

    pub fn last_changelog_version(&self) -> Option<String> {
        self.typed(LAST_CHANGELOG_VERSION)
    }

    pub fn set_last_changelog_version(&mut self, version: impl Into<String>) {
        self.set_global(LAST_CHANGELOG_VERSION, Value::String(version.into()));
    }

    // ── Packages & resources ─────────────────────────────────────────────

    /// Effective `packages` list, entries unchanged.
    pub fn packages(&self) -> Vec<PackageSource> {
        packages::get_packages(&self.effective_document())
    }

    pub fn set_packages(&mut self, list: &[PackageSource]) {
        self.global.set(PACKAGES_KEY, packages::packages_to_value(list));
    }

    pub fn set_project_packages(&mut self, list: &[PackageSource]) {
        self.project
            .set(PACKAGES_KEY, packages::packages_to_value(list));
    }

    /// Effective legacy `extensions` list of local paths.
    pub fn extension_paths(&self) -> Vec<String> {
        packages::get_extension_paths(&self.effective_document())
    }

    pub fn set_extension_paths(&mut self, paths: Vec<String>) {
        self.set_global(EXTENSIONS_KEY, paths);
    }

    pub fn set_project_extension_paths(&mut self, paths: Vec<String>) {
        self.project.set(EXTENSIONS_KEY, Value::from(paths));
    }

    pub fn skill_paths(&self) -> Vec<String> {
        self.string_list(SKILLS)
    }

    pub fn set_skill_paths(&mut self, paths: Vec<String>) {
        self.set_global(SKILLS, paths);
    }

    pub fn set_project_skill_paths(&mut self, paths: Vec<String>) {
        self.project.set(SKILLS, Value::from(paths));
    }

    pub fn prompt_template_paths(&self) -> Vec<String> {
        self.string_list(PROMPTS)
    }

    pub fn set_prompt_template_paths(&mut self, paths: Vec<String>) {
        self.set_global(PROMPTS, paths);
    }

    pub fn theme_paths(&self) -> Vec<String> {
        self.string_list(THEMES)
    }

    pub fn set_theme_paths(&mut self, paths: Vec<String>) {
        self.set_global(THEMES, paths);
    }

    pub fn enable_skill_commands(&self) -> bool {
        self.typed(ENABLE_SKILL_COMMANDS).unwrap_or(true)
    }

    pub fn set_enable_skill_commands(&mut self, enabled: bool) {
        self.set_global(ENABLE_SKILL_COMMANDS, enabled);
    }

    // ── Images & terminal ────────────────────────────────────────────────

    pub fn image_auto_resize(&self) -> bool {
        self.nested_bool(IMAGES, "autoResize").unwrap_or(true)
    }

    pub fn set_image_auto_resize(&mut self, enabled: bool) {
        self.set_global_field(IMAGES, "autoResize", enabled);
    }

    pub fn block_images(&self) -> bool {
        self.nested_bool(IMAGES, "blockImages").unwrap_or(false)
    }

    pub fn set_block_images(&mut self, blocked: bool) {
        self.set_global_field(IMAGES, "blockImages", blocked);
    }

    pub fn show_images(&self) -> bool {
        self.nested_bool(TERMINAL, "showImages").unwrap_or(true)
    }

    pub fn set_show_images(&mut self, show: bool) {
        self.set_global_field(TERMINAL, "showImages", show);
    }
}
