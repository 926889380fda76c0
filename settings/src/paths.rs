//! Where settings files live.
//!
//! Agent directory resolution order:
//! 1. `$PI_CODING_AGENT_DIR` (if set and non-empty)
//! 2. `~/.pi/agent`

use std::env;
use std::path::{Path, PathBuf};

use crate::error::AgentDirError;

/// Directory name used for both the per-user and the per-project config.
pub const CONFIG_DIR_NAME: &str = ".pi";

pub const SETTINGS_FILENAME: &str = "settings.json";

/// Environment variable overriding the agent directory.
pub const AGENT_DIR_ENV: &str = "PI_CODING_AGENT_DIR";

pub fn resolve_agent_dir() -> Result<PathBuf, AgentDirError> {
    if let Ok(path) = env::var(AGENT_DIR_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME).join("agent"))
        .ok_or(AgentDirError)
}

/// `<agent_dir>/settings.json`
pub fn global_settings_path(agent_dir: &Path) -> PathBuf {
    agent_dir.join(SETTINGS_FILENAME)
}

/// `<project_root>/.pi/settings.json`
pub fn project_settings_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join(SETTINGS_FILENAME)
}
