//! `pi-settings`: inspect and edit layered agent settings from the shell.
//!
//! ## Commands
//!
//! - `pi-settings show [--scope global|project|effective]`
//! - `pi-settings get <KEY>`
//! - `pi-settings set <KEY> <VALUE> [--project]`
//! - `pi-settings unset <KEY> [--project]`
//! - `pi-settings paths`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pi_settings::{SettingsManager, SettingsScope};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pi-settings", version, about = "Inspect and edit agent settings")]
struct Cli {
    /// Project root whose `.pi/settings.json` is the project scope
    #[arg(long, value_name = "DIR", global = true)]
    cwd: Option<PathBuf>,

    /// Agent directory holding the global `settings.json`
    /// (default: $PI_CODING_AGENT_DIR or ~/.pi/agent)
    #[arg(long, value_name = "DIR", global = true)]
    agent_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a settings document as JSON
    Show {
        #[arg(long, value_enum, default_value_t = ShowScope::Effective)]
        scope: ShowScope,
    },
    /// Print the effective value of one key
    Get { key: String },
    /// Set a key; VALUE is parsed as JSON, falling back to a plain string
    Set {
        key: String,
        value: String,
        /// Write to the project scope instead of global
        #[arg(long)]
        project: bool,
    },
    /// Remove a key
    Unset {
        key: String,
        /// Remove from the project scope instead of global
        #[arg(long)]
        project: bool,
    },
    /// Print the settings file locations
    Paths,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShowScope {
    Global,
    Project,
    Effective,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let project_root = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    let mut settings = match cli.agent_dir {
        Some(agent_dir) => SettingsManager::create(&project_root, &agent_dir),
        None => SettingsManager::for_project(&project_root)?,
    };
    for err in settings.drain_errors() {
        eprintln!("warning: {err}");
    }

    tracing::debug!(
        global = %settings.settings_path(SettingsScope::Global).display(),
        project = %settings.settings_path(SettingsScope::Project).display(),
        "settings loaded"
    );

    match cli.command {
        Command::Show { scope } => {
            let doc = match scope {
                ShowScope::Global => settings.store(SettingsScope::Global).effective_document(),
                ShowScope::Project => settings.store(SettingsScope::Project).effective_document(),
                ShowScope::Effective => settings.effective_document(),
            };
            println!("{}", serde_json::to_string_pretty(&Value::Object(doc))?);
        }
        Command::Get { key } => match settings.value(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => anyhow::bail!("`{key}` is not set"),
        },
        Command::Set {
            key,
            value,
            project,
        } => {
            settings.set(target_scope(project), &key, parse_value(&value));
            settings.flush().await.context("failed to save settings")?;
        }
        Command::Unset { key, project } => {
            settings.unset(target_scope(project), &key);
            settings.flush().await.context("failed to save settings")?;
        }
        Command::Paths => {
            for scope in [SettingsScope::Global, SettingsScope::Project] {
                println!("{scope}\t{}", settings.settings_path(scope).display());
            }
        }
    }

    Ok(())
}

fn init_logging() {
    let default_level = "warn";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn target_scope(project: bool) -> SettingsScope {
    if project {
        SettingsScope::Project
    } else {
        SettingsScope::Global
    }
}

/// `true`, `42`, `["a"]` and `{"k": 1}` are taken as JSON; anything that does
/// not parse is stored as a string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
