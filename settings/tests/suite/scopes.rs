//! Project settings mask global ones key by key.

use pi_settings::{SettingsScope, ThinkingLevel};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::Fixture;

#[test]
fn global_only_key_is_visible() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark"}));

    assert_eq!(fx.manager().theme().as_deref(), Some("dark"));
}

#[test]
fn project_only_key_is_visible() {
    let fx = Fixture::new();
    fx.write_project(&json!({"shellCommandPrefix": "source .envrc"}));

    assert_eq!(
        fx.manager().shell_command_prefix().as_deref(),
        Some("source .envrc")
    );
}

#[test]
fn project_masks_global_per_key() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark", "defaultModel": "claude-sonnet"}));
    fx.write_project(&json!({"theme": "light"}));

    let settings = fx.manager();

    assert_eq!(settings.theme().as_deref(), Some("light"));
    assert_eq!(settings.default_model().as_deref(), Some("claude-sonnet"));
}

#[test]
fn project_pending_value_masks_global() {
    let fx = Fixture::new();
    fx.write_global(&json!({"defaultThinkingLevel": "low"}));
    let mut settings = fx.manager();

    settings.set(SettingsScope::Project, "defaultThinkingLevel", json!("medium"));

    assert_eq!(settings.default_thinking_level(), Some(ThinkingLevel::Medium));
}

#[test]
fn global_setter_does_not_unmask_project_value() {
    let fx = Fixture::new();
    fx.write_project(&json!({"theme": "light"}));
    let mut settings = fx.manager();

    settings.set_theme("dark");

    assert_eq!(settings.theme().as_deref(), Some("light"));
    assert_eq!(
        settings.store(SettingsScope::Global).effective_value("theme"),
        Some(&json!("dark"))
    );
}

#[test]
fn construction_and_reads_create_nothing() {
    let fx = Fixture::new();
    let agent_dir = fx.agent_dir.path().join("nested").join("agent");
    let mut settings = pi_settings::SettingsManager::create(fx.project_root.path(), &agent_dir);

    let _ = settings.theme();
    let _ = settings.packages();
    let _ = settings.effective_document();
    settings.reload();

    assert!(!fx.project_dir().exists());
    assert!(!agent_dir.exists());
    assert!(settings.drain_errors().is_empty());
}

#[test]
fn effective_document_masks_per_top_level_key() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark", "retry": {"maxRetries": 5}}));
    fx.write_project(&json!({"retry": {"enabled": false}, "custom": 1}));

    let settings = fx.manager();

    assert_eq!(
        serde_json::Value::Object(settings.effective_document()),
        json!({
            "theme": "dark",
            "retry": {"enabled": false},
            "custom": 1
        })
    );
    let retry = settings.retry_settings();
    assert!(!retry.enabled);
    assert_eq!(retry.max_retries, 3);
}
