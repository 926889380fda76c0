//! Flush reconciles staged edits with whatever is on disk at flush time.

use std::fs;

use pi_settings::{SettingsScope, ThinkingLevel};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{Fixture, read_json, write_json};

#[tokio::test]
async fn external_additions_survive_in_memory_change() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark", "defaultModel": "claude-sonnet"}));
    let mut settings = fx.manager();

    // Another process adds a key after the manager loaded the file.
    write_json(
        &fx.global_path(),
        &json!({
            "theme": "dark",
            "defaultModel": "claude-sonnet",
            "enabledModels": ["claude-sonnet", "gpt-5"]
        }),
    );
    settings.set_default_thinking_level(ThinkingLevel::High);
    settings.flush().await.expect("flush");

    assert_eq!(
        read_json(&fx.global_path()),
        json!({
            "theme": "dark",
            "defaultModel": "claude-sonnet",
            "enabledModels": ["claude-sonnet", "gpt-5"],
            "defaultThinkingLevel": "high"
        })
    );
}

#[tokio::test]
async fn in_memory_value_wins_over_concurrent_external_edit() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark"}));
    let mut settings = fx.manager();

    write_json(
        &fx.global_path(),
        &json!({"theme": "dark", "defaultThinkingLevel": "low"}),
    );
    settings.set_default_thinking_level(ThinkingLevel::High);
    settings.flush().await.expect("flush");

    assert_eq!(
        read_json(&fx.global_path())["defaultThinkingLevel"],
        json!("high")
    );
    assert_eq!(settings.default_thinking_level(), Some(ThinkingLevel::High));
}

#[tokio::test]
async fn unknown_keys_round_trip_unchanged() {
    let fx = Fixture::new();
    let original = json!({
        "theme": "dark",
        "x-other-tool": {"nested": [1, 2, {"deep": true}]},
        "futureSetting": null
    });
    fx.write_global(&original);
    let mut settings = fx.manager();

    settings.set_quiet_startup(true);
    settings.flush().await.expect("flush");

    let mut expected = original;
    expected["quietStartup"] = json!(true);
    assert_eq!(read_json(&fx.global_path()), expected);
}

#[tokio::test]
async fn second_flush_without_changes_leaves_file_untouched() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark"}));
    let mut settings = fx.manager();

    settings.set_theme("light");
    settings.flush().await.expect("first flush");
    let after_first = fs::read_to_string(fx.global_path()).expect("read");

    settings.flush().await.expect("second flush");
    let after_second = fs::read_to_string(fx.global_path()).expect("read");

    assert_eq!(after_first, after_second);
    assert!(!settings.has_pending());
}

#[tokio::test]
async fn reload_keeps_unflushed_edits() {
    let fx = Fixture::new();
    fx.write_global(&json!({"theme": "dark", "defaultModel": "a"}));
    let mut settings = fx.manager();

    settings.set_theme("light");
    write_json(
        &fx.global_path(),
        &json!({"theme": "solarized", "defaultModel": "b"}),
    );
    settings.reload();

    assert_eq!(settings.theme().as_deref(), Some("light"));
    assert_eq!(settings.default_model().as_deref(), Some("b"));

    settings.flush().await.expect("flush");
    assert_eq!(
        read_json(&fx.global_path()),
        json!({"theme": "light", "defaultModel": "b"})
    );
}

#[tokio::test]
async fn idle_scope_is_never_written() {
    let fx = Fixture::new();
    let mut settings = fx.manager();

    settings.set_theme("dark");
    settings.flush().await.expect("flush");

    assert!(fx.global_path().exists());
    assert!(!fx.project_dir().exists());
}

#[tokio::test]
async fn project_flush_creates_pi_directory_lazily() {
    let fx = Fixture::new();
    let mut settings = fx.manager();
    assert!(!fx.project_dir().exists());

    settings.set(SettingsScope::Project, "theme", json!("dark"));
    assert!(!fx.project_dir().exists());

    settings.flush().await.expect("flush");

    assert_eq!(read_json(&fx.project_path()), json!({"theme": "dark"}));
    assert!(!fx.global_path().exists());
}

#[tokio::test]
async fn failed_scope_does_not_block_the_other() {
    let fx = Fixture::new();
    // `.pi` as a plain file makes the project directory impossible to create.
    fs::write(fx.project_dir(), "not a directory").expect("write blocker");
    let mut settings = fx.manager();
    let _ = settings.drain_errors();

    settings.set_theme("dark");
    settings.set(SettingsScope::Project, "shellPath", json!("/bin/zsh"));
    let err = settings.flush().await.expect_err("project flush must fail");

    assert_eq!(err.scopes(), vec![SettingsScope::Project]);
    assert_eq!(read_json(&fx.global_path()), json!({"theme": "dark"}));
    assert!(!settings.store(SettingsScope::Global).has_pending());
    assert!(settings.store(SettingsScope::Project).has_pending());

    // Retry after the obstacle is gone persists the same staged change.
    fs::remove_file(fx.project_dir()).expect("remove blocker");
    settings.flush().await.expect("retry flush");
    assert_eq!(
        read_json(&fx.project_path()),
        json!({"shellPath": "/bin/zsh"})
    );
}

#[tokio::test]
async fn removed_setting_is_deleted_on_disk() {
    let fx = Fixture::new();
    fx.write_global(&json!({"shellPath": "/bin/zsh", "shellCommandPrefix": "set -e"}));
    let mut settings = fx.manager();

    settings.set_shell_path(None);
    settings.flush().await.expect("flush");

    assert_eq!(settings.shell_path(), None);
    assert_eq!(
        read_json(&fx.global_path()),
        json!({"shellCommandPrefix": "set -e"})
    );
}

#[tokio::test]
async fn legacy_key_is_migrated_on_write() {
    let fx = Fixture::new();
    fx.write_global(&json!({"queueMode": "all", "theme": "dark"}));
    let mut settings = fx.manager();

    settings.set_hide_thinking_block(true);
    settings.flush().await.expect("flush");

    assert_eq!(
        read_json(&fx.global_path()),
        json!({"theme": "dark", "steeringMode": "all", "hideThinkingBlock": true})
    );
}
