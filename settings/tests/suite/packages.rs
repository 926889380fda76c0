//! `packages` and legacy `extensions` stay separate lists.

use pi_settings::{PackageSource, PackageSourceFilter, ResourceKind};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{Fixture, read_json};

#[test]
fn mixed_package_entries_are_returned_verbatim() {
    let fx = Fixture::new();
    fx.write_global(&json!({
        "packages": ["npm:a", {"source": "npm:b", "extensions": ["x.ts"], "skills": []}]
    }));

    let packages = fx.manager().packages();

    assert_eq!(
        packages,
        vec![
            PackageSource::from("npm:a"),
            PackageSource::from(
                PackageSourceFilter::new("npm:b")
                    .with_filter(ResourceKind::Extensions, ["x.ts"])
                    .with_filter(ResourceKind::Skills, Vec::<String>::new()),
            ),
        ]
    );
}

#[tokio::test]
async fn unusual_package_entries_survive_an_unrelated_flush() {
    let fx = Fixture::new();
    let packages = json!([
        "npm:a",
        {"source": "npm:b", "skills": "all"},
        {"source": "npm:c", "extensions": null}
    ]);
    fx.write_global(&json!({"packages": packages.clone()}));
    let mut settings = fx.manager();

    assert_eq!(settings.packages().len(), 3);
    let current = settings.packages();
    settings.set_packages(&current);
    settings.set_theme("dark");
    settings.flush().await.expect("flush");

    assert_eq!(
        read_json(&fx.global_path()),
        json!({"packages": packages, "theme": "dark"})
    );
}

#[test]
fn project_packages_mask_global_packages() {
    let fx = Fixture::new();
    fx.write_global(&json!({"packages": ["npm:global"], "extensions": ["./g.ts"]}));
    fx.write_project(&json!({"packages": ["npm:project"]}));

    let settings = fx.manager();

    assert_eq!(settings.packages(), vec![PackageSource::from("npm:project")]);
    assert_eq!(settings.extension_paths(), vec!["./g.ts".to_string()]);
}

#[test]
fn local_extension_paths_are_not_promoted() {
    let fx = Fixture::new();
    fx.write_project(&json!({"extensions": ["./tools/ext.ts", "../shared/ext.ts"]}));

    let settings = fx.manager();

    assert!(settings.packages().is_empty());
    assert_eq!(
        settings.extension_paths(),
        vec!["./tools/ext.ts".to_string(), "../shared/ext.ts".to_string()]
    );
}

#[tokio::test]
async fn set_project_packages_writes_project_file_only() {
    let fx = Fixture::new();
    fx.write_global(&json!({"extensions": ["./legacy.ts"]}));
    let mut settings = fx.manager();

    let entries = vec![
        PackageSource::from("npm:a"),
        PackageSource::from(
            PackageSourceFilter::new("git:github.com/org/tools")
                .with_filter(ResourceKind::Skills, ["review"]),
        ),
    ];
    settings.set_project_packages(&entries);
    settings.flush().await.expect("flush");

    assert_eq!(
        read_json(&fx.project_path()),
        json!({
            "packages": ["npm:a", {"source": "git:github.com/org/tools", "skills": ["review"]}]
        })
    );
    assert_eq!(
        read_json(&fx.global_path()),
        json!({"extensions": ["./legacy.ts"]})
    );
    assert_eq!(settings.packages(), entries);
    assert_eq!(settings.extension_paths(), vec!["./legacy.ts".to_string()]);
}
