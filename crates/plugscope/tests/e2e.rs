// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the `plugscope` binary against local sources.
//!
//! Each test writes its own marketplace tree and configuration into a temp
//! directory. Entries carry no repository URL, so no network access happens.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use plugscope_quality::parse_json_report;
use plugscope_storage::CatalogDocument;

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A local marketplace with two plugins and one malformed entry.
fn marketplace(root: &Path) -> PathBuf {
    write(
        &root.join("market/.claude-plugin/marketplace.json"),
        r#"{
            "name": "local-market",
            "plugins": [
                {"name": "feature-dev", "version": "1.2.0", "source": "./plugins/feature-dev",
                 "description": "Guided feature development with specialised agents"},
                {"name": "commit-commands", "source": "./plugins/commit-commands"},
                "not an object"
            ]
        }"#,
    );
    write(
        &root.join("market/plugins/feature-dev/.claude-plugin/plugin.json"),
        r#"{"name": "feature-dev", "version": "1.2.0"}"#,
    );
    for agent in ["code-explorer", "code-architect", "code-reviewer"] {
        write(
            &root.join(format!("market/plugins/feature-dev/agents/{agent}.md")),
            "# Agent\n\nExplores and explains the codebase before any change is made.\n",
        );
    }
    write(
        &root.join("market/plugins/feature-dev/README.md"),
        "# feature-dev\n\n## Usage\n\nRun `/feature-dev` and follow the phases.\n",
    );
    write(
        &root.join("market/plugins/commit-commands/commands/commit.md"),
        "Create a commit.",
    );
    root.join("market/.claude-plugin/marketplace.json")
}

fn config(root: &Path, sources: &[(&str, &str, &Path)]) -> PathBuf {
    let mut toml = format!(
        "[storage]\ndatabase_path = {:?}\n\n[github]\nretry = {{ max_attempts = 1 }}\n",
        root.join("catalog.db").display().to_string()
    );
    for (id, kind, location) in sources {
        toml.push_str(&format!(
            "\n[[sources]]\nsource_id = {id:?}\nkind = {kind:?}\nfetch_location = {:?}\n",
            location.display().to_string()
        ));
    }
    let path = root.join("plugscope.toml");
    write(&path, &toml);
    path
}

fn plugscope(config: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_plugscope"));
    cmd.arg("--config").arg(config).args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("PLUGSCOPE_") || key == "GITHUB_TOKEN" || key == "RUST_LOG" {
            cmd.env_remove(key);
        }
    }
    cmd.output().unwrap()
}

#[test]
fn scrape_to_json_then_report_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let index = marketplace(dir.path());
    let cfg = config(dir.path(), &[("local", "manifest-index", &index)]);
    let out = dir.path().join("out/catalog.json");

    let scrape = plugscope(&cfg, &["scrape", "--output", out.to_str().unwrap()]);
    assert_eq!(
        scrape.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&scrape.stderr)
    );
    let stderr = String::from_utf8_lossy(&scrape.stderr);
    assert!(stderr.contains("local:2"), "{stderr}");

    let document = CatalogDocument::read(&out).unwrap();
    let slugs: Vec<_> = document.plugins.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, ["commit-commands", "feature-dev"]);
    let feature_dev = &document.plugins[1];
    assert_eq!(feature_dev.inventory.agents, 3);

    let report = plugscope(
        &cfg,
        &[
            "report",
            "feature-dev",
            "--catalog",
            out.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    assert_eq!(report.status.code(), Some(0));
    let parsed = parse_json_report(&String::from_utf8_lossy(&report.stdout)).unwrap();
    assert_eq!(parsed.quality.overall, feature_dev.quality.overall);
    assert_eq!(parsed.quality.security.score, feature_dev.quality.security.score);
}

#[test]
fn scrape_to_store_then_list() {
    let dir = tempfile::tempdir().unwrap();
    let index = marketplace(dir.path());
    let cfg = config(dir.path(), &[("local", "manifest-index", &index)]);

    assert_eq!(plugscope(&cfg, &["scrape"]).status.code(), Some(0));
    let list = plugscope(&cfg, &["list"]);
    assert_eq!(list.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&list.stdout);
    assert!(stdout.contains("feature-dev"));
    assert!(stdout.contains("2 plugins"));

    let missing = plugscope(&cfg, &["report", "does-not-exist"]);
    assert_eq!(missing.status.code(), Some(1));
}

#[test]
fn one_missing_source_is_a_partial_run() {
    let dir = tempfile::tempdir().unwrap();
    let index = marketplace(dir.path());
    let missing = dir.path().join("nowhere/marketplace.json");
    let cfg = config(
        dir.path(),
        &[
            ("local", "manifest-index", &index),
            ("gone", "manifest-index", &missing),
        ],
    );
    let out = dir.path().join("catalog.json");
    let run = plugscope(&cfg, &["scrape", "--output", out.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&run.stderr).contains("source `gone` skipped"));
    assert_eq!(CatalogDocument::read(&out).unwrap().plugins.len(), 2);
}

#[test]
fn every_source_missing_is_a_total_failure() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere/marketplace.json");
    let cfg = config(dir.path(), &[("gone", "manifest-index", &missing)]);
    let out = dir.path().join("catalog.json");
    let run = plugscope(&cfg, &["scrape", "--output", out.to_str().unwrap()]);
    assert_eq!(run.status.code(), Some(4));
}

#[test]
fn invalid_configuration_exits_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("plugscope.toml");
    write(&cfg, "[pipeline]\nrun_timeout = 5\n");
    let run = plugscope(&cfg, &["scrape"]);
    assert_eq!(run.status.code(), Some(2));
    assert!(!dir.path().join("catalog.db").exists());
}

#[test]
fn analyze_scans_a_local_plugin_directory() {
    let dir = tempfile::tempdir().unwrap();
    marketplace(dir.path());
    let cfg = config(dir.path(), &[]);
    let plugin_dir = dir.path().join("market/plugins/feature-dev");
    let run = plugscope(
        &cfg,
        &["analyze", plugin_dir.to_str().unwrap(), "--format", "json"],
    );
    assert_eq!(
        run.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&run.stderr)
    );
    let parsed = parse_json_report(&String::from_utf8_lossy(&run.stdout)).unwrap();
    assert_eq!(parsed.name, "feature-dev");
    assert_eq!(parsed.components.agents, 3);
}
