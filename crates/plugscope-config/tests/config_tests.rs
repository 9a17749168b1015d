// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the plugscope configuration system.

use plugscope_config::diagnostic::ConfigError;
use plugscope_config::model::{CategoryPolicy, PlugscopeConfig};
use plugscope_config::{load_and_validate_str, load_config_from_str};
use plugscope_core::SourceKind;

/// Valid TOML with every section deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[pipeline]
log_level = "debug"
run_timeout_secs = 120
source_concurrency = 2
candidate_concurrency = 8

[github]
token = "ghp_abc123"
api_base = "http://127.0.0.1:9000"

[github.retry]
max_attempts = 4
base_delay_ms = 10
factor = 3.0

[github.budget]
max_in_flight = 2

[tiers]
elevated_from = 2
heavy_above = 6

[scoring.weights]
security = 0.4
maintenance = 0.2
documentation = 0.2
testing = 0.2

[scoring.maintenance]
active_days = 7

[dedup]
category_policy = "winner-first"

[storage]
database_path = "/tmp/catalog.db"
wal_mode = false

[[sources]]
source_id = "local"
kind = "github-scan"
fetch_location = "./plugins"
is_canonical = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.pipeline.log_level, "debug");
    assert_eq!(config.pipeline.run_timeout_secs, 120);
    assert_eq!(config.pipeline.candidate_concurrency, 8);
    assert_eq!(config.github.token.as_deref(), Some("ghp_abc123"));
    assert_eq!(config.github.retry.max_attempts, 4);
    assert_eq!(config.github.retry.factor, 3.0);
    assert_eq!(config.github.budget.max_in_flight, 2);
    assert_eq!(config.tiers.elevated_from, 2);
    assert_eq!(config.tiers.heavy_above, 6);
    assert_eq!(config.scoring.weights.security, 0.4);
    assert_eq!(config.scoring.maintenance.active_days, 7);
    assert_eq!(config.scoring.maintenance.maintained_days, 90);
    assert_eq!(config.dedup.category_policy, CategoryPolicy::WinnerFirst);
    assert_eq!(config.storage.database_path, "/tmp/catalog.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.sources.len(), 1);
    assert_eq!(config.sources[0].kind, SourceKind::GithubScan);
    assert!(config.sources[0].is_canonical);
}

/// An empty file yields the documented defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.pipeline.log_level, "info");
    assert_eq!(config.pipeline.run_timeout_secs, 600);
    assert!(config.github.token.is_none());
    assert_eq!(config.github.api_base, "https://api.github.com");
    assert_eq!(config.github.retry.max_attempts, 3);
    assert_eq!(config.github.retry.base_delay_ms, 2_000);
    assert_eq!(config.github.retry.factor, 2.0);
    assert_eq!(config.tiers.elevated_from, 3);
    assert_eq!(config.tiers.heavy_above, 5);
    assert_eq!(config.scoring.weights.security, 0.3);
    assert_eq!(config.scoring.weights.maintenance, 0.3);
    assert_eq!(config.scoring.weights.documentation, 0.2);
    assert_eq!(config.scoring.weights.testing, 0.2);
    assert_eq!(config.dedup.category_policy, CategoryPolicy::CanonicalFirst);
    assert_eq!(config.storage.database_path, "plugscope.db");
    assert_eq!(config.inspection.credential_patterns.len(), 5);

    assert_eq!(config.sources.len(), 2);
    assert!(config.sources[0].is_canonical);
    assert!(!config.sources[1].is_canonical);
    assert!(config.sources[0].priority > config.sources[1].priority);
}

#[test]
fn unknown_field_in_tiers_produces_error() {
    let toml = r#"
[tiers]
heavy_abve = 4
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("heavy_abve"),
        "error should mention unknown field, got: {err_str}"
    );
}

#[test]
fn deny_unknown_fields_at_top_level() {
    let err = load_config_from_str("[telemetry]\nenabled = true\n")
        .expect_err("unknown section should be rejected");
    assert!(format!("{err}").contains("telemetry"));
}

/// Unknown keys in nested tables become UnknownKey diagnostics with a suggestion.
#[test]
fn diagnostic_error_includes_nested_suggestion() {
    let toml = r#"
[github.retry]
max_atempts = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
            assert!(valid_keys.contains("base_delay_ms"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// An unknown source kind is a configuration error naming the valid kinds.
#[test]
fn unknown_source_kind_is_rejected() {
    let toml = r#"
[[sources]]
source_id = "feed"
kind = "github-scna"
fetch_location = "https://github.com/a/b"
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown kind should fail");
    let has_variant_error = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownVariant { value, suggestion, valid_values, .. } if {
            value == "github-scna"
                && suggestion.as_deref() == Some("github-scan")
                && valid_values.contains("manifest-index")
        })
    });
    assert!(has_variant_error, "got: {errors:?}");
}

#[test]
fn diagnostic_invalid_type_message() {
    let toml = r#"
[pipeline]
run_timeout_secs = "soon"
"#;

    let errors = load_and_validate_str(toml).expect_err("wrong type should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. })),
        "got: {errors:?}"
    );
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "heavy_abve".to_string(),
        suggestion: Some("heavy_above".to_string()),
        valid_keys: "elevated_from, heavy_above".to_string(),
        span: None,
        src: None,
    };
    assert!(error.code().is_some());
    let help = error.help().map(|h| h.to_string()).unwrap_or_default();
    assert!(help.contains("did you mean `heavy_above`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("heavy_abve"));
}

/// Validation reports semantic errors after a successful parse.
#[test]
fn validation_catches_misordered_tiers() {
    let toml = r#"
[tiers]
elevated_from = 6
heavy_above = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("misordered tiers should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("tiers.elevated_from"))
    }));
}

#[test]
fn defaults_survive_a_toml_round_trip() {
    let rendered = toml::to_string(&PlugscopeConfig::default()).expect("serialize defaults");
    let config = load_and_validate_str(&rendered).expect("rendered defaults should validate");
    assert_eq!(config.sources, PlugscopeConfig::default().sources);
    assert_eq!(config.scoring.weights, PlugscopeConfig::default().scoring.weights);
}
