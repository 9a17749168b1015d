// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: ordered thresholds,
//! positive weights, compilable patterns, unique source ids.

use std::collections::HashSet;

use plugscope_core::SourceKind;

use crate::diagnostic::ConfigError;
use crate::model::PlugscopeConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Returns all collected validation errors (does not fail fast).
pub fn validate_config(config: &PlugscopeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_pipeline(config, &mut errors);
    validate_github(config, &mut errors);
    validate_scoring(config, &mut errors);
    validate_inspection(config, &mut errors);
    validate_sources(config, &mut errors);

    if config.tiers.elevated_from > config.tiers.heavy_above {
        errors.push(ConfigError::validation(format!(
            "tiers.elevated_from ({}) must not exceed tiers.heavy_above ({})",
            config.tiers.elevated_from, config.tiers.heavy_above
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pipeline(config: &PlugscopeConfig, errors: &mut Vec<ConfigError>) {
    let p = &config.pipeline;
    if !LOG_LEVELS.contains(&p.log_level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "pipeline.log_level `{}` must be one of {}",
            p.log_level,
            LOG_LEVELS.join(", ")
        )));
    }
    if p.run_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "pipeline.run_timeout_secs must be at least 1",
        ));
    }
    if p.source_concurrency == 0 {
        errors.push(ConfigError::validation(
            "pipeline.source_concurrency must be at least 1",
        ));
    }
    if p.candidate_concurrency == 0 {
        errors.push(ConfigError::validation(
            "pipeline.candidate_concurrency must be at least 1",
        ));
    }
}

fn validate_github(config: &PlugscopeConfig, errors: &mut Vec<ConfigError>) {
    let gh = &config.github;

    if let Some(token) = &gh.token
        && !is_header_safe(token)
    {
        errors.push(ConfigError::validation(
            "github.token must be non-empty printable ASCII without whitespace",
        ));
    }

    for (key, value) in [("github.api_base", &gh.api_base), ("github.raw_base", &gh.raw_base)] {
        match url::Url::parse(value) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => errors.push(ConfigError::validation(format!(
                "{key} `{value}` is not an http(s) URL"
            ))),
        }
    }

    if gh.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "github.request_timeout_secs must be at least 1",
        ));
    }
    if gh.retry.max_attempts == 0 {
        errors.push(ConfigError::validation(
            "github.retry.max_attempts must be at least 1",
        ));
    }
    if !gh.retry.factor.is_finite() || gh.retry.factor < 1.0 {
        errors.push(ConfigError::validation(format!(
            "github.retry.factor must be at least 1.0, got {}",
            gh.retry.factor
        )));
    }
    if gh.budget.max_in_flight == 0 {
        errors.push(ConfigError::validation(
            "github.budget.max_in_flight must be at least 1",
        ));
    }
    if gh.budget.window_secs == 0 {
        errors.push(ConfigError::validation(
            "github.budget.window_secs must be at least 1",
        ));
    }
    if gh.budget.anonymous_per_window == 0 || gh.budget.authenticated_per_window == 0 {
        errors.push(ConfigError::validation(
            "github.budget request limits must be at least 1",
        ));
    }
}

fn validate_scoring(config: &PlugscopeConfig, errors: &mut Vec<ConfigError>) {
    let w = &config.scoring.weights;
    for (name, value) in [
        ("security", w.security),
        ("maintenance", w.maintenance),
        ("documentation", w.documentation),
        ("testing", w.testing),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::validation(format!(
                "scoring.weights.{name} must be a non-negative number, got {value}"
            )));
        }
    }
    if w.total().is_nan() || w.total() <= 0.0 {
        errors.push(ConfigError::validation(
            "scoring.weights must have a positive sum",
        ));
    }

    let m = &config.scoring.maintenance;
    if !(0 < m.active_days && m.active_days < m.maintained_days && m.maintained_days < m.slow_days)
    {
        errors.push(ConfigError::validation(format!(
            "scoring.maintenance day thresholds must be increasing, got {}/{}/{}",
            m.active_days, m.maintained_days, m.slow_days
        )));
    }
    for (name, score) in [
        ("active_score", m.active_score),
        ("maintained_score", m.maintained_score),
        ("slow_score", m.slow_score),
        ("stale_score", m.stale_score),
    ] {
        if score > 100 {
            errors.push(ConfigError::validation(format!(
                "scoring.maintenance.{name} must be at most 100, got {score}"
            )));
        }
    }

    if config.scoring.security.baseline > 100 {
        errors.push(ConfigError::validation(format!(
            "scoring.security.baseline must be at most 100, got {}",
            config.scoring.security.baseline
        )));
    }
}

fn validate_inspection(config: &PlugscopeConfig, errors: &mut Vec<ConfigError>) {
    for (i, p) in config.inspection.credential_patterns.iter().enumerate() {
        if p.name.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "inspection.credential_patterns[{i}].name must not be empty"
            )));
        }
        if let Err(e) = regex::Regex::new(&p.pattern) {
            errors.push(ConfigError::validation(format!(
                "inspection.credential_patterns[{i}].pattern does not compile: {e}"
            )));
        }
    }
    if config.inspection.max_files == 0 {
        errors.push(ConfigError::validation(
            "inspection.max_files must be at least 1",
        ));
    }
}

fn validate_sources(config: &PlugscopeConfig, errors: &mut Vec<ConfigError>) {
    let mut seen = HashSet::new();
    for (i, source) in config.sources.iter().enumerate() {
        if source.source_id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "sources[{i}].source_id must not be empty"
            )));
        } else if !seen.insert(source.source_id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate source_id `{}` in [[sources]] array",
                source.source_id
            )));
        }

        let location = source.fetch_location.trim();
        if location.is_empty() {
            errors.push(ConfigError::validation(format!(
                "sources[{i}].fetch_location must not be empty"
            )));
            continue;
        }
        if location.starts_with("http://") || location.starts_with("https://") {
            match url::Url::parse(location) {
                Ok(u) => {
                    if source.kind == SourceKind::GithubScan
                        && u.host_str() != Some("github.com")
                    {
                        errors.push(ConfigError::validation(format!(
                            "sources[{i}] is github-scan but `{location}` is not a github.com URL"
                        )));
                    }
                }
                Err(e) => errors.push(ConfigError::validation(format!(
                    "sources[{i}].fetch_location `{location}` is not a valid URL: {e}"
                ))),
            }
        }
    }
}

/// Token usable verbatim in an `Authorization` header.
fn is_header_safe(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_graphic())
}
