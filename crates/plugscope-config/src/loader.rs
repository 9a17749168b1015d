// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./plugscope.toml` > `~/.config/plugscope/plugscope.toml`
//! > `/etc/plugscope/plugscope.toml`, with environment variable overrides via
//! the `PLUGSCOPE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlugscopeConfig;

/// Environment variable read when no token is configured.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

pub(crate) const SYSTEM_CONFIG: &str = "/etc/plugscope/plugscope.toml";
pub(crate) const LOCAL_CONFIG: &str = "plugscope.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plugscope/plugscope.toml` (system-wide)
/// 3. `~/.config/plugscope/plugscope.toml` (user XDG config)
/// 4. `./plugscope.toml` (local directory)
/// 5. `PLUGSCOPE_*` environment variables
pub fn load_config() -> Result<PlugscopeConfig, figment::Error> {
    build_figment().extract().map(apply_env_fallbacks)
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing.
pub fn load_config_from_str(toml_content: &str) -> Result<PlugscopeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugscopeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
///
/// The path replaces the XDG file layers.
pub fn load_config_from_path(path: &Path) -> Result<PlugscopeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlugscopeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map(apply_env_fallbacks)
}

/// Build the Figment used for XDG config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PlugscopeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// `~/.config/plugscope/plugscope.toml`, when a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("plugscope").join("plugscope.toml"))
}

/// Fill settings that have a conventional environment variable outside the
/// `PLUGSCOPE_` namespace.
fn apply_env_fallbacks(mut config: PlugscopeConfig) -> PlugscopeConfig {
    if config.github.token.is_none() {
        config.github.token = std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty());
    }
    config
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLUGSCOPE_PIPELINE_RUN_TIMEOUT_SECS` must map to
/// `pipeline.run_timeout_secs`, not `pipeline.run.timeout.secs`.
fn env_provider() -> Env {
    Env::prefixed("PLUGSCOPE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("github_retry_", "github.retry.", 1)
            .replacen("github_budget_", "github.budget.", 1)
            .replacen("github_", "github.", 1)
            .replacen("tiers_", "tiers.", 1)
            .replacen("dedup_", "dedup.", 1)
            .replacen("inspection_", "inspection.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLUGSCOPE_PIPELINE_RUN_TIMEOUT_SECS", "42");
            jail.set_env("PLUGSCOPE_GITHUB_RETRY_MAX_ATTEMPTS", "5");
            jail.set_env("PLUGSCOPE_GITHUB_USER_AGENT", "tester/1.0");
            jail.set_env("PLUGSCOPE_TIERS_HEAVY_ABOVE", "9");
            let config: PlugscopeConfig = Figment::new()
                .merge(Serialized::defaults(PlugscopeConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.pipeline.run_timeout_secs, 42);
            assert_eq!(config.github.retry.max_attempts, 5);
            assert_eq!(config.github.user_agent, "tester/1.0");
            assert_eq!(config.tiers.heavy_above, 9);
            Ok(())
        });
    }

    #[test]
    fn explicit_path_replaces_xdg_layers() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[tiers]\nelevated_from = 2\nheavy_above = 4\n")?;
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.tiers.elevated_from, 2);
            assert_eq!(config.tiers.heavy_above, 4);
            Ok(())
        });
    }

    #[test]
    fn github_token_env_is_a_fallback_only() {
        figment::Jail::expect_with(|jail| {
            jail.set_env(GITHUB_TOKEN_ENV, "ghp_fromenv");
            jail.create_file("a.toml", "")?;
            let config = load_config_from_path(Path::new("a.toml"))?;
            assert_eq!(config.github.token.as_deref(), Some("ghp_fromenv"));

            jail.create_file("b.toml", "[github]\ntoken = \"ghp_fromfile\"\n")?;
            let config = load_config_from_path(Path::new("b.toml"))?;
            assert_eq!(config.github.token.as_deref(), Some("ghp_fromfile"));
            Ok(())
        });
    }
}
