// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugscope doctor` command implementation.
//!
//! Checks the catalog store, GitHub API access and every configured source
//! before a scrape is attempted.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use plugscope_config::PlugscopeConfig;
use plugscope_core::{SourceDescriptor, SourceKind};
use plugscope_github::{GithubClient, parse_github_url};
use plugscope_source::FetchLocation;
use plugscope_storage::SqliteCatalog;

use crate::wiring;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(
        name: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
        start: Instant,
    ) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check and print the results. Returns `true` when nothing failed.
pub async fn run_doctor(config: &PlugscopeConfig, plain: bool) -> bool {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = vec![check_database(&config.storage.database_path).await];

    match wiring::client(config) {
        Ok(client) => {
            results.push(check_github(&client).await);
            for source in &config.sources {
                results.push(check_source(&client, source).await);
            }
        }
        Err(e) => results.push(CheckResult::new(
            "GitHub API",
            CheckStatus::Fail,
            format!("client error: {e}"),
            Instant::now(),
        )),
    }

    println!();
    println!("  plugscope doctor");
    println!("  {}", "-".repeat(50));

    let mut fail_count = 0;
    let mut warn_count = 0;
    for result in &results {
        match result.status {
            CheckStatus::Pass => {}
            CheckStatus::Warn => warn_count += 1,
            CheckStatus::Fail => fail_count += 1,
        }
        println!("{}", format_line(result, use_color));
    }
    println!();

    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    fail_count == 0
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<24} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!(
            "    {tag} {:<24} {} ({duration_ms}ms)",
            result.name, result.message
        )
    }
}

/// The catalog store opens (creating it if needed) and can be counted.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let existed = Path::new(db_path).exists();
    let config = plugscope_config::model::StorageConfig {
        database_path: db_path.to_string(),
        ..Default::default()
    };
    let store = match SqliteCatalog::open(&config).await {
        Ok(store) => store,
        Err(e) => {
            return CheckResult::new(
                "Catalog store",
                CheckStatus::Fail,
                format!("open failed: {e}"),
                start,
            );
        }
    };
    let result = match store.count().await {
        Ok(n) if existed => {
            CheckResult::new("Catalog store", CheckStatus::Pass, format!("{n} plugins"), start)
        }
        Ok(_) => CheckResult::new(
            "Catalog store",
            CheckStatus::Warn,
            format!("created empty store at {db_path}"),
            start,
        ),
        Err(e) => CheckResult::new(
            "Catalog store",
            CheckStatus::Fail,
            format!("query failed: {e}"),
            start,
        ),
    };
    let _ = store.close().await;
    result
}

/// The API answers and reports the remaining core rate limit.
async fn check_github(client: &GithubClient) -> CheckResult {
    let start = Instant::now();
    let url = format!("{}/rate_limit", client.api_base());
    match client.get_json::<serde_json::Value>(&url).await {
        Ok(body) => {
            let core = &body["resources"]["core"];
            let remaining = core["remaining"].as_u64();
            let limit = core["limit"].as_u64();
            let quota = match (remaining, limit) {
                (Some(r), Some(l)) => format!("{r}/{l} requests left"),
                _ => "reachable".to_string(),
            };
            if !client.is_authenticated() {
                CheckResult::new(
                    "GitHub API",
                    CheckStatus::Warn,
                    format!("{quota}, anonymous (set GITHUB_TOKEN for a higher limit)"),
                    start,
                )
            } else if remaining == Some(0) {
                CheckResult::new(
                    "GitHub API",
                    CheckStatus::Warn,
                    format!("{quota}, limit exhausted"),
                    start,
                )
            } else {
                CheckResult::new("GitHub API", CheckStatus::Pass, quota, start)
            }
        }
        Err(e) => CheckResult::new("GitHub API", CheckStatus::Fail, e.to_string(), start),
    }
}

/// A source location exists (local) or answers (remote).
async fn check_source(client: &GithubClient, source: &SourceDescriptor) -> CheckResult {
    let start = Instant::now();
    let name = format!("Source {}", source.source_id);
    let location = match FetchLocation::parse(&source.fetch_location) {
        Ok(location) => location,
        Err(e) => return CheckResult::new(name, CheckStatus::Fail, e, start),
    };
    match location {
        FetchLocation::Local(path) => {
            if path.exists() {
                CheckResult::new(name, CheckStatus::Pass, path.display().to_string(), start)
            } else {
                CheckResult::new(
                    name,
                    CheckStatus::Fail,
                    format!("not found: {}", path.display()),
                    start,
                )
            }
        }
        FetchLocation::Remote(url) => {
            let reached = match (source.kind, parse_github_url(url.as_str())) {
                (SourceKind::GithubScan, Some(repo)) => client
                    .repo(&repo.owner, &repo.repo)
                    .await
                    .map(|_| format!("repository {}", repo.slug())),
                _ => client
                    .get_text(url.as_str())
                    .await
                    .map(|body| format!("{} bytes", body.len())),
            };
            match reached {
                Ok(message) => CheckResult::new(name, CheckStatus::Pass, message, start),
                Err(e) => CheckResult::new(name, CheckStatus::Fail, e.to_string(), start),
            }
        }
    }
}
