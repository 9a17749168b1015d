// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugscope scrape` command implementation.
//!
//! Runs every configured source through the pipeline and publishes the
//! catalog to the SQLite store, or to a JSON file with `--output`.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use plugscope_catalog::{Catalog, PublishReport, RunStatus, RunSummary};
use plugscope_config::PlugscopeConfig;
use plugscope_core::{PlugscopeError, SourceDescriptor};
use plugscope_storage::{JsonFileSink, SqliteCatalog};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::wiring;

/// Options of a scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOptions {
    /// Write a JSON catalog here instead of the SQLite store.
    pub output: Option<PathBuf>,
    /// Restrict the run to these source ids.
    pub only: Vec<String>,
    /// Override `pipeline.run_timeout_secs`; 0 disables the deadline.
    pub timeout_secs: Option<u64>,
}

/// The configured sources selected by `only`, in configuration order.
pub fn select_sources(
    config: &PlugscopeConfig,
    only: &[String],
) -> Result<Vec<SourceDescriptor>, PlugscopeError> {
    if let Some(unknown) = only
        .iter()
        .find(|id| !config.sources.iter().any(|s| &s.source_id == *id))
    {
        return Err(PlugscopeError::Config(format!(
            "unknown source `{unknown}`; configured sources: {}",
            config
                .sources
                .iter()
                .map(|s| s.source_id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    let selected: Vec<SourceDescriptor> = config
        .sources
        .iter()
        .filter(|s| only.is_empty() || only.contains(&s.source_id))
        .cloned()
        .collect();
    if selected.is_empty() {
        return Err(PlugscopeError::Config("no sources configured".to_string()));
    }
    Ok(selected)
}

pub async fn run_scrape(
    config: &PlugscopeConfig,
    options: ScrapeOptions,
    cancel: CancellationToken,
) -> Result<RunStatus, PlugscopeError> {
    let sources = select_sources(config, &options.only)?;
    let mut pipeline = wiring::pipeline(config)?;
    if let Some(secs) = options.timeout_secs {
        pipeline = pipeline.with_run_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    let catalog = pipeline.run_with_cancel(&sources, cancel).await?;
    print_diagnostics(&catalog.summary);

    let report = match &options.output {
        Some(path) => {
            let sink = JsonFileSink::open(path)?;
            catalog.publish(&sink).await
        }
        None => {
            let store = SqliteCatalog::open(&config.storage).await?;
            let report = catalog.publish(&store).await;
            store.close().await?;
            report
        }
    };
    print_outcome(&catalog, &report);

    let status = catalog.summary.outcome();
    if status == RunStatus::Complete && !report.is_clean() {
        info!("publishing was incomplete, reporting a partial run");
        return Ok(RunStatus::Partial);
    }
    Ok(status)
}

/// Skipped sources, candidates and signals, one line each on stderr.
pub fn print_diagnostics(summary: &RunSummary) {
    let use_color = std::io::stderr().is_terminal();
    for line in summary.diagnostics() {
        if use_color {
            use colored::Colorize;
            eprintln!("  {} {line}", "!".yellow());
        } else {
            eprintln!("  [WARN] {line}");
        }
    }
}

fn print_outcome(catalog: &Catalog, report: &PublishReport) {
    let summary = &catalog.summary;
    println!(
        "run {}: {} plugins from {} of {} sources ({} candidates, {} rejected, {} without signals)",
        catalog.run_id,
        catalog.len(),
        summary.sources_total - summary.sources_skipped.len(),
        summary.sources_total,
        summary.candidates_seen,
        summary.candidates_rejected.len(),
        summary.signals_unresolved.len(),
    );
    println!("published {} plugins", report.upserted);
    for failure in &report.failed {
        eprintln!("  failed to store `{}`: {}", failure.slug, failure.error);
    }
    if let Some(error) = &report.flush_error {
        eprintln!("  failed to flush catalog: {error}");
    }
    println!("status: {}", summary.outcome());
}
