// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! plugscope: enrich, score and deduplicate plugin marketplace listings.
//!
//! This is the binary entry point.
//!
//! Exit codes: 0 success, 1 runtime error, 2 configuration error,
//! 3 partial run (some sources skipped), 4 total failure.

mod analyze;
mod doctor;
mod report;
mod scrape;
mod shutdown;
mod wiring;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use plugscope_catalog::RunStatus;
use plugscope_config::PlugscopeConfig;
use plugscope_core::PlugscopeError;
use plugscope_quality::ReportFormat;

const EXIT_ERROR: u8 = 1;
const EXIT_CONFIG: u8 = 2;

/// plugscope: enrich, score and deduplicate plugin marketplace listings.
#[derive(Parser, Debug)]
#[command(name = "plugscope", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape every configured source and publish the catalog.
    Scrape {
        /// Write the catalog to a JSON file instead of the SQLite store.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only scrape this source (repeatable).
        #[arg(long = "source", value_name = "ID")]
        only: Vec<String>,
        /// Run deadline in seconds; 0 disables it.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Analyze the plugins at a repository URL, directory or index file.
    Analyze {
        target: String,
        /// Report layout: text, markdown or json.
        #[arg(long, short, default_value = "text")]
        format: ReportFormat,
    },
    /// Render the report of one published plugin.
    Report {
        /// Identity key or slug.
        plugin: String,
        /// Report layout: text, markdown or json.
        #[arg(long, short, default_value = "text")]
        format: ReportFormat,
        /// Read from a JSON catalog written by `scrape --output`.
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
    },
    /// List published plugins.
    List {
        /// Read from a JSON catalog written by `scrape --output`.
        #[arg(long, value_name = "PATH")]
        catalog: Option<PathBuf>,
    },
    /// Check storage, GitHub access and source reachability.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plugscope_config::load_and_validate_path(path),
        None => plugscope_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plugscope_config::render_errors(&errors);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    init_tracing(&config.pipeline.log_level);

    match run(cli.command, &config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("plugscope: {e}");
            ExitCode::from(exit_code_for_error(&e))
        }
    }
}

async fn run(command: Commands, config: &PlugscopeConfig) -> Result<u8, PlugscopeError> {
    match command {
        Commands::Scrape {
            output,
            only,
            timeout,
        } => {
            let cancel = shutdown::install_signal_handler();
            let options = scrape::ScrapeOptions {
                output,
                only,
                timeout_secs: timeout,
            };
            let status = scrape::run_scrape(config, options, cancel).await?;
            Ok(exit_code_for_status(status))
        }
        Commands::Analyze { target, format } => {
            let cancel = shutdown::install_signal_handler();
            let status = analyze::run_analyze(config, &target, format, cancel).await?;
            Ok(exit_code_for_status(status))
        }
        Commands::Report {
            plugin,
            format,
            catalog,
        } => {
            let found = report::run_report(config, catalog.as_deref(), &plugin, format).await?;
            Ok(if found { 0 } else { EXIT_ERROR })
        }
        Commands::List { catalog } => {
            report::run_list(config, catalog.as_deref()).await?;
            Ok(0)
        }
        Commands::Doctor { plain } => {
            let healthy = doctor::run_doctor(config, plain).await;
            Ok(if healthy { 0 } else { EXIT_ERROR })
        }
    }
}

fn exit_code_for_status(status: RunStatus) -> u8 {
    u8::try_from(status.exit_code()).unwrap_or(EXIT_ERROR)
}

fn exit_code_for_error(error: &PlugscopeError) -> u8 {
    match error {
        e if e.is_fatal() => EXIT_CONFIG,
        PlugscopeError::SourceUnavailable { .. } => exit_code_for_status(RunStatus::Failed),
        _ => EXIT_ERROR,
    }
}

/// Logs go to stderr so rendered reports on stdout stay clean. `RUST_LOG`
/// overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plugscope={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
