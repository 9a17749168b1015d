// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugscope analyze`: score plugins found at one URL or path without
//! touching the catalog store.

use plugscope_catalog::RunStatus;
use plugscope_config::PlugscopeConfig;
use plugscope_core::{PlugscopeError, SourceDescriptor, SourceKind};
use plugscope_quality::{ReportFormat, render_report};
use tokio_util::sync::CancellationToken;

use crate::scrape::print_diagnostics;
use crate::wiring;

const ANALYZE_SOURCE_ID: &str = "analyze";

/// A JSON target is read as a marketplace index; anything else is scanned
/// for plugin directories.
pub fn descriptor_for(target: &str) -> SourceDescriptor {
    let trimmed = target.trim();
    let kind = if trimmed
        .split(['?', '#'])
        .next()
        .is_some_and(|path| path.to_ascii_lowercase().ends_with(".json"))
    {
        SourceKind::ManifestIndex
    } else {
        SourceKind::GithubScan
    };
    SourceDescriptor {
        source_id: ANALYZE_SOURCE_ID.to_string(),
        kind,
        fetch_location: trimmed.to_string(),
        is_canonical: true,
        priority: 0,
    }
}

/// Render every plugin found at `target` to stdout.
pub async fn run_analyze(
    config: &PlugscopeConfig,
    target: &str,
    format: ReportFormat,
    cancel: CancellationToken,
) -> Result<RunStatus, PlugscopeError> {
    let descriptor = descriptor_for(target);
    let pipeline = wiring::pipeline(config)?;
    let catalog = pipeline
        .run_with_cancel(std::slice::from_ref(&descriptor), cancel)
        .await?;
    print_diagnostics(&catalog.summary);

    if let Some(skipped) = catalog.summary.sources_skipped.first() {
        return Err(PlugscopeError::unavailable(
            &skipped.source_id,
            skipped.reason.clone(),
        ));
    }
    if catalog.is_empty() {
        return Err(PlugscopeError::invalid(
            target,
            "no plugin manifest found at this location",
        ));
    }

    let rendered = catalog
        .entities
        .iter()
        .map(|entity| render_report(entity, format))
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", rendered.join("\n"));
    Ok(catalog.summary.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_targets_are_read_as_indexes() {
        assert_eq!(
            descriptor_for("https://example.test/.claude-plugin/marketplace.json").kind,
            SourceKind::ManifestIndex
        );
        assert_eq!(
            descriptor_for("./Marketplace.JSON?ref=main").kind,
            SourceKind::ManifestIndex
        );
    }

    #[test]
    fn other_targets_are_scanned() {
        let d = descriptor_for(" https://github.com/anthropics/claude-code/tree/main/plugins ");
        assert_eq!(d.kind, SourceKind::GithubScan);
        assert_eq!(
            d.fetch_location,
            "https://github.com/anthropics/claude-code/tree/main/plugins"
        );
        assert!(d.is_canonical);
        assert_eq!(descriptor_for("./my-plugin").kind, SourceKind::GithubScan);
    }
}
