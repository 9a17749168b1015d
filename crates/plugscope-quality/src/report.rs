// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality report rendering.
//!
//! Rendering is a pure function of a [`PluginEntity`]: no clock, no I/O.
//! The JSON layout can be parsed back with [`parse_json_report`].

use std::fmt::Write as _;

use plugscope_core::{
    ComponentInventory, PlugscopeError, PluginEntity, QualityReport, RequirementProfile,
    ScoreCategory, SignalOutcome, SubScore,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Version of the JSON report layout.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Output layout of a rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReportFormat {
    /// Machine-readable, parseable with [`parse_json_report`].
    Json,
    Markdown,
    #[default]
    Text,
}

/// Machine-readable report of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub schema_version: u32,
    pub identity_key: String,
    pub slug: String,
    pub name: String,
    pub version: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub sources: Vec<String>,
    pub components: ComponentInventory,
    pub requirements: RequirementProfile,
    pub signals: SignalOutcome,
    pub quality: QualityReport,
}

impl ReportDocument {
    pub fn from_entity(entity: &PluginEntity) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            identity_key: entity.identity_key.clone(),
            slug: entity.slug.clone(),
            name: entity.manifest.name.clone(),
            version: entity.manifest.version.clone(),
            category: entity.category.clone(),
            description: entity.manifest.description.clone(),
            author: entity.manifest.author.as_ref().map(|a| a.name.clone()),
            repository: entity.manifest.repository.clone(),
            sources: entity.source_ids().into_iter().map(str::to_string).collect(),
            components: entity.inventory,
            requirements: entity.requirements.clone(),
            signals: entity.signals.clone(),
            quality: entity.quality.clone(),
        }
    }
}

/// Render a report in the chosen layout.
pub fn render_report(entity: &PluginEntity, format: ReportFormat) -> Result<String, PlugscopeError> {
    let doc = ReportDocument::from_entity(entity);
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(&doc).map_err(|e| {
            PlugscopeError::Internal(format!("failed to serialize report: {e}"))
        }),
        ReportFormat::Markdown => Ok(render_markdown(&doc)),
        ReportFormat::Text => Ok(render_text(&doc)),
    }
}

/// Parse a report rendered with [`ReportFormat::Json`].
pub fn parse_json_report(json: &str) -> Result<ReportDocument, PlugscopeError> {
    let doc: ReportDocument = serde_json::from_str(json)
        .map_err(|e| PlugscopeError::Internal(format!("invalid report JSON: {e}")))?;
    if doc.schema_version != REPORT_SCHEMA_VERSION {
        return Err(PlugscopeError::Internal(format!(
            "unsupported report schema version {}",
            doc.schema_version
        )));
    }
    Ok(doc)
}

fn overall_label(quality: &QualityReport) -> String {
    match quality.overall_rounded() {
        Some(v) => format!("{v}/100"),
        None => "unscored".to_string(),
    }
}

fn signals_line(signals: &SignalOutcome) -> String {
    match signals {
        SignalOutcome::Resolved { signals } => {
            let show = |v: Option<u32>| v.map_or_else(|| "unknown".to_string(), |n| n.to_string());
            let last = signals
                .last_commit
                .map_or_else(|| "unknown".to_string(), |t| t.format("%Y-%m-%d").to_string());
            format!(
                "last commit {last}, {} commits in 90 days, {} open issues, {} issues closed in 30 days, {} stars",
                show(signals.commits_90d),
                show(signals.open_issues),
                show(signals.closed_issues_30d),
                show(signals.stars),
            )
        }
        SignalOutcome::Unresolvable { reason } => format!("unavailable ({reason})"),
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn render_markdown(doc: &ReportDocument) -> String {
    let mut out = String::new();
    let q = &doc.quality;
    let _ = writeln!(out, "# Quality report: {} {}", doc.name, doc.version);
    let _ = writeln!(out);
    if !doc.description.is_empty() {
        let _ = writeln!(out, "{}", doc.description);
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "- **Category:** {}", doc.category);
    if let Some(author) = &doc.author {
        let _ = writeln!(out, "- **Author:** {author}");
    }
    if let Some(repo) = &doc.repository {
        let _ = writeln!(out, "- **Repository:** {repo}");
    }
    let _ = writeln!(out, "- **Sources:** {}", doc.sources.join(", "));
    let _ = writeln!(out, "- **Overall score:** {}", overall_label(q));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Scores");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Category | Score |");
    let _ = writeln!(out, "|---|---|");
    for category in ScoreCategory::ALL {
        let _ = writeln!(out, "| {category} | {} |", q.category(category).score);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Maintenance status: {}", q.maintenance_status);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Components");
    let _ = writeln!(out);
    let c = &doc.components;
    let _ = writeln!(out, "- Commands: {}", c.commands);
    let _ = writeln!(out, "- Agents: {}", c.agents);
    let _ = writeln!(out, "- Hooks: {}", c.hooks);
    let _ = writeln!(out, "- MCP servers: {}", c.mcp_servers);
    let _ = writeln!(out);

    let r = &doc.requirements;
    let _ = writeln!(out, "## Requirements");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Service tier: {}", r.tier);
    let _ = writeln!(out, "- Prerequisites: {}", list_or_none(&r.prerequisites));
    let _ = writeln!(out, "- Dependencies: {}", list_or_none(&r.dependencies));
    let _ = writeln!(out, "- Credentials: {}", list_or_none(&r.credentials));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Repository activity");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", signals_line(&doc.signals));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Findings");
    for category in ScoreCategory::ALL {
        let report = q.category(category);
        if report.findings.is_empty() {
            continue;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "### {category}");
        let _ = writeln!(out);
        for f in &report.findings {
            match &f.file {
                Some(file) => {
                    let _ = writeln!(out, "- [{}] {} (`{file}`)", f.severity, f.message);
                }
                None => {
                    let _ = writeln!(out, "- [{}] {}", f.severity, f.message);
                }
            }
        }
    }

    if !q.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Recommendations");
        let _ = writeln!(out);
        for rec in &q.recommendations {
            let _ = writeln!(
                out,
                "- **{}** ({}): {}. {}",
                rec.priority, rec.category, rec.issue, rec.action
            );
        }
    }
    out
}

fn score_bar(score: SubScore) -> String {
    match score.value() {
        Some(v) => {
            let filled = usize::from(v / 10);
            format!("{}{} {score}", "#".repeat(filled), ".".repeat(10 - filled))
        }
        None => format!("{} {score}", "-".repeat(10)),
    }
}

fn render_text(doc: &ReportDocument) -> String {
    let mut out = String::new();
    let q = &doc.quality;
    let _ = writeln!(out, "{} {} [{}]", doc.name, doc.version, doc.category);
    if let Some(repo) = &doc.repository {
        let _ = writeln!(out, "  repository: {repo}");
    }
    let _ = writeln!(out, "  sources:    {}", doc.sources.join(", "));
    let _ = writeln!(out);
    let _ = writeln!(out, "  overall        {}", overall_label(q));
    for category in ScoreCategory::ALL {
        let label = category.to_string();
        let _ = writeln!(out, "  {label:<14} {}", score_bar(q.category(category).score));
    }
    let _ = writeln!(out, "  status         {}", q.maintenance_status);
    let _ = writeln!(out);
    let c = &doc.components;
    let _ = writeln!(
        out,
        "  components: {} commands, {} agents, {} hooks, {} MCP servers",
        c.commands, c.agents, c.hooks, c.mcp_servers
    );
    let r = &doc.requirements;
    let _ = writeln!(out, "  tier:       {}", r.tier);
    let _ = writeln!(out, "  needs:      {}", list_or_none(&r.prerequisites));
    let _ = writeln!(out, "  credentials: {}", list_or_none(&r.credentials));
    let _ = writeln!(out, "  activity:   {}", signals_line(&doc.signals));
    if !q.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  recommendations:");
        for rec in &q.recommendations {
            let _ = writeln!(out, "    [{}] {}: {}", rec.priority, rec.issue, rec.action);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_test_utils::entity_fixture;
    use std::str::FromStr;

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!(ReportFormat::from_str("JSON").unwrap(), ReportFormat::Json);
        assert_eq!(ReportFormat::from_str("markdown").unwrap(), ReportFormat::Markdown);
        assert!(ReportFormat::from_str("html").is_err());
    }

    #[test]
    fn markdown_lists_scores_and_unscored_categories() {
        let entity = entity_fixture("Demo Plugin", Some("https://github.com/o/demo"));
        let md = render_report(&entity, ReportFormat::Markdown).unwrap();
        assert!(md.starts_with("# Quality report: Demo Plugin"));
        assert!(md.contains("| security | 100/100 |"));
        assert!(md.contains("| maintenance | unscored |"));
        assert!(md.contains("- **Repository:** https://github.com/o/demo"));
    }

    #[test]
    fn text_shows_overall_and_bars() {
        let entity = entity_fixture("demo", None);
        let text = render_report(&entity, ReportFormat::Text).unwrap();
        assert!(text.contains("overall        74/100"));
        assert!(text.contains("##########"));
        assert!(text.contains("---------- unscored"));
    }

    #[test]
    fn rendering_does_not_mutate() {
        let entity = entity_fixture("demo", None);
        let before = entity.clone();
        let _ = render_report(&entity, ReportFormat::Json).unwrap();
        assert_eq!(entity, before);
    }

    #[test]
    fn rejects_unknown_schema_versions() {
        let entity = entity_fixture("demo", None);
        let json = render_report(&entity, ReportFormat::Json).unwrap();
        let bumped = json.replacen("\"schema_version\": 1", "\"schema_version\": 99", 1);
        assert!(parse_json_report(&bumped).is_err());
        assert!(parse_json_report("not json").is_err());
    }
}
