// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The quality rubric.
//!
//! Every sub-score is a pure function of the [`ScoringInput`] and the
//! [`ScoringConfig`] thresholds. The evaluation instant is part of the input
//! so a report can be reproduced exactly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use plugscope_config::ScoringConfig;
use plugscope_core::{
    CategoryReport, ComponentInventory, FileTree, Finding, MaintenanceStatus, ParsedManifest,
    QualityReport, RequirementProfile, SignalOutcome, SubScore,
};
use tracing::debug;

use crate::recommend::recommendations;
use crate::security::{FindingKind, scan};

pub const MISSING_README: &str = "missing README";
pub const EMPTY_DESCRIPTION: &str = "description is empty";
pub const SHORT_DESCRIPTION: &str = "description is short";
pub const NO_EXAMPLES: &str = "no usage examples found";
pub const MISSING_CHANGELOG: &str = "missing CHANGELOG";
pub const MISSING_LICENSE: &str = "missing LICENSE";
pub const UNDOCUMENTED_COMPONENTS: &str = "some commands or agents have no documentation body";
pub const NO_TESTS: &str = "no automated tests found";
pub const NO_CI: &str = "no CI configuration found";
pub const TREE_UNAVAILABLE: &str = "file tree unavailable";

/// Markdown shorter than this (trimmed) does not document a component.
const MIN_COMPONENT_DOC_CHARS: usize = 40;

const README_NAMES: &[&str] = &["README.md", "README", "README.rst", "README.txt"];
const CHANGELOG_NAMES: &[&str] = &["CHANGELOG.md", "CHANGELOG", "HISTORY.md"];
const LICENSE_NAMES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE.txt", "COPYING"];
const TEST_DIRS: &[&str] = &["tests", "test", "__tests__", "spec"];
const TEST_FILE_SUFFIXES: &[&str] = &[
    "_test.py", ".test.js", ".spec.js", ".test.ts", ".spec.ts", "_test.go",
];
const CI_DIRS: &[&str] = &[".github/workflows", ".circleci"];
const CI_FILES: &[&str] = &[
    ".travis.yml",
    ".gitlab-ci.yml",
    "azure-pipelines.yml",
    "Jenkinsfile",
];

/// Everything the rubric looks at for one entity.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub manifest: &'a ParsedManifest,
    pub inventory: &'a ComponentInventory,
    pub signals: &'a SignalOutcome,
    pub requirements: &'a RequirementProfile,
    /// `None` when the source provided a manifest only.
    pub file_tree: Option<&'a FileTree>,
    pub file_contents: &'a BTreeMap<String, String>,
    /// Instant the maintenance recency is measured against.
    pub as_of: DateTime<Utc>,
}

/// Computes [`QualityReport`]s from configured rubrics.
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, input: &ScoringInput<'_>) -> QualityReport {
        let security = self.security(input);
        let (maintenance, status) = self.maintenance(input);
        let documentation = self.documentation(input);
        let testing = self.testing(input);
        let mut report = QualityReport::new(
            security,
            maintenance,
            documentation,
            testing,
            status,
            &self.config.weights,
        );
        report.recommendations = recommendations(&report, input.requirements.tier);
        debug!(
            name = %input.manifest.name,
            overall = ?report.overall,
            "quality scored"
        );
        report
    }

    fn security(&self, input: &ScoringInput<'_>) -> CategoryReport {
        let rubric = &self.config.security;
        let mut score = i64::from(rubric.baseline);
        let mut findings = Vec::new();

        for hit in scan(input.file_contents) {
            score -= i64::from(match hit.kind {
                FindingKind::Evaluation => rubric.issue_penalty,
                FindingKind::Behavior => rubric.warning_penalty,
                FindingKind::Secret => rubric.secret_penalty,
            });
            findings.push(hit.finding);
        }

        let documented_in = |name: &str| {
            input.manifest.description.contains(name)
                || README_NAMES.iter().any(|readme| {
                    input
                        .file_contents
                        .get(*readme)
                        .is_some_and(|text| text.contains(name))
                })
        };
        for credential in &input.requirements.credentials {
            if !documented_in(credential) {
                score -= i64::from(rubric.undocumented_credential_penalty);
                findings.push(Finding::warning(format!(
                    "credential `{credential}` is required but not documented"
                )));
            }
        }

        if input.file_contents.is_empty() {
            findings.push(Finding::warning("no files were inspected"));
        } else if findings.is_empty() {
            findings.push(Finding::pass("no security issues found"));
        }

        CategoryReport {
            score: SubScore::clamped(score),
            findings,
        }
    }

    fn maintenance(&self, input: &ScoringInput<'_>) -> (CategoryReport, MaintenanceStatus) {
        let rubric = &self.config.maintenance;
        let signals = match input.signals {
            SignalOutcome::Resolved { signals } => signals,
            SignalOutcome::Unresolvable { reason } => {
                return (
                    CategoryReport::unscored(format!("repository signals unavailable: {reason}")),
                    MaintenanceStatus::Unknown,
                );
            }
        };
        let Some(last_commit) = signals.last_commit else {
            return (
                CategoryReport::unscored("last commit time unknown"),
                MaintenanceStatus::Unknown,
            );
        };

        let days = (input.as_of - last_commit).num_days().max(0);
        let (status, base) = if days < rubric.active_days {
            (MaintenanceStatus::Active, rubric.active_score)
        } else if days < rubric.maintained_days {
            (MaintenanceStatus::Maintained, rubric.maintained_score)
        } else if days < rubric.slow_days {
            (MaintenanceStatus::Slow, rubric.slow_score)
        } else {
            (MaintenanceStatus::Stale, rubric.stale_score)
        };

        let mut score = i64::from(base);
        let mut findings = vec![match status {
            MaintenanceStatus::Active | MaintenanceStatus::Maintained => {
                Finding::pass(format!("last commit {days} days ago"))
            }
            MaintenanceStatus::Slow => Finding::warning(format!("last commit {days} days ago")),
            _ => Finding::issue(format!("last commit {days} days ago")),
        }];
        match signals.commits_90d {
            Some(0) => {
                score -= i64::from(rubric.idle_penalty);
                findings.push(Finding::warning("no commits in the last 90 days"));
            }
            Some(n) if n >= rubric.busy_commits_90d => {
                score += i64::from(rubric.busy_bonus);
                findings.push(Finding::pass(format!("{n} commits in the last 90 days")));
            }
            Some(n) => findings.push(Finding::pass(format!("{n} commits in the last 90 days"))),
            None => {}
        }

        (
            CategoryReport {
                score: SubScore::clamped(score),
                findings,
            },
            status,
        )
    }

    fn documentation(&self, input: &ScoringInput<'_>) -> CategoryReport {
        let rubric = &self.config.documentation;
        let mut score = 0i64;
        let mut findings = Vec::new();

        let description = input.manifest.description.chars().count();
        if description >= rubric.good_description_chars {
            score += i64::from(rubric.description_points);
            findings.push(Finding::pass("has a description"));
        } else if description > 0 {
            score += i64::from(rubric.short_description_points);
            findings.push(Finding::warning(SHORT_DESCRIPTION));
        } else {
            findings.push(Finding::issue(EMPTY_DESCRIPTION));
        }

        let Some(tree) = input.file_tree else {
            findings.push(Finding::warning(format!(
                "{TREE_UNAVAILABLE}, README and examples not checked"
            )));
            return CategoryReport {
                score: SubScore::clamped(score),
                findings,
            };
        };

        let mut award = |present: bool, points: u8, pass: &str, missing: Option<&str>| {
            if present {
                score += i64::from(points);
                findings.push(Finding::pass(pass));
            } else if let Some(missing) = missing {
                findings.push(Finding::issue(missing));
            }
        };
        let any_of = |names: &[&str]| names.iter().any(|n| tree.contains_ignore_case(n));

        award(any_of(README_NAMES), rubric.readme_points, "has a README", Some(MISSING_README));
        award(
            has_examples(tree, input.file_contents),
            rubric.examples_points,
            "has usage examples",
            Some(NO_EXAMPLES),
        );
        award(
            any_of(CHANGELOG_NAMES),
            rubric.changelog_points,
            "has a CHANGELOG",
            Some(MISSING_CHANGELOG),
        );
        award(
            any_of(LICENSE_NAMES),
            rubric.license_points,
            "has a LICENSE",
            Some(MISSING_LICENSE),
        );
        award(
            tree.contains_ignore_case("CONTRIBUTING.md"),
            rubric.contributing_points,
            "has contribution guidelines",
            None,
        );
        if input.inventory.commands + input.inventory.agents > 0 {
            award(
                components_documented(tree, input.file_contents),
                rubric.component_docs_points,
                "commands and agents are documented",
                Some(UNDOCUMENTED_COMPONENTS),
            );
        }

        CategoryReport {
            score: SubScore::clamped(score),
            findings,
        }
    }

    fn testing(&self, input: &ScoringInput<'_>) -> CategoryReport {
        let Some(tree) = input.file_tree else {
            return CategoryReport::unscored(TREE_UNAVAILABLE);
        };
        let rubric = &self.config.testing;
        let mut score = 0i64;
        let mut findings = Vec::new();

        let has_tests = TEST_DIRS.iter().any(|d| tree.has_dir(d))
            || tree.file_names().any(|name| {
                (name.starts_with("test_") && name.ends_with(".py"))
                    || TEST_FILE_SUFFIXES.iter().any(|s| name.ends_with(s))
            });
        if has_tests {
            score += i64::from(rubric.tests_points);
            findings.push(Finding::pass("has automated tests"));
        } else {
            findings.push(Finding::issue(NO_TESTS));
        }

        let has_ci = CI_DIRS.iter().any(|d| tree.has_dir(d))
            || CI_FILES.iter().any(|f| tree.contains(f));
        if has_ci {
            score += i64::from(rubric.ci_points);
            findings.push(Finding::pass("has CI configuration"));
        } else {
            findings.push(Finding::issue(NO_CI));
        }

        CategoryReport {
            score: SubScore::clamped(score),
            findings,
        }
    }
}

fn has_examples(tree: &FileTree, contents: &BTreeMap<String, String>) -> bool {
    if tree.has_dir("examples") || tree.has_dir("example") {
        return true;
    }
    README_NAMES
        .iter()
        .filter_map(|name| contents.get(*name))
        .any(|text| {
            let lower = text.to_lowercase();
            lower.contains("## usage") || lower.contains("## example") || lower.contains("```")
        })
}

/// True unless an inspected command or agent file is near empty.
fn components_documented(tree: &FileTree, contents: &BTreeMap<String, String>) -> bool {
    ["commands", "agents"].iter().all(|dir| {
        tree.children(dir)
            .filter(|name| name.ends_with(".md"))
            .all(|name| {
                contents
                    .get(&format!("{dir}/{name}"))
                    .is_none_or(|body| body.trim().chars().count() >= MIN_COMPONENT_DOC_CHARS)
            })
    })
}
