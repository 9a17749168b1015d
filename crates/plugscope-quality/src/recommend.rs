// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use plugscope_core::{
    MaintenanceStatus, Priority, QualityReport, Recommendation, ScoreCategory, ServiceTier,
    Severity,
};

use crate::scorer::{
    EMPTY_DESCRIPTION, MISSING_CHANGELOG, MISSING_LICENSE, MISSING_README, NO_CI, NO_EXAMPLES,
    NO_TESTS, UNDOCUMENTED_COMPONENTS,
};

fn action_for(issue: &str) -> &'static str {
    match issue {
        MISSING_README => "Add a README.md describing installation and usage",
        EMPTY_DESCRIPTION => "Add a description to the plugin manifest",
        NO_EXAMPLES => "Add usage examples to the README or an examples/ directory",
        MISSING_CHANGELOG => "Keep a CHANGELOG.md with notable changes per version",
        MISSING_LICENSE => "Add a LICENSE file",
        UNDOCUMENTED_COMPONENTS => "Describe what each command and agent does in its markdown file",
        NO_TESTS => "Add automated tests for hooks and scripts",
        NO_CI => "Run the tests in CI, for example with a GitHub Actions workflow",
        _ => "Review and fix the reported problem",
    }
}

fn recommend(
    priority: Priority,
    category: ScoreCategory,
    issue: String,
    action: &str,
) -> Recommendation {
    Recommendation {
        priority,
        category,
        issue,
        action: action.to_string(),
    }
}

/// Prioritized recommendations for a scored report, high priority first.
///
/// Security issues and a missing README are high priority; test, CI and
/// other documentation gaps are medium; staleness, security warnings and
/// heavy agent usage are low.
pub fn recommendations(report: &QualityReport, tier: ServiceTier) -> Vec<Recommendation> {
    let mut out = Vec::new();

    for finding in &report.security.findings {
        if finding.severity == Severity::Issue {
            let issue = match &finding.file {
                Some(file) => format!("{file}: {}", finding.message),
                None => finding.message.clone(),
            };
            out.push(recommend(
                Priority::High,
                ScoreCategory::Security,
                issue,
                "Remove the flagged code or move secrets to environment variables",
            ));
        }
    }

    for finding in &report.documentation.findings {
        if finding.severity == Severity::Issue {
            let priority = if finding.message == MISSING_README {
                Priority::High
            } else {
                Priority::Medium
            };
            out.push(recommend(
                priority,
                ScoreCategory::Documentation,
                finding.message.clone(),
                action_for(&finding.message),
            ));
        }
    }

    for finding in &report.testing.findings {
        if finding.severity == Severity::Issue {
            out.push(recommend(
                Priority::Medium,
                ScoreCategory::Testing,
                finding.message.clone(),
                action_for(&finding.message),
            ));
        }
    }

    if report.maintenance_status == MaintenanceStatus::Stale {
        out.push(recommend(
            Priority::Low,
            ScoreCategory::Maintenance,
            "repository has had no recent commits".to_string(),
            "Confirm the plugin still works with current releases or mark it as archived",
        ));
    }

    let warnings = report.security.count(Severity::Warning);
    if warnings > 0 {
        out.push(recommend(
            Priority::Low,
            ScoreCategory::Security,
            format!("{warnings} security warning(s)"),
            "Review flagged process execution, file deletion and network access",
        ));
    }

    if tier == ServiceTier::Heavy {
        out.push(recommend(
            Priority::Low,
            ScoreCategory::Documentation,
            "plugin uses many agents".to_string(),
            "Document the expected resource usage for users on smaller plans",
        ));
    }

    out.sort_by_key(|r| r.priority);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_core::{CategoryReport, Finding, ScoreWeights, SubScore};

    fn category(findings: Vec<Finding>) -> CategoryReport {
        CategoryReport {
            score: SubScore::Scored(50),
            findings,
        }
    }

    fn report(status: MaintenanceStatus) -> QualityReport {
        QualityReport::new(
            category(vec![
                Finding::warning("executes external processes").in_file("run.sh"),
                Finding::issue("uses eval(), potential code injection").in_file("hook.py"),
            ]),
            category(vec![]),
            category(vec![Finding::issue(MISSING_LICENSE), Finding::issue(MISSING_README)]),
            category(vec![Finding::issue(NO_CI)]),
            status,
            &ScoreWeights::default(),
        )
    }

    #[test]
    fn ordered_by_priority() {
        let recs = recommendations(&report(MaintenanceStatus::Stale), ServiceTier::Heavy);
        let priorities: Vec<_> = recs.iter().map(|r| r.priority).collect();
        assert_eq!(
            priorities,
            [
                Priority::High,
                Priority::High,
                Priority::Medium,
                Priority::Medium,
                Priority::Low,
                Priority::Low,
                Priority::Low,
            ]
        );
        assert_eq!(recs[0].issue, "hook.py: uses eval(), potential code injection");
        assert_eq!(recs[1].issue, MISSING_README);
    }

    #[test]
    fn healthy_report_has_no_low_priority_noise() {
        let clean = QualityReport::new(
            category(vec![Finding::pass("no security issues found")]),
            category(vec![]),
            category(vec![]),
            category(vec![]),
            MaintenanceStatus::Active,
            &ScoreWeights::default(),
        );
        assert!(recommendations(&clean, ServiceTier::Base).is_empty());
    }
}
