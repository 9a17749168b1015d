// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality report model: sub-scores, findings, recommendations and the
//! renormalized overall score.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One category sub-score. `Unscored` is distinct from zero and is excluded
/// from the overall average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SubScore {
    Scored(u8),
    Unscored,
}

impl SubScore {
    /// Clamp an arbitrary integer into a 0..=100 score.
    pub fn clamped(value: i64) -> Self {
        Self::Scored(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> Option<u8> {
        match self {
            Self::Scored(v) => Some(v),
            Self::Unscored => None,
        }
    }

    pub fn is_scored(self) -> bool {
        matches!(self, Self::Scored(_))
    }
}

impl std::fmt::Display for SubScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scored(v) => write!(f, "{v}/100"),
            Self::Unscored => write!(f, "unscored"),
        }
    }
}

/// The four scoring categories, in report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScoreCategory {
    Security,
    Maintenance,
    Documentation,
    Testing,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 4] = [
        Self::Security,
        Self::Maintenance,
        Self::Documentation,
        Self::Testing,
    ];
}

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Pass,
    Warning,
    Issue,
}

/// An explainable observation that contributed to a sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    /// File the finding came from, when it came from static inspection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Finding {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Pass,
            message: message.into(),
            file: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: None,
        }
    }

    pub fn issue(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Issue,
            message: message.into(),
            file: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Sub-score plus the findings that explain it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub score: SubScore,
    #[serde(default)]
    pub findings: Vec<Finding>,
}

impl CategoryReport {
    pub fn unscored(reason: impl Into<String>) -> Self {
        Self {
            score: SubScore::Unscored,
            findings: vec![Finding::warning(reason)],
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Label derived from days since the last commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MaintenanceStatus {
    Active,
    Maintained,
    Slow,
    Stale,
    #[default]
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A prioritized suggestion for the plugin author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: ScoreCategory,
    pub issue: String,
    pub action: String,
}

/// Weights of the four categories in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreWeights {
    #[serde(default = "default_security_weight")]
    pub security: f64,
    #[serde(default = "default_maintenance_weight")]
    pub maintenance: f64,
    #[serde(default = "default_documentation_weight")]
    pub documentation: f64,
    #[serde(default = "default_testing_weight")]
    pub testing: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            security: default_security_weight(),
            maintenance: default_maintenance_weight(),
            documentation: default_documentation_weight(),
            testing: default_testing_weight(),
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, category: ScoreCategory) -> f64 {
        match category {
            ScoreCategory::Security => self.security,
            ScoreCategory::Maintenance => self.maintenance,
            ScoreCategory::Documentation => self.documentation,
            ScoreCategory::Testing => self.testing,
        }
    }

    pub fn total(&self) -> f64 {
        self.security + self.maintenance + self.documentation + self.testing
    }
}

fn default_security_weight() -> f64 {
    0.3
}

fn default_maintenance_weight() -> f64 {
    0.3
}

fn default_documentation_weight() -> f64 {
    0.2
}

fn default_testing_weight() -> f64 {
    0.2
}

/// Full quality assessment of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub security: CategoryReport,
    pub maintenance: CategoryReport,
    pub documentation: CategoryReport,
    pub testing: CategoryReport,
    pub maintenance_status: MaintenanceStatus,
    /// Weighted average of the present sub-scores; `None` when none is present.
    pub overall: Option<f64>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl QualityReport {
    /// Assemble a report and compute its overall score.
    pub fn new(
        security: CategoryReport,
        maintenance: CategoryReport,
        documentation: CategoryReport,
        testing: CategoryReport,
        maintenance_status: MaintenanceStatus,
        weights: &ScoreWeights,
    ) -> Self {
        let mut report = Self {
            security,
            maintenance,
            documentation,
            testing,
            maintenance_status,
            overall: None,
            recommendations: Vec::new(),
        };
        report.recompute_overall(weights);
        report
    }

    pub fn category(&self, category: ScoreCategory) -> &CategoryReport {
        match category {
            ScoreCategory::Security => &self.security,
            ScoreCategory::Maintenance => &self.maintenance,
            ScoreCategory::Documentation => &self.documentation,
            ScoreCategory::Testing => &self.testing,
        }
    }

    /// Recompute `overall` as the weighted average of scored categories,
    /// renormalized over the weights of the categories that are present.
    pub fn recompute_overall(&mut self, weights: &ScoreWeights) {
        self.overall = weighted_overall(
            ScoreCategory::ALL
                .iter()
                .map(|c| (self.category(*c).score, weights.weight(*c))),
        );
    }

    /// Overall score rounded for display.
    pub fn overall_rounded(&self) -> Option<u8> {
        self.overall.map(|v| v.round().clamp(0.0, 100.0) as u8)
    }
}

/// Weighted average over scored entries. Zero-weight entries do not count
/// towards the denominator.
pub fn weighted_overall(scores: impl IntoIterator<Item = (SubScore, f64)>) -> Option<f64> {
    let (sum, weight) = scores
        .into_iter()
        .filter_map(|(score, w)| score.value().map(|v| (f64::from(v) * w, w)))
        .fold((0.0, 0.0), |(s, t), (v, w)| (s + v, t + w));
    (weight > 0.0).then(|| sum / weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn report(scores: [SubScore; 4]) -> QualityReport {
        let cat = |s| CategoryReport {
            score: s,
            findings: vec![],
        };
        QualityReport::new(
            cat(scores[0]),
            cat(scores[1]),
            cat(scores[2]),
            cat(scores[3]),
            MaintenanceStatus::Unknown,
            &ScoreWeights::default(),
        )
    }

    #[test]
    fn all_scored_uses_full_weights() {
        let r = report([
            SubScore::Scored(100),
            SubScore::Scored(50),
            SubScore::Scored(80),
            SubScore::Scored(0),
        ]);
        let expected = 100.0 * 0.3 + 50.0 * 0.3 + 80.0 * 0.2;
        assert!((r.overall.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn unscored_testing_renormalizes_over_remaining_weight() {
        let r = report([
            SubScore::Scored(90),
            SubScore::Scored(60),
            SubScore::Scored(70),
            SubScore::Unscored,
        ]);
        let expected = (90.0 * 0.3 + 60.0 * 0.3 + 70.0 * 0.2) / 0.8;
        assert!((r.overall.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_is_not_unscored() {
        let zero = report([
            SubScore::Scored(100),
            SubScore::Scored(0),
            SubScore::Scored(100),
            SubScore::Scored(100),
        ]);
        let missing = report([
            SubScore::Scored(100),
            SubScore::Unscored,
            SubScore::Scored(100),
            SubScore::Scored(100),
        ]);
        assert!(zero.overall.unwrap() < 100.0);
        assert_eq!(missing.overall, Some(100.0));
    }

    #[test]
    fn nothing_scored_has_no_overall() {
        let r = report([SubScore::Unscored; 4]);
        assert!(r.overall.is_none());
        assert!(r.overall_rounded().is_none());
    }

    #[test]
    fn sub_score_serializes_distinctly() {
        let scored = serde_json::to_value(SubScore::Scored(0)).unwrap();
        let unscored = serde_json::to_value(SubScore::Unscored).unwrap();
        assert_eq!(scored["state"], "scored");
        assert_eq!(scored["value"], 0);
        assert_eq!(unscored["state"], "unscored");
        assert_ne!(scored, unscored);
    }

    fn arb_sub_score() -> impl Strategy<Value = SubScore> {
        prop_oneof![
            Just(SubScore::Unscored),
            (0u8..=100).prop_map(SubScore::Scored),
        ]
    }

    proptest! {
        #[test]
        fn overall_stays_within_present_bounds(
            s in arb_sub_score(),
            m in arb_sub_score(),
            d in arb_sub_score(),
            t in arb_sub_score(),
        ) {
            let r = report([s, m, d, t]);
            let present: Vec<f64> = [s, m, d, t]
                .iter()
                .filter_map(|x| x.value().map(f64::from))
                .collect();
            match r.overall {
                None => prop_assert!(present.is_empty()),
                Some(v) => {
                    let lo = present.iter().cloned().fold(f64::INFINITY, f64::min);
                    let hi = present.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
                }
            }
        }

        #[test]
        fn clamped_is_always_in_range(v in any::<i64>()) {
            let s = SubScore::clamped(v);
            prop_assert!(s.value().unwrap() <= 100);
        }
    }
}
