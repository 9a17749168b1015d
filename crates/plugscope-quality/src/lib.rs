// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quality scoring for plugscope.
//!
//! - [`QualityScorer`] computes the four category sub-scores and the
//!   renormalized overall score from a [`ScoringInput`].
//! - [`security`] holds the static pattern scan.
//! - [`recommendations`] turns findings into prioritized advice.
//! - [`render_report`] and [`parse_json_report`] render and read reports.

pub mod recommend;
pub mod report;
pub mod scorer;
pub mod security;

pub use recommend::recommendations;
pub use report::{ReportDocument, ReportFormat, parse_json_report, render_report};
pub use scorer::{QualityScorer, ScoringInput};
