// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run diagnostics: what was skipped and why.

use chrono::{DateTime, Utc};
use plugscope_core::{CandidateRejection, UnresolvableReason};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RunStatus {
    /// Every source was read.
    Complete,
    /// Some sources were skipped, or the run deadline cut retrieval short.
    Partial,
    /// No source could be read.
    Failed,
}

impl RunStatus {
    /// Process exit code for the status.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Complete => 0,
            Self::Partial => 3,
            Self::Failed => 4,
        }
    }
}

/// A source that was skipped for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    pub source_id: String,
    pub reason: String,
}

/// An entity whose repository signals could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedSignal {
    pub slug: String,
    pub repository: String,
    pub reason: UnresolvableReason,
}

/// Counts and identifiers of everything skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub sources_total: usize,
    pub sources_skipped: Vec<SkippedSource>,
    pub candidates_seen: usize,
    pub candidates_rejected: Vec<CandidateRejection>,
    pub signals_unresolved: Vec<UnresolvedSignal>,
    pub entities: usize,
    /// The run deadline passed before retrieval finished.
    pub timed_out: bool,
}

impl RunSummary {
    pub fn new(sources_total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            sources_total,
            sources_skipped: Vec::new(),
            candidates_seen: 0,
            candidates_rejected: Vec::new(),
            signals_unresolved: Vec::new(),
            entities: 0,
            timed_out: false,
        }
    }

    pub fn skip_source(&mut self, source_id: impl Into<String>, reason: impl Into<String>) {
        self.sources_skipped.push(SkippedSource {
            source_id: source_id.into(),
            reason: reason.into(),
        });
    }

    pub fn reject(&mut self, rejection: CandidateRejection) {
        self.candidates_rejected.push(rejection);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Complete when every source was read before the deadline; failed when
    /// none was; partial otherwise. Rejected candidates and unresolved
    /// signals are diagnostics, not failures.
    pub fn outcome(&self) -> RunStatus {
        if self.sources_total > 0 && self.sources_skipped.len() >= self.sources_total {
            RunStatus::Failed
        } else if !self.sources_skipped.is_empty() || self.timed_out {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        }
    }

    /// One line per skipped item, for terminal output.
    pub fn diagnostics(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for s in &self.sources_skipped {
            lines.push(format!("source `{}` skipped: {}", s.source_id, s.reason));
        }
        for r in &self.candidates_rejected {
            lines.push(format!("candidate `{}:{}` skipped: {}", r.source_id, r.raw_id, r.reason));
        }
        for u in &self.signals_unresolved {
            lines.push(format!(
                "signals for `{}` ({}) unresolved: {}",
                u.slug, u.repository, u.reason
            ));
        }
        if self.timed_out {
            lines.push("run deadline reached; results are partial".to_string());
        }
        lines
    }
}
