// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapter trait. One implementation per [`SourceKind`].

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use serde::{Deserialize, Serialize};

use crate::error::PlugscopeError;
use crate::types::{RawCandidate, SourceDescriptor, SourceKind};

/// A single malformed entry of an otherwise readable source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRejection {
    pub source_id: String,
    pub raw_id: String,
    pub reason: String,
}

impl CandidateRejection {
    pub fn new(
        source_id: impl Into<String>,
        raw_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            raw_id: raw_id.into(),
            reason: reason.into(),
        }
    }

    /// Rejection for a candidate whose manifest failed to parse.
    pub fn from_error(candidate: &RawCandidate, err: &PlugscopeError) -> Self {
        let reason = match err {
            PlugscopeError::CandidateInvalid { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self::new(&candidate.origin.source_id, &candidate.raw_id, reason)
    }
}

impl fmt::Display for CandidateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.source_id, self.raw_id, self.reason)
    }
}

impl From<CandidateRejection> for PlugscopeError {
    fn from(r: CandidateRejection) -> Self {
        PlugscopeError::invalid(format!("{}:{}", r.source_id, r.raw_id), r.reason)
    }
}

/// Lazy sequence of candidates. Dropping it stops retrieval.
pub type CandidateStream =
    Pin<Box<dyn Stream<Item = Result<RawCandidate, CandidateRejection>> + Send>>;

/// Reads one source schema and yields raw candidates.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// The source kind this adapter handles.
    fn kind(&self) -> SourceKind;

    /// Open the source. Fails with `SourceUnavailable` when the top-level
    /// listing cannot be fetched or parsed; per-entry problems are yielded
    /// as rejections inside the stream.
    async fn open(&self, descriptor: &SourceDescriptor) -> Result<CandidateStream, PlugscopeError>;
}
