// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the plugscope enrichment pipeline.

use thiserror::Error;

use crate::types::UnresolvableReason;

/// The primary error type used across all plugscope crates.
///
/// The pipeline distinguishes fatal errors (`Config`) from per-item failures
/// (`SourceUnavailable`, `CandidateInvalid`, `SignalUnresolvable`) which are
/// collected into the run summary instead of aborting the run.
#[derive(Debug, Error)]
pub enum PlugscopeError {
    /// Configuration errors (bad credentials format, unknown source kind, invalid thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// A whole source could not be reached or its top-level listing could not be parsed.
    #[error("source `{source_id}` unavailable: {message}")]
    SourceUnavailable {
        source_id: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single entry of an otherwise readable source is malformed.
    #[error("candidate `{raw_id}` invalid: {reason}")]
    CandidateInvalid { raw_id: String, reason: String },

    /// Repository signals could not be obtained for a repository URL.
    #[error("signals for `{repository}` unresolvable: {reason}")]
    SignalUnresolvable {
        repository: String,
        reason: UnresolvableReason,
    },

    /// HTTP transport or hosting API errors.
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PlugscopeError {
    /// Shorthand for a `CandidateInvalid` error.
    pub fn invalid(raw_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CandidateInvalid {
            raw_id: raw_id.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `SourceUnavailable` error without an underlying cause.
    pub fn unavailable(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// True for errors that must abort a run before any fetch happens.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
