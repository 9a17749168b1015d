// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the plugscope catalog pipeline.
//!
//! This crate provides the error type, the data model shared by every stage
//! and the traits at the pipeline seams (source adapters, signal fetchers,
//! the rate budget and catalog sinks).

pub mod entity;
pub mod error;
pub mod quality;
pub mod traits;
pub mod types;

pub use entity::{MergeConfidence, PluginEntity, Provenance};
pub use error::PlugscopeError;
pub use quality::{
    CategoryReport, Finding, MaintenanceStatus, Priority, QualityReport, Recommendation,
    ScoreCategory, ScoreWeights, Severity, SubScore,
};
pub use types::{
    Author, CandidateOrigin, ComponentInventory, FileTree, ParsedManifest, RawCandidate,
    RepositorySignals, RequirementProfile, ServiceTier, SignalOutcome, SourceDescriptor,
    SourceKind, UNKNOWN_VERSION, UnresolvableReason, MCP_DESCRIPTOR, count_mcp_servers,
};

pub use traits::{
    BudgetDenied, BudgetPermit, CandidateRejection, CandidateStream, CatalogSink, RateBudget,
    SignalFetcher, SourceAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugscope_error_has_all_variants() {
        let _config = PlugscopeError::Config("test".into());
        let _unavailable = PlugscopeError::unavailable("official", "dns failure");
        let _invalid = PlugscopeError::invalid("official:3", "missing name");
        let _signals = PlugscopeError::SignalUnresolvable {
            repository: "https://example.org/x".into(),
            reason: UnresolvableReason::UnsupportedHost,
        };
        let _http = PlugscopeError::Http {
            message: "test".into(),
            source: None,
        };
        let _storage = PlugscopeError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _timeout = PlugscopeError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = PlugscopeError::Internal("test".into());
    }

    #[test]
    fn only_config_errors_are_fatal() {
        assert!(PlugscopeError::Config("bad".into()).is_fatal());
        assert!(!PlugscopeError::unavailable("s", "down").is_fatal());
        assert!(!PlugscopeError::invalid("s:1", "bad").is_fatal());
    }

    #[test]
    fn rejection_converts_to_candidate_invalid() {
        let err: PlugscopeError = CandidateRejection::new("community", "17", "not an object").into();
        assert!(matches!(
            err,
            PlugscopeError::CandidateInvalid { ref raw_id, .. } if raw_id == "community:17"
        ));
    }

    #[test]
    fn descriptor_deserializes_with_defaults() {
        let d: SourceDescriptor = serde_json::from_str(
            r#"{"source_id":"official","kind":"manifest-index","fetch_location":"./m.json"}"#,
        )
        .unwrap();
        assert!(!d.is_canonical);
        assert_eq!(d.priority, 0);
        assert_eq!(d.kind, SourceKind::ManifestIndex);
    }

    #[test]
    fn descriptor_rejects_unknown_kind() {
        let result: Result<SourceDescriptor, _> = serde_json::from_str(
            r#"{"source_id":"x","kind":"rss-feed","fetch_location":"./m.json"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _source(_: &dyn SourceAdapter) {}
        fn _signals(_: &dyn SignalFetcher) {}
        fn _budget(_: &dyn RateBudget) {}
        fn _sink(_: &dyn CatalogSink) {}
    }
}
