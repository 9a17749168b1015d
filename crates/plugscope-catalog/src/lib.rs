// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution, deduplication, scoring and catalog assembly.
//!
//! [`Pipeline`] drives a run: sources stream raw candidates, each candidate
//! is enriched independently, and once every candidate has resolved the
//! [`Deduplicator`] merges them and the [`CatalogBuilder`] scores the merged
//! entities into a [`Catalog`] carrying a [`RunSummary`].

pub mod builder;
pub mod dedup;
pub mod enrich;
pub mod identity;
pub mod pipeline;
pub mod summary;

pub use builder::{Catalog, CatalogBuilder, PublishFailure, PublishReport};
pub use dedup::{CandidateGroup, Deduplicator, MergedCandidate};
pub use enrich::{EnrichedCandidate, Enricher};
pub use identity::{IdentityKey, identity_key, normalize_repository};
pub use pipeline::Pipeline;
pub use summary::{RunStatus, RunSummary, SkippedSource, UnresolvedSignal};
