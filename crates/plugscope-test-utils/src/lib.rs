// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for plugscope integration tests.
//!
//! Provides fakes for every pipeline seam and fixture builders for fast,
//! deterministic, CI-runnable tests without network access.
//!
//! # Components
//!
//! - [`RecordingBudget`] - rate budget that records acquisitions
//! - [`StaticSignalFetcher`] - signal fetcher answering from a table
//! - [`MemorySink`] - in-memory catalog sink
//! - [`StaticSource`] - source adapter replaying fixed candidates
//! - [`CandidateBuilder`] / [`entity_fixture`] - fixtures

pub mod fakes;
pub mod fixtures;

pub use fakes::{MemorySink, RecordingBudget, StaticSignalFetcher, StaticSource};
pub use fixtures::{CandidateBuilder, entity_fixture};
