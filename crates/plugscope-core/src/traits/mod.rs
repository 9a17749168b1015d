// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams of the pipeline.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod budget;
pub mod signals;
pub mod sink;
pub mod source;

pub use budget::{BudgetDenied, BudgetPermit, RateBudget};
pub use signals::SignalFetcher;
pub use sink::CatalogSink;
pub use source::{CandidateRejection, CandidateStream, SourceAdapter};
