// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub integration for plugscope.
//!
//! Provides the API client with retry and backoff, the per-provider rate
//! budget, repository URL parsing, and the repository signal fetcher.

pub mod budget;
pub mod client;
pub mod repo_url;
pub mod signals;
pub mod types;

pub use budget::ProviderBudget;
pub use client::{ApiError, GithubClient, provider_for};
pub use repo_url::{RepoRef, parse_github_url, parse_raw_url};
pub use signals::GithubSignalFetcher;
