// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::types::SignalOutcome;

/// Fetches repository activity for a repository URL.
///
/// Implementations never fail: every problem (unsupported host, private
/// repository, exhausted retries) degrades to `SignalOutcome::Unresolvable`.
/// Must be safe to call concurrently.
#[async_trait]
pub trait SignalFetcher: Send + Sync {
    async fn fetch(&self, repository_url: &str) -> SignalOutcome;
}
