// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-limit budget shared by every signal fetch against one provider.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OwnedSemaphorePermit;

/// Held for the duration of one outbound request. Dropping it releases the
/// in-flight slot.
#[derive(Debug, Default)]
pub struct BudgetPermit {
    _slot: Option<OwnedSemaphorePermit>,
}

impl BudgetPermit {
    pub fn new(slot: OwnedSemaphorePermit) -> Self {
        Self { _slot: Some(slot) }
    }

    /// A permit that holds no slot (used by fakes and unlimited budgets).
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// The budget refused a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rate budget for `{provider}` exhausted")]
pub struct BudgetDenied {
    pub provider: String,
    /// How long until the window resets, when known.
    pub retry_after: Option<Duration>,
}

/// Bounds concurrent and per-window requests to a hosting provider.
///
/// Passed explicitly to every fetcher so tests can inject a fake.
#[async_trait]
pub trait RateBudget: Send + Sync {
    /// Wait for an in-flight slot and charge one request to the window.
    async fn acquire(&self, provider: &str) -> Result<BudgetPermit, BudgetDenied>;

    /// Record that the provider reported its own limit as exhausted.
    fn mark_exhausted(&self, provider: &str, reset_after: Duration);
}
