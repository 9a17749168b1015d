// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-provider request budget: a counting semaphore bounds in-flight
//! requests and a fixed window bounds the total per time period.
//!
//! Emits a `tracing::warn` when a window passes 80% of its allowance and
//! denies requests once it is exhausted or the provider reported its own
//! limit as exhausted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use plugscope_config::model::BudgetConfig;
use plugscope_core::{BudgetDenied, BudgetPermit, RateBudget};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Fraction of the window allowance at which a warning is logged.
const WARN_FRACTION: f64 = 0.8;

struct Window {
    started: Instant,
    used: u32,
    warned: bool,
    blocked_until: Option<Instant>,
}

struct ProviderState {
    in_flight: Arc<Semaphore>,
    window: Mutex<Window>,
}

/// Shared rate budget for every hosting provider plugscope talks to.
pub struct ProviderBudget {
    max_in_flight: usize,
    per_window: u32,
    window: Duration,
    providers: Mutex<HashMap<String, Arc<ProviderState>>>,
}

impl ProviderBudget {
    pub fn new(max_in_flight: usize, per_window: u32, window: Duration) -> Self {
        Self {
            max_in_flight: max_in_flight.max(1),
            per_window: per_window.max(1),
            window,
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Budget sized for authenticated or anonymous access.
    pub fn from_config(config: &BudgetConfig, authenticated: bool) -> Self {
        let per_window = if authenticated {
            config.authenticated_per_window
        } else {
            config.anonymous_per_window
        };
        Self::new(
            config.max_in_flight,
            per_window,
            Duration::from_secs(config.window_secs),
        )
    }

    fn state(&self, provider: &str) -> Arc<ProviderState> {
        let mut providers = self.providers.lock().unwrap_or_else(|e| e.into_inner());
        providers
            .entry(provider.to_string())
            .or_insert_with(|| {
                Arc::new(ProviderState {
                    in_flight: Arc::new(Semaphore::new(self.max_in_flight)),
                    window: Mutex::new(Window {
                        started: Instant::now(),
                        used: 0,
                        warned: false,
                        blocked_until: None,
                    }),
                })
            })
            .clone()
    }

    /// Requests charged to the current window of `provider`.
    pub fn used(&self, provider: &str) -> u32 {
        let state = self.state(provider);
        let window = state.window.lock().unwrap_or_else(|e| e.into_inner());
        window.used
    }

    fn charge(&self, provider: &str, state: &ProviderState) -> Result<(), BudgetDenied> {
        let now = Instant::now();
        let mut window = state.window.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(until) = window.blocked_until {
            if until > now {
                return Err(BudgetDenied {
                    provider: provider.to_string(),
                    retry_after: Some(until - now),
                });
            }
            window.blocked_until = None;
        }

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.used = 0;
            window.warned = false;
        }

        if window.used >= self.per_window {
            let reset = (window.started + self.window).saturating_duration_since(now);
            return Err(BudgetDenied {
                provider: provider.to_string(),
                retry_after: Some(reset),
            });
        }

        window.used += 1;
        let threshold = (f64::from(self.per_window) * WARN_FRACTION).ceil() as u32;
        if !window.warned && window.used >= threshold {
            window.warned = true;
            warn!(
                provider,
                used = window.used,
                limit = self.per_window,
                "request budget at 80% for this window"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl RateBudget for ProviderBudget {
    async fn acquire(&self, provider: &str) -> Result<BudgetPermit, BudgetDenied> {
        let state = self.state(provider);
        self.charge(provider, &state)?;
        let slot = state
            .in_flight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| BudgetDenied {
                provider: provider.to_string(),
                retry_after: None,
            })?;
        debug!(provider, "budget permit acquired");
        Ok(BudgetPermit::new(slot))
    }

    fn mark_exhausted(&self, provider: &str, reset_after: Duration) {
        let state = self.state(provider);
        let mut window = state.window.lock().unwrap_or_else(|e| e.into_inner());
        let until = Instant::now() + reset_after;
        if window.blocked_until.is_none_or(|current| current < until) {
            window.blocked_until = Some(until);
        }
        warn!(provider, reset_after = ?reset_after, "provider reported rate limit exhausted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn window_allowance_is_enforced() {
        let budget = ProviderBudget::new(4, 2, Duration::from_secs(60));
        let _a = budget.acquire("api.github.com").await.unwrap();
        let _b = budget.acquire("api.github.com").await.unwrap();
        let denied = budget.acquire("api.github.com").await.unwrap_err();
        assert_eq!(denied.provider, "api.github.com");
        assert!(denied.retry_after.is_some());
        // Other providers have their own window.
        assert!(budget.acquire("raw.githubusercontent.com").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn window_resets_after_period() {
        let budget = ProviderBudget::new(4, 1, Duration::from_secs(10));
        drop(budget.acquire("p").await.unwrap());
        assert!(budget.acquire("p").await.is_err());
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(budget.acquire("p").await.is_ok());
        assert_eq!(budget.used("p"), 1);
    }

    #[tokio::test]
    async fn in_flight_requests_are_bounded() {
        let budget = Arc::new(ProviderBudget::new(1, 100, Duration::from_secs(60)));
        let held = budget.acquire("p").await.unwrap();

        let b = budget.clone();
        let waiter = tokio::spawn(async move { b.acquire("p").await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished(), "second request must wait for the slot");

        drop(held);
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn provider_exhaustion_blocks_until_reset() {
        let budget = ProviderBudget::new(4, 100, Duration::from_secs(3600));
        budget.mark_exhausted("p", Duration::from_secs(30));
        let denied = budget.acquire("p").await.unwrap_err();
        assert!(denied.retry_after.unwrap() <= Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(budget.acquire("p").await.is_ok());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn warns_at_eighty_percent() {
        let budget = ProviderBudget::new(4, 5, Duration::from_secs(60));
        for _ in 0..4 {
            drop(budget.acquire("p").await.unwrap());
        }
        assert!(logs_contain("request budget at 80%"));
    }
}
