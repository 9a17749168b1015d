// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-candidate enrichment: manifest parsing, inventory, requirement
//! detection and repository signals.

use std::sync::Arc;

use plugscope_core::{
    CandidateRejection, ComponentInventory, ParsedManifest, RawCandidate, RequirementProfile,
    SignalFetcher, SignalOutcome, UnresolvableReason,
};
use plugscope_plugin::{RequirementDetector, inventory_for, parse_manifest};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A candidate with everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCandidate {
    pub candidate: RawCandidate,
    pub manifest: ParsedManifest,
    pub inventory: ComponentInventory,
    pub requirements: RequirementProfile,
    pub signals: SignalOutcome,
}

impl EnrichedCandidate {
    /// Assemble an enriched candidate without fetching signals.
    pub fn offline(
        candidate: RawCandidate,
        detector: &RequirementDetector,
        signals: SignalOutcome,
    ) -> Result<Self, CandidateRejection> {
        let manifest =
            parse_manifest(&candidate).map_err(|e| CandidateRejection::from_error(&candidate, &e))?;
        let inventory = inventory_for(&candidate);
        let requirements = detector.detect(&candidate, &inventory);
        Ok(Self {
            candidate,
            manifest,
            inventory,
            requirements,
            signals,
        })
    }
}

/// Runs the per-candidate analyses.
#[derive(Clone)]
pub struct Enricher {
    detector: RequirementDetector,
    signals: Arc<dyn SignalFetcher>,
}

impl Enricher {
    pub fn new(detector: RequirementDetector, signals: Arc<dyn SignalFetcher>) -> Self {
        Self { detector, signals }
    }

    pub fn detector(&self) -> &RequirementDetector {
        &self.detector
    }

    /// Signals for a repository URL, or `Cancelled` once `cancel` fires.
    pub async fn fetch_signals(
        &self,
        repository: Option<&str>,
        cancel: &CancellationToken,
    ) -> SignalOutcome {
        let Some(url) = repository else {
            return SignalOutcome::unresolvable(UnresolvableReason::NoRepository);
        };
        if cancel.is_cancelled() {
            return SignalOutcome::unresolvable(UnresolvableReason::Cancelled);
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(repository = %url, "signal fetch cancelled by run deadline");
                SignalOutcome::unresolvable(UnresolvableReason::Cancelled)
            }
            outcome = self.signals.fetch(url) => outcome,
        }
    }

    /// Parse a candidate, then run detection and the signal fetch side by side.
    pub async fn enrich(
        &self,
        candidate: RawCandidate,
        cancel: &CancellationToken,
    ) -> Result<EnrichedCandidate, CandidateRejection> {
        let manifest =
            parse_manifest(&candidate).map_err(|e| CandidateRejection::from_error(&candidate, &e))?;

        let detection = async {
            let inventory = inventory_for(&candidate);
            let requirements = self.detector.detect(&candidate, &inventory);
            (inventory, requirements)
        };
        let (signals, (inventory, requirements)) = tokio::join!(
            self.fetch_signals(manifest.repository.as_deref(), cancel),
            detection
        );

        Ok(EnrichedCandidate {
            candidate,
            manifest,
            inventory,
            requirements,
            signals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_config::{InspectionConfig, TierConfig};
    use plugscope_core::{RepositorySignals, ServiceTier};
    use plugscope_test_utils::{CandidateBuilder, StaticSignalFetcher};
    use std::time::Duration;

    fn detector() -> RequirementDetector {
        RequirementDetector::new(&InspectionConfig::default(), &TierConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn enriches_parsed_candidate() {
        let fetcher = StaticSignalFetcher::new().with(
            "https://github.com/o/p",
            SignalOutcome::resolved(RepositorySignals {
                stars: Some(3),
                ..Default::default()
            }),
        );
        let enricher = Enricher::new(detector(), Arc::new(fetcher));
        let candidate = CandidateBuilder::new("official", "0")
            .name("p")
            .repository("https://github.com/o/p")
            .files(["agents/a.md", "agents/b.md", "agents/c.md"])
            .build();
        let enriched = enricher
            .enrich(candidate, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(enriched.inventory.agents, 3);
        assert_eq!(enriched.requirements.tier, ServiceTier::Elevated);
        assert!(enriched.signals.is_resolved());
    }

    #[tokio::test]
    async fn blank_name_is_rejected_with_raw_id() {
        let enricher = Enricher::new(detector(), Arc::new(StaticSignalFetcher::new()));
        let candidate = CandidateBuilder::new("community", "17").name("   ").build();
        let rejection = enricher
            .enrich(candidate, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(rejection.source_id, "community");
        assert_eq!(rejection.raw_id, "17");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_degrades_signals() {
        let fetcher = StaticSignalFetcher::new().with_delay(Duration::from_secs(60));
        let enricher = Enricher::new(detector(), Arc::new(fetcher));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });
        let outcome = enricher
            .fetch_signals(Some("https://github.com/o/slow"), &cancel)
            .await;
        assert_eq!(
            outcome,
            SignalOutcome::unresolvable(UnresolvableReason::Cancelled)
        );
    }

    #[tokio::test]
    async fn missing_repository_skips_fetch() {
        let fetcher = Arc::new(StaticSignalFetcher::new());
        let enricher = Enricher::new(detector(), fetcher.clone());
        let outcome = enricher.fetch_signals(None, &CancellationToken::new()).await;
        assert_eq!(
            outcome,
            SignalOutcome::unresolvable(UnresolvableReason::NoRepository)
        );
        assert!(fetcher.calls().is_empty());
    }
}
