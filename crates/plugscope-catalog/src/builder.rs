// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring of merged candidates and assembly of the final catalog.

use chrono::{DateTime, Utc};
use plugscope_core::{CatalogSink, PluginEntity};
use plugscope_quality::{QualityScorer, ScoringInput};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dedup::MergedCandidate;
use crate::summary::RunSummary;

/// The frozen result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Sorted by slug, then identity key.
    pub entities: Vec<PluginEntity>,
    pub summary: RunSummary,
}

/// One entity the sink refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishFailure {
    pub identity_key: String,
    pub slug: String,
    pub error: String,
}

/// What a sink accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    pub upserted: usize,
    pub failed: Vec<PublishFailure>,
    pub flush_error: Option<String>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.flush_error.is_none()
    }
}

impl Catalog {
    pub fn get(&self, key_or_slug: &str) -> Option<&PluginEntity> {
        self.entities
            .iter()
            .find(|e| e.identity_key == key_or_slug || e.slug == key_or_slug)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Upsert every entity. A refused entity is logged and reported; the rest
    /// are still written.
    pub async fn publish(&self, sink: &dyn CatalogSink) -> PublishReport {
        let mut report = PublishReport::default();
        for entity in &self.entities {
            match sink.upsert(entity).await {
                Ok(()) => report.upserted += 1,
                Err(e) => {
                    warn!(slug = %entity.slug, error = %e, "upsert failed");
                    report.failed.push(PublishFailure {
                        identity_key: entity.identity_key.clone(),
                        slug: entity.slug.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        if let Err(e) = sink.flush().await {
            warn!(error = %e, "sink flush failed");
            report.flush_error = Some(e.to_string());
        }
        info!(
            run_id = %self.run_id,
            upserted = report.upserted,
            failed = report.failed.len(),
            "catalog published"
        );
        report
    }
}

/// Turns merged candidates into scored entities and entities into a catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    scorer: QualityScorer,
}

impl CatalogBuilder {
    pub fn new(scorer: QualityScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Score a merged candidate, measuring recency against `as_of`.
    pub fn entity(&self, merged: MergedCandidate, as_of: DateTime<Utc>) -> PluginEntity {
        let quality = self.scorer.score(&ScoringInput {
            manifest: &merged.manifest,
            inventory: &merged.inventory,
            signals: &merged.signals,
            requirements: &merged.requirements,
            file_tree: merged.file_tree.as_ref(),
            file_contents: &merged.file_contents,
            as_of,
        });
        PluginEntity {
            identity_key: merged.key.into_string(),
            slug: merged.slug,
            confidence: merged.confidence,
            manifest: merged.manifest,
            category: merged.category,
            field_sources: merged.field_sources,
            provenance: merged.provenance,
            inventory: merged.inventory,
            signals: merged.signals,
            requirements: merged.requirements,
            quality,
        }
    }

    pub fn build(&self, mut entities: Vec<PluginEntity>, mut summary: RunSummary) -> Catalog {
        entities.sort_by(|a, b| {
            a.slug
                .cmp(&b.slug)
                .then_with(|| a.identity_key.cmp(&b.identity_key))
        });
        summary.entities = entities.len();
        if summary.finished_at.is_none() {
            summary.finish();
        }
        Catalog {
            run_id: summary.run_id,
            generated_at: summary.finished_at.unwrap_or_else(Utc::now),
            entities,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_core::SubScore;
    use plugscope_test_utils::{MemorySink, entity_fixture};

    #[test]
    fn build_sorts_entities_and_counts_them() {
        let builder = CatalogBuilder::default();
        let catalog = builder.build(
            vec![
                entity_fixture("zeta", None),
                entity_fixture("alpha", Some("https://github.com/o/alpha")),
            ],
            RunSummary::new(1),
        );
        let slugs: Vec<_> = catalog.entities.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, ["alpha", "zeta"]);
        assert_eq!(catalog.summary.entities, 2);
        assert_eq!(catalog.run_id, catalog.summary.run_id);
        assert!(catalog.get("zeta").is_some());
    }

    #[tokio::test]
    async fn publish_continues_after_a_refused_entity() {
        let catalog = CatalogBuilder::default().build(
            vec![
                entity_fixture("alpha", None),
                entity_fixture("broken", None),
                entity_fixture("gamma", None),
            ],
            RunSummary::new(1),
        );
        let sink = MemorySink::failing_on("broken");
        let report = catalog.publish(&sink).await;
        assert_eq!(report.upserted, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].slug, "broken");
        assert!(!report.is_clean());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn entity_carries_a_scored_report() {
        use crate::dedup::Deduplicator;
        use crate::enrich::EnrichedCandidate;
        use plugscope_config::{InspectionConfig, TierConfig};
        use plugscope_core::{SignalOutcome, UnresolvableReason};
        use plugscope_plugin::RequirementDetector;
        use plugscope_test_utils::CandidateBuilder;

        let detector =
            RequirementDetector::new(&InspectionConfig::default(), &TierConfig::default()).unwrap();
        let enriched = EnrichedCandidate::offline(
            CandidateBuilder::new("a", "0")
                .name("docs-helper")
                .description("Keeps the project documentation tidy and current")
                .files(["README.md", "tests/test_docs.py"])
                .build(),
            &detector,
            SignalOutcome::unresolvable(UnresolvableReason::NoRepository),
        )
        .unwrap();
        let merged = Deduplicator::default().dedup(vec![enriched]).remove(0);
        let entity = CatalogBuilder::default().entity(merged, Utc::now());
        assert_eq!(entity.slug, "docs-helper");
        assert_eq!(entity.quality.maintenance.score, SubScore::Unscored);
        assert!(entity.quality.overall.is_some());
    }
}
