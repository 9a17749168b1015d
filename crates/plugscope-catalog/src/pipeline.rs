// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run orchestration.
//!
//! Sources open concurrently and their candidate streams are merged into one
//! bounded enrichment fan-out. Deduplication and scoring wait for every
//! candidate (the barrier). The run deadline cancels a token: outstanding
//! and later signal fetches degrade to `Cancelled` while the candidate
//! streams are drained, so every manifest is kept.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use plugscope_config::PlugscopeConfig;
use plugscope_core::{
    CandidateStream, PlugscopeError, PluginEntity, RawCandidate, SignalFetcher, SignalOutcome,
    SourceAdapter, SourceDescriptor, SourceKind, UnresolvableReason,
};
use plugscope_plugin::RequirementDetector;
use plugscope_quality::QualityScorer;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::{Catalog, CatalogBuilder};
use crate::dedup::Deduplicator;
use crate::enrich::{EnrichedCandidate, Enricher};
use crate::summary::{RunSummary, UnresolvedSignal};

/// The enrichment and scoring pipeline.
pub struct Pipeline {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    enricher: Enricher,
    dedup: Deduplicator,
    builder: CatalogBuilder,
    source_concurrency: usize,
    candidate_concurrency: usize,
    run_timeout: Option<Duration>,
}

impl Pipeline {
    /// Build a pipeline from validated configuration. Adapters are registered
    /// separately with [`Pipeline::with_adapter`].
    pub fn new(
        config: &PlugscopeConfig,
        signals: Arc<dyn SignalFetcher>,
    ) -> Result<Self, PlugscopeError> {
        let detector = RequirementDetector::new(&config.inspection, &config.tiers)?;
        let timeout = config.pipeline.run_timeout_secs;
        Ok(Self {
            adapters: HashMap::new(),
            enricher: Enricher::new(detector, signals),
            dedup: Deduplicator::new(config.dedup.category_policy),
            builder: CatalogBuilder::new(QualityScorer::new(config.scoring.clone())),
            source_concurrency: config.pipeline.source_concurrency.max(1),
            candidate_concurrency: config.pipeline.candidate_concurrency.max(1),
            run_timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
        })
    }

    /// Register the adapter for its source kind, replacing any earlier one.
    pub fn with_adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    /// Override the run deadline. `None` disables it.
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Run every source to a catalog. Only configuration problems fail the
    /// run; everything else lands in the catalog's summary.
    pub async fn run(&self, sources: &[SourceDescriptor]) -> Result<Catalog, PlugscopeError> {
        self.run_with_cancel(sources, CancellationToken::new()).await
    }

    /// As [`Pipeline::run`], stopping retrieval early when `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        sources: &[SourceDescriptor],
        cancel: CancellationToken,
    ) -> Result<Catalog, PlugscopeError> {
        self.validate(sources)?;

        let mut summary = RunSummary::new(sources.len());
        info!(run_id = %summary.run_id, sources = sources.len(), "run started");

        let deadline = cancel.child_token();
        let timer = self.run_timeout.map(|after| {
            let token = deadline.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                warn!(timeout_secs = after.as_secs(), "run deadline reached");
                token.cancel();
            })
        });

        let opened: Vec<(String, Result<CandidateStream, PlugscopeError>)> =
            stream::iter(sources)
                .map(|descriptor| {
                    let deadline = &deadline;
                    async move {
                        let result = self.open_source(descriptor, deadline).await;
                        (descriptor.source_id.clone(), result)
                    }
                })
                .buffer_unordered(self.source_concurrency)
                .collect()
                .await;

        let mut streams = Vec::new();
        for (source_id, result) in opened {
            match result {
                Ok(stream) => streams.push(stream),
                Err(e) => {
                    warn!(source_id = %source_id, error = %e, "source skipped");
                    summary.skip_source(source_id, e.to_string());
                }
            }
        }

        let enricher = &self.enricher;
        // Streams drain past the deadline; enrichment skips the signal fetch
        // once the token is cancelled.
        let results: Vec<Result<EnrichedCandidate, _>> = stream::select_all(streams)
            .map(|item| {
                let deadline = &deadline;
                async move {
                    match item {
                        Ok(candidate) => enricher.enrich(candidate, deadline).await,
                        Err(rejection) => Err(rejection),
                    }
                }
            })
            .buffer_unordered(self.candidate_concurrency)
            .collect()
            .await;

        summary.timed_out = deadline.is_cancelled();
        if let Some(timer) = timer {
            timer.abort();
        }

        // Barrier: every candidate has resolved.
        summary.candidates_seen = results.len();
        let mut enriched = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(candidate) => enriched.push(candidate),
                Err(rejection) => {
                    warn!(
                        source_id = %rejection.source_id,
                        candidate = %rejection.raw_id,
                        reason = %rejection.reason,
                        "candidate skipped"
                    );
                    summary.reject(rejection);
                }
            }
        }
        summary.candidates_rejected.sort_by(|a, b| {
            a.source_id
                .cmp(&b.source_id)
                .then_with(|| a.raw_id.cmp(&b.raw_id))
        });

        let entities = self.score_all(enriched);
        summary.signals_unresolved = unresolved_signals(&entities);
        summary.finish();
        let catalog = self.builder.build(entities, summary);

        info!(
            run_id = %catalog.run_id,
            entities = catalog.len(),
            rejected = catalog.summary.candidates_rejected.len(),
            skipped_sources = catalog.summary.sources_skipped.len(),
            status = %catalog.summary.outcome(),
            "run finished"
        );
        Ok(catalog)
    }

    /// Enrich and score a single candidate outside a run.
    pub async fn analyze(&self, candidate: RawCandidate) -> Result<PluginEntity, PlugscopeError> {
        let cancel = CancellationToken::new();
        let qualified = candidate.qualified_id();
        let enrich = self.enricher.enrich(candidate, &cancel);
        let enriched = match self.run_timeout {
            Some(after) => {
                let timer = {
                    let token = cancel.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        token.cancel();
                    })
                };
                let result = enrich.await;
                timer.abort();
                result
            }
            None => enrich.await,
        }?;
        debug!(candidate = %qualified, "candidate analyzed");
        self.score_all(vec![enriched])
            .into_iter()
            .next()
            .ok_or_else(|| PlugscopeError::Internal(format!("no entity built for {qualified}")))
    }

    fn validate(&self, sources: &[SourceDescriptor]) -> Result<(), PlugscopeError> {
        let mut seen = HashSet::new();
        for descriptor in sources {
            if !seen.insert(descriptor.source_id.as_str()) {
                return Err(PlugscopeError::Config(format!(
                    "duplicate source id `{}`",
                    descriptor.source_id
                )));
            }
            if !self.adapters.contains_key(&descriptor.kind) {
                return Err(PlugscopeError::Config(format!(
                    "no adapter registered for source kind `{}` (source `{}`)",
                    descriptor.kind, descriptor.source_id
                )));
            }
        }
        Ok(())
    }

    async fn open_source(
        &self,
        descriptor: &SourceDescriptor,
        deadline: &CancellationToken,
    ) -> Result<CandidateStream, PlugscopeError> {
        let adapter = self.adapters.get(&descriptor.kind).ok_or_else(|| {
            PlugscopeError::Config(format!("no adapter for `{}`", descriptor.kind))
        })?;
        debug!(source_id = %descriptor.source_id, kind = %descriptor.kind, "opening source");
        tokio::select! {
            biased;
            _ = deadline.cancelled() => Err(PlugscopeError::unavailable(
                &descriptor.source_id,
                "run deadline reached before the source opened",
            )),
            opened = adapter.open(descriptor) => opened,
        }
    }

    fn score_all(&self, enriched: Vec<EnrichedCandidate>) -> Vec<PluginEntity> {
        let as_of = Utc::now();
        self.dedup
            .dedup(enriched)
            .into_iter()
            .map(|merged| self.builder.entity(merged, as_of))
            .collect()
    }
}

/// Entities with a repository whose signals could not be fetched.
fn unresolved_signals(entities: &[PluginEntity]) -> Vec<UnresolvedSignal> {
    entities
        .iter()
        .filter_map(|entity| match &entity.signals {
            SignalOutcome::Unresolvable { reason } if *reason != UnresolvableReason::NoRepository => {
                Some(UnresolvedSignal {
                    slug: entity.slug.clone(),
                    repository: entity.manifest.repository.clone().unwrap_or_default(),
                    reason: reason.clone(),
                })
            }
            _ => None,
        })
        .collect()
}
