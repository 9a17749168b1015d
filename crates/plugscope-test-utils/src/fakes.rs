// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory fakes for the pipeline seams.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use plugscope_core::{
    BudgetDenied, BudgetPermit, CandidateRejection, CandidateStream, CatalogSink, PlugscopeError,
    PluginEntity, RateBudget, RawCandidate, SignalFetcher, SignalOutcome, SourceAdapter,
    SourceDescriptor, SourceKind, UnresolvableReason,
};

/// Rate budget that records every acquisition and optionally denies after a
/// fixed number of permits per provider.
#[derive(Debug, Default)]
pub struct RecordingBudget {
    limit: Option<u32>,
    acquired: Mutex<HashMap<String, u32>>,
    exhausted: Mutex<Vec<(String, Duration)>>,
}

impl RecordingBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny every request past `limit` per provider.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn acquired(&self, provider: &str) -> u32 {
        self.acquired
            .lock()
            .unwrap()
            .get(provider)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_acquired(&self) -> u32 {
        self.acquired.lock().unwrap().values().sum()
    }

    /// Providers reported as exhausted via `mark_exhausted`, in call order.
    pub fn exhausted(&self) -> Vec<(String, Duration)> {
        self.exhausted.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateBudget for RecordingBudget {
    async fn acquire(&self, provider: &str) -> Result<BudgetPermit, BudgetDenied> {
        let mut acquired = self.acquired.lock().unwrap();
        let count = acquired.entry(provider.to_string()).or_insert(0);
        if self.limit.is_some_and(|limit| *count >= limit) {
            return Err(BudgetDenied {
                provider: provider.to_string(),
                retry_after: None,
            });
        }
        *count += 1;
        Ok(BudgetPermit::unbounded())
    }

    fn mark_exhausted(&self, provider: &str, reset_after: Duration) {
        self.exhausted
            .lock()
            .unwrap()
            .push((provider.to_string(), reset_after));
    }
}

/// Signal fetcher answering from a fixed table.
///
/// Unknown URLs resolve to `Unresolvable(NotFound)`, empty URLs to
/// `Unresolvable(NoRepository)`. An optional delay simulates slow providers.
#[derive(Debug, Default)]
pub struct StaticSignalFetcher {
    outcomes: HashMap<String, SignalOutcome>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl StaticSignalFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, outcome: SignalOutcome) -> Self {
        self.outcomes.insert(url.into(), outcome);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignalFetcher for StaticSignalFetcher {
    async fn fetch(&self, repository_url: &str) -> SignalOutcome {
        self.calls.lock().unwrap().push(repository_url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if repository_url.trim().is_empty() {
            return SignalOutcome::unresolvable(UnresolvableReason::NoRepository);
        }
        self.outcomes
            .get(repository_url)
            .cloned()
            .unwrap_or_else(|| SignalOutcome::unresolvable(UnresolvableReason::NotFound))
    }
}

/// Catalog sink keeping entities in a map keyed by identity key.
#[derive(Debug, Default)]
pub struct MemorySink {
    entities: Mutex<BTreeMap<String, PluginEntity>>,
    upserts: Mutex<u32>,
    failing_slugs: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail upserts of entities with the given slug.
    pub fn failing_on(slug: impl Into<String>) -> Self {
        Self {
            failing_slugs: vec![slug.into()],
            ..Self::default()
        }
    }

    pub fn entities(&self) -> Vec<PluginEntity> {
        self.entities.lock().unwrap().values().cloned().collect()
    }

    pub fn get(&self, identity_key: &str) -> Option<PluginEntity> {
        self.entities.lock().unwrap().get(identity_key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn upsert_count(&self) -> u32 {
        *self.upserts.lock().unwrap()
    }
}

#[async_trait]
impl CatalogSink for MemorySink {
    async fn upsert(&self, entity: &PluginEntity) -> Result<(), PlugscopeError> {
        if self.failing_slugs.contains(&entity.slug) {
            return Err(PlugscopeError::Storage {
                source: format!("refusing to store `{}`", entity.slug).into(),
            });
        }
        *self.upserts.lock().unwrap() += 1;
        self.entities
            .lock()
            .unwrap()
            .insert(entity.identity_key.clone(), entity.clone());
        Ok(())
    }
}

/// Source adapter that replays a fixed list of items, or fails to open.
#[derive(Debug, Clone)]
pub struct StaticSource {
    kind: SourceKind,
    items: Vec<Result<RawCandidate, CandidateRejection>>,
    unavailable: Option<String>,
}

impl StaticSource {
    pub fn new(items: Vec<Result<RawCandidate, CandidateRejection>>) -> Self {
        Self {
            kind: SourceKind::ManifestIndex,
            items,
            unavailable: None,
        }
    }

    pub fn candidates(candidates: Vec<RawCandidate>) -> Self {
        Self::new(candidates.into_iter().map(Ok).collect())
    }

    /// Serve a different source kind.
    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    /// An adapter whose `open` always fails with `SourceUnavailable`.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::ManifestIndex,
            items: Vec::new(),
            unavailable: Some(message.into()),
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn open(&self, descriptor: &SourceDescriptor) -> Result<CandidateStream, PlugscopeError> {
        if let Some(message) = &self.unavailable {
            return Err(PlugscopeError::unavailable(&descriptor.source_id, message));
        }
        Ok(Box::pin(futures::stream::iter(self.items.clone())))
    }
}
