// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence contract for published entities.

use async_trait::async_trait;

use crate::entity::PluginEntity;
use crate::error::PlugscopeError;

/// Upsert-only persistence keyed by identity key.
///
/// Deleting entities that disappeared from a run is the sink's business.
#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Insert or replace the entity stored under `entity.identity_key`.
    async fn upsert(&self, entity: &PluginEntity) -> Result<(), PlugscopeError>;

    /// Flush buffered writes. The default does nothing.
    async fn flush(&self) -> Result<(), PlugscopeError> {
        Ok(())
    }
}
