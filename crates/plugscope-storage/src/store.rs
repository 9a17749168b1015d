// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`CatalogSink`] trait plus read queries.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use tracing::debug;

use plugscope_config::model::StorageConfig;
use plugscope_core::{CatalogSink, PlugscopeError, PluginEntity};

use crate::database::{Database, map_tr_err};

/// Listing row of a stored plugin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPlugin {
    pub identity_key: String,
    pub slug: String,
    pub name: String,
    pub version: String,
    pub category: String,
    pub tier: String,
    pub overall: Option<f64>,
    pub sources: Vec<String>,
    pub updated_at: String,
}

/// SQLite-backed catalog store.
///
/// Upserts replace the stored entity under its identity key and keep the
/// `first_seen_at` timestamp of the original insert.
pub struct SqliteCatalog {
    db: Database,
}

impl SqliteCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database named by the storage configuration.
    pub async fn open(config: &StorageConfig) -> Result<Self, PlugscopeError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "catalog store opened");
        Ok(Self::new(db))
    }

    /// Look up an entity by identity key or slug.
    pub async fn get(&self, key_or_slug: &str) -> Result<Option<PluginEntity>, PlugscopeError> {
        let key = key_or_slug.to_string();
        let payload = self
            .db
            .connection()
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row(
                    "SELECT payload FROM plugins
                     WHERE identity_key = ?1 OR slug = ?1
                     ORDER BY identity_key = ?1 DESC, updated_at DESC
                     LIMIT 1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        payload.map(|p| decode(&p)).transpose()
    }

    /// All stored plugins, ordered by slug.
    pub async fn list(&self) -> Result<Vec<StoredPlugin>, PlugscopeError> {
        let rows = self
            .db
            .connection()
            .call(|conn| -> Result<Vec<(StoredPlugin, String)>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT identity_key, slug, name, version, category, tier, overall,
                            sources, updated_at
                     FROM plugins ORDER BY slug, identity_key",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        StoredPlugin {
                            identity_key: row.get(0)?,
                            slug: row.get(1)?,
                            name: row.get(2)?,
                            version: row.get(3)?,
                            category: row.get(4)?,
                            tier: row.get(5)?,
                            overall: row.get(6)?,
                            sources: Vec::new(),
                            updated_at: row.get(8)?,
                        },
                        row.get::<_, String>(7)?,
                    ))
                })?;
                rows.collect()
            })
            .await
            .map_err(map_tr_err)?;

        rows.into_iter()
            .map(|(mut plugin, sources)| {
                plugin.sources = serde_json::from_str(&sources).map_err(|e| {
                    PlugscopeError::Storage {
                        source: Box::new(e),
                    }
                })?;
                Ok(plugin)
            })
            .collect()
    }

    pub async fn count(&self) -> Result<u64, PlugscopeError> {
        self.db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM plugins", [], |row| row.get(0))
            })
            .await
            .map(|n| n.max(0) as u64)
            .map_err(map_tr_err)
    }

    pub async fn close(&self) -> Result<(), PlugscopeError> {
        self.db.close().await
    }
}

fn decode(payload: &str) -> Result<PluginEntity, PlugscopeError> {
    serde_json::from_str(payload).map_err(|e| PlugscopeError::Storage {
        source: Box::new(e),
    })
}

#[async_trait]
impl CatalogSink for SqliteCatalog {
    async fn upsert(&self, entity: &PluginEntity) -> Result<(), PlugscopeError> {
        let payload = serde_json::to_string(entity).map_err(|e| PlugscopeError::Storage {
            source: Box::new(e),
        })?;
        let sources = serde_json::to_string(&entity.source_ids()).map_err(|e| {
            PlugscopeError::Storage {
                source: Box::new(e),
            }
        })?;
        let key = entity.identity_key.clone();
        let slug = entity.slug.clone();
        let name = entity.manifest.name.clone();
        let version = entity.manifest.version.clone();
        let category = entity.category.clone();
        let confidence = entity.confidence.to_string();
        let tier = entity.requirements.tier.to_string();
        let overall = entity.quality.overall;
        let now = Utc::now().to_rfc3339();

        self.db
            .connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO plugins (identity_key, slug, name, version, category,
                         confidence, tier, overall, sources, payload, first_seen_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                     ON CONFLICT(identity_key) DO UPDATE SET
                         slug = excluded.slug,
                         name = excluded.name,
                         version = excluded.version,
                         category = excluded.category,
                         confidence = excluded.confidence,
                         tier = excluded.tier,
                         overall = excluded.overall,
                         sources = excluded.sources,
                         payload = excluded.payload,
                         updated_at = excluded.updated_at",
                    params![
                        key, slug, name, version, category, confidence, tier, overall, sources,
                        payload, now,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(slug = %entity.slug, key = %entity.identity_key, "entity stored");
        Ok(())
    }
}
