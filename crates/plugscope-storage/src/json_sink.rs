// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalog sink that writes every entity to one JSON document on flush.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use plugscope_core::{CatalogSink, PlugscopeError, PluginEntity};

/// On-disk layout of a JSON catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub generated_at: DateTime<Utc>,
    /// Sorted by slug.
    pub plugins: Vec<PluginEntity>,
}

impl CatalogDocument {
    pub fn read(path: &Path) -> Result<Self, PlugscopeError> {
        let text = std::fs::read_to_string(path).map_err(|e| PlugscopeError::Storage {
            source: Box::new(e),
        })?;
        serde_json::from_str(&text).map_err(|e| PlugscopeError::Storage {
            source: Box::new(e),
        })
    }
}

/// Buffers upserts in memory and writes the document atomically on
/// [`CatalogSink::flush`]. Existing entries of the target file are kept
/// unless replaced by the same identity key.
pub struct JsonFileSink {
    path: PathBuf,
    entities: Mutex<BTreeMap<String, PluginEntity>>,
}

impl JsonFileSink {
    /// Create a sink for `path`, loading entities already stored there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PlugscopeError> {
        let path = path.into();
        let mut entities = BTreeMap::new();
        if path.is_file() {
            for entity in CatalogDocument::read(&path)?.plugins {
                entities.insert(entity.identity_key.clone(), entity);
            }
        }
        Ok(Self {
            path,
            entities: Mutex::new(entities),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&self) -> CatalogDocument {
        let entities = self.entities.lock().unwrap_or_else(|e| e.into_inner());
        let mut plugins: Vec<PluginEntity> = entities.values().cloned().collect();
        plugins.sort_by(|a, b| {
            a.slug
                .cmp(&b.slug)
                .then_with(|| a.identity_key.cmp(&b.identity_key))
        });
        CatalogDocument {
            generated_at: Utc::now(),
            plugins,
        }
    }
}

#[async_trait]
impl CatalogSink for JsonFileSink {
    async fn upsert(&self, entity: &PluginEntity) -> Result<(), PlugscopeError> {
        self.entities
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(entity.identity_key.clone(), entity.clone());
        Ok(())
    }

    async fn flush(&self) -> Result<(), PlugscopeError> {
        let document = self.document();
        let json = serde_json::to_string_pretty(&document).map_err(|e| PlugscopeError::Storage {
            source: Box::new(e),
        })?;
        let storage_err = |e: std::io::Error| PlugscopeError::Storage {
            source: Box::new(e),
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage_err)?;
        info!(path = %self.path.display(), plugins = document.plugins.len(), "catalog written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_test_utils::entity_fixture;

    #[tokio::test]
    async fn flush_writes_sorted_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/catalog.json");
        let sink = JsonFileSink::open(&path).unwrap();
        sink.upsert(&entity_fixture("beta", None)).await.unwrap();
        sink.upsert(&entity_fixture("alpha", None)).await.unwrap();
        sink.flush().await.unwrap();

        let doc = CatalogDocument::read(&path).unwrap();
        let slugs: Vec<&str> = doc.plugins.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["alpha", "beta"]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn reopening_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let first = JsonFileSink::open(&path).unwrap();
        first.upsert(&entity_fixture("kept", None)).await.unwrap();
        first.flush().await.unwrap();

        let second = JsonFileSink::open(&path).unwrap();
        second.upsert(&entity_fixture("added", None)).await.unwrap();
        second.flush().await.unwrap();

        assert_eq!(CatalogDocument::read(&path).unwrap().plugins.len(), 2);
    }
}
