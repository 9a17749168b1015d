// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plugscope report` and `plugscope list`: read back published entities.

use std::path::Path;

use plugscope_config::PlugscopeConfig;
use plugscope_core::{PlugscopeError, PluginEntity};
use plugscope_quality::{ReportFormat, render_report};
use plugscope_storage::{CatalogDocument, SqliteCatalog};

/// Find an entity by identity key or slug in a JSON catalog or the store.
pub async fn find_entity(
    config: &PlugscopeConfig,
    catalog: Option<&Path>,
    key_or_slug: &str,
) -> Result<Option<PluginEntity>, PlugscopeError> {
    match catalog {
        Some(path) => {
            let document = CatalogDocument::read(path)?;
            Ok(document
                .plugins
                .into_iter()
                .find(|e| e.identity_key == key_or_slug || e.slug == key_or_slug))
        }
        None => {
            let store = SqliteCatalog::open(&config.storage).await?;
            let entity = store.get(key_or_slug).await?;
            store.close().await?;
            Ok(entity)
        }
    }
}

/// Render one entity. Returns `false` when it does not exist.
pub async fn run_report(
    config: &PlugscopeConfig,
    catalog: Option<&Path>,
    key_or_slug: &str,
    format: ReportFormat,
) -> Result<bool, PlugscopeError> {
    let Some(entity) = find_entity(config, catalog, key_or_slug).await? else {
        eprintln!("plugscope: no plugin `{key_or_slug}` in the catalog");
        return Ok(false);
    };
    println!("{}", render_report(&entity, format)?);
    Ok(true)
}

/// One line per stored plugin.
pub async fn run_list(
    config: &PlugscopeConfig,
    catalog: Option<&Path>,
) -> Result<(), PlugscopeError> {
    let rows: Vec<(String, String, String, Option<u8>)> = match catalog {
        Some(path) => CatalogDocument::read(path)?
            .plugins
            .into_iter()
            .map(|e| {
                let overall = e.quality.overall_rounded();
                (e.slug, e.manifest.version, e.category, overall)
            })
            .collect(),
        None => {
            let store = SqliteCatalog::open(&config.storage).await?;
            let plugins = store.list().await?;
            store.close().await?;
            plugins
                .into_iter()
                .map(|p| {
                    let overall = p.overall.map(|v| v.round().clamp(0.0, 100.0) as u8);
                    (p.slug, p.version, p.category, overall)
                })
                .collect()
        }
    };

    for (slug, version, category, overall) in &rows {
        let overall = overall.map_or_else(|| "-".to_string(), |v| v.to_string());
        println!("{slug:<32} {version:<12} {category:<14} {overall:>3}");
    }
    println!("{} plugins", rows.len());
    Ok(())
}
