// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter for marketplace index files: one JSON document listing plugins.
//!
//! Accepts either a bare array of plugin entries or an object with a
//! `plugins` array. Relative entry sources (`./plugins/x`) are resolved
//! against the repository hosting the index, or against the index's
//! directory when it is read from disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use plugscope_config::InspectionConfig;
use plugscope_core::{
    CandidateOrigin, CandidateRejection, CandidateStream, PlugscopeError, RawCandidate,
    SourceAdapter, SourceDescriptor, SourceKind,
};
use plugscope_github::{GithubClient, parse_raw_url};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::inspect::PLUGIN_MANIFESTS;
use crate::local;
use crate::location::{FetchLocation, join_relative};

/// Where an index entry says its plugin lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntrySource {
    Relative(String),
    Url(String),
}

fn entry_source(entry: &Map<String, Value>) -> Option<EntrySource> {
    match entry.get("source")? {
        Value::String(s) if s.starts_with("./") || s.starts_with("../") => {
            Some(EntrySource::Relative(s.clone()))
        }
        Value::String(s) if s.contains("://") || s.starts_with("github.com/") => {
            Some(EntrySource::Url(s.clone()))
        }
        Value::Object(obj) => {
            if let Some(repo) = obj.get("repo").and_then(Value::as_str) {
                return Some(EntrySource::Url(format!("https://github.com/{repo}")));
            }
            obj.get("url")
                .and_then(Value::as_str)
                .map(|u| EntrySource::Url(u.trim_end_matches(".git").to_string()))
        }
        _ => None,
    }
}

/// Base that relative entry sources resolve against.
#[derive(Debug, Clone)]
enum IndexBase {
    /// `https://github.com/{owner}/{repo}/tree/{branch}` and the directory
    /// relative to the repository root.
    Github { tree_url: String, repo_url: String, dir: String },
    Directory(PathBuf),
    None,
}

impl IndexBase {
    fn for_location(location: &FetchLocation) -> Self {
        match location {
            FetchLocation::Remote(url) => match parse_raw_url(url.as_str()) {
                Some(raw) => {
                    let dir = index_root(raw.subpath.as_deref().unwrap_or_default());
                    IndexBase::Github {
                        tree_url: format!(
                            "{}/tree/{}",
                            raw.repository_url(),
                            raw.branch.as_deref().unwrap_or("main")
                        ),
                        repo_url: raw.repository_url(),
                        dir,
                    }
                }
                None => IndexBase::None,
            },
            FetchLocation::Local(path) => {
                let parent = path.parent().unwrap_or(Path::new("."));
                let parent = if parent.ends_with(".claude-plugin") {
                    parent.parent().unwrap_or(Path::new("."))
                } else {
                    parent
                };
                IndexBase::Directory(parent.to_path_buf())
            }
        }
    }
}

/// Directory relative entries are resolved against: the index's directory,
/// or the repository root when the index lives in `.claude-plugin/`.
fn index_root(dir: &str) -> String {
    match dir.strip_suffix(".claude-plugin") {
        Some(parent) => parent.trim_end_matches('/').to_string(),
        None => dir.to_string(),
    }
}

/// Reads a JSON marketplace index.
pub struct ManifestIndexAdapter {
    client: GithubClient,
    inspection: Arc<InspectionConfig>,
}

impl ManifestIndexAdapter {
    pub fn new(client: GithubClient, inspection: InspectionConfig) -> Self {
        Self {
            client,
            inspection: Arc::new(inspection),
        }
    }

    async fn fetch(
        &self,
        descriptor: &SourceDescriptor,
        location: &FetchLocation,
    ) -> Result<String, PlugscopeError> {
        match location {
            FetchLocation::Remote(url) => self.client.get_text(url.as_str()).await.map_err(|e| {
                PlugscopeError::SourceUnavailable {
                    source_id: descriptor.source_id.clone(),
                    message: format!("fetching {url}: {e}"),
                    source: Some(Box::new(e)),
                }
            }),
            FetchLocation::Local(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                PlugscopeError::SourceUnavailable {
                    source_id: descriptor.source_id.clone(),
                    message: format!("reading {}: {e}", path.display()),
                    source: Some(Box::new(e)),
                }
            }),
        }
    }
}

/// Split an index document into its plugin entries.
pub fn index_entries(source_id: &str, text: &str) -> Result<Vec<Value>, PlugscopeError> {
    let doc: Value = serde_json::from_str(text).map_err(|e| PlugscopeError::SourceUnavailable {
        source_id: source_id.to_string(),
        message: format!("index is not valid JSON: {e}"),
        source: Some(Box::new(e)),
    })?;
    match doc {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut obj) => match obj.remove("plugins") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(PlugscopeError::unavailable(
                source_id,
                "index object has no `plugins` array",
            )),
        },
        _ => Err(PlugscopeError::unavailable(
            source_id,
            "index must be an array or an object with `plugins`",
        )),
    }
}

/// Turn one index entry into a candidate.
fn entry_candidate(
    origin: &CandidateOrigin,
    base: &IndexBase,
    position: usize,
    entry: Value,
    inspection: &InspectionConfig,
) -> Result<RawCandidate, CandidateRejection> {
    let raw_id = position.to_string();
    let Value::Object(mut manifest) = entry else {
        return Err(CandidateRejection::new(
            &origin.source_id,
            raw_id,
            "index entry is not a JSON object",
        ));
    };

    let source = entry_source(&manifest);
    let mut hint = None;
    let mut snapshot = None;
    match (&source, base) {
        (Some(EntrySource::Url(url)), _) => hint = Some(url.clone()),
        (
            Some(EntrySource::Relative(rel)),
            IndexBase::Github {
                tree_url,
                repo_url,
                dir,
            },
        ) => {
            hint = join_relative(dir, rel).map(|path| {
                if path.is_empty() {
                    repo_url.clone()
                } else {
                    format!("{tree_url}/{path}")
                }
            });
        }
        (Some(EntrySource::Relative(rel)), IndexBase::Directory(root)) => {
            let plugin_dir = root.join(rel);
            if plugin_dir.is_dir() {
                fill_from_local_manifest(&mut manifest, &plugin_dir);
                match local::snapshot(&plugin_dir, inspection) {
                    Ok(snap) => snapshot = Some(snap),
                    Err(e) => debug!(dir = %plugin_dir.display(), error = %e, "cannot read plugin directory"),
                }
            }
        }
        _ => {}
    }

    let mut candidate = RawCandidate::new(origin.clone(), raw_id, manifest);
    if let Some(snap) = snapshot {
        candidate = candidate.with_tree(snap.tree).with_contents(snap.contents);
    }
    if let Some(hint) = hint {
        candidate = candidate.with_repository_hint(hint);
    }
    Ok(candidate)
}

/// Copy keys missing from the index entry out of the plugin's own manifest.
fn fill_from_local_manifest(entry: &mut Map<String, Value>, plugin_dir: &Path) {
    for manifest in PLUGIN_MANIFESTS {
        let Ok(text) = std::fs::read_to_string(plugin_dir.join(manifest)) else {
            continue;
        };
        if let Ok(Value::Object(own)) = serde_json::from_str::<Value>(&text) {
            for (key, value) in own {
                entry.entry(key).or_insert(value);
            }
        }
        return;
    }
}

#[async_trait]
impl SourceAdapter for ManifestIndexAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::ManifestIndex
    }

    async fn open(&self, descriptor: &SourceDescriptor) -> Result<CandidateStream, PlugscopeError> {
        let location = FetchLocation::parse(&descriptor.fetch_location)
            .map_err(|msg| PlugscopeError::unavailable(&descriptor.source_id, msg))?;
        let text = self.fetch(descriptor, &location).await?;
        let entries = index_entries(&descriptor.source_id, &text)?;
        info!(source_id = %descriptor.source_id, entries = entries.len(), "index loaded");

        let origin = CandidateOrigin::from_descriptor(descriptor);
        let base = IndexBase::for_location(&location);
        let inspection = self.inspection.clone();
        let stream = futures::stream::iter(entries.into_iter().enumerate()).then(
            move |(position, entry)| {
                let origin = origin.clone();
                let base = base.clone();
                let inspection = inspection.clone();
                async move {
                    if !matches!(base, IndexBase::Directory(_)) {
                        return entry_candidate(&origin, &base, position, entry, &inspection);
                    }
                    let source_id = origin.source_id.clone();
                    tokio::task::spawn_blocking(move || {
                        entry_candidate(&origin, &base, position, entry, &inspection)
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(CandidateRejection::new(
                            source_id,
                            position.to_string(),
                            format!("reading plugin directory failed: {e}"),
                        ))
                    })
                }
            },
        );
        Ok(Box::pin(stream))
    }
}
