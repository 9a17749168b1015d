// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter that discovers plugins by scanning a repository tree.
//!
//! Every directory holding a plugin manifest becomes one candidate, with its
//! file tree and inspectable file contents attached. The location is either
//! a GitHub repository URL (optionally `/tree/<branch>/<dir>`) or a local
//! directory.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use plugscope_config::InspectionConfig;
use plugscope_core::{
    CandidateOrigin, CandidateRejection, CandidateStream, FileTree, PlugscopeError, RawCandidate,
    SourceAdapter, SourceDescriptor, SourceKind,
};
use plugscope_github::{GithubClient, RepoRef, parse_github_url};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::inspect::{PLUGIN_MANIFESTS, is_skipped, plugin_dir_of, select_inspectable};
use crate::local;
use crate::location::FetchLocation;

/// Plugin directories found in a listing, sorted and unique.
pub fn discover_plugin_dirs<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut dirs: Vec<String> = paths
        .into_iter()
        .filter(|p| !is_skipped(p))
        .filter_map(plugin_dir_of)
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}

fn raw_id_for(dir: &str) -> String {
    if dir.is_empty() {
        ".".to_string()
    } else {
        dir.to_string()
    }
}

fn parse_manifest_object(
    origin: &CandidateOrigin,
    raw_id: &str,
    text: &str,
) -> Result<Map<String, Value>, CandidateRejection> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CandidateRejection::new(
            &origin.source_id,
            raw_id,
            "plugin manifest is not a JSON object",
        )),
        Err(e) => Err(CandidateRejection::new(
            &origin.source_id,
            raw_id,
            format!("plugin manifest is not valid JSON: {e}"),
        )),
    }
}

/// Scans repositories for plugin directories.
pub struct GithubScanAdapter {
    client: GithubClient,
    inspection: Arc<InspectionConfig>,
}

impl GithubScanAdapter {
    pub fn new(client: GithubClient, inspection: InspectionConfig) -> Self {
        Self {
            client,
            inspection: Arc::new(inspection),
        }
    }

    async fn open_local(
        &self,
        origin: CandidateOrigin,
        root: PathBuf,
    ) -> Result<CandidateStream, PlugscopeError> {
        let source_id = origin.source_id.clone();
        let listing_root = root.clone();
        let files = tokio::task::spawn_blocking(move || local::list_files(&listing_root))
            .await
            .map_err(|e| PlugscopeError::Internal(format!("directory listing task failed: {e}")))?
            .map_err(|e| PlugscopeError::SourceUnavailable {
                source_id: source_id.clone(),
                message: format!("cannot list {}: {e}", root.display()),
                source: Some(Box::new(e)),
            })?;
        let dirs = discover_plugin_dirs(files.iter().map(|(p, _)| p.as_str()));
        info!(source_id = %source_id, plugins = dirs.len(), "local plugin directories found");

        let inspection = self.inspection.clone();
        let stream = futures::stream::iter(dirs).then(move |dir| {
            let origin = origin.clone();
            let root = root.clone();
            let inspection = inspection.clone();
            async move {
                let raw_id = raw_id_for(&dir);
                let rejection_id = raw_id.clone();
                let source_id = origin.source_id.clone();
                tokio::task::spawn_blocking(move || {
                    let plugin_root = root.join(&dir);
                    let snap = local::snapshot(&plugin_root, &inspection).map_err(|e| {
                        CandidateRejection::new(&origin.source_id, &raw_id, e.to_string())
                    })?;
                    let text = PLUGIN_MANIFESTS
                        .iter()
                        .find_map(|m| std::fs::read_to_string(plugin_root.join(m)).ok())
                        .ok_or_else(|| {
                            CandidateRejection::new(
                                &origin.source_id,
                                &raw_id,
                                "plugin manifest is unreadable",
                            )
                        })?;
                    let manifest = parse_manifest_object(&origin, &raw_id, &text)?;
                    Ok(RawCandidate::new(origin, raw_id, manifest)
                        .with_tree(snap.tree)
                        .with_contents(snap.contents))
                })
                .await
                .unwrap_or_else(|e| {
                    Err(CandidateRejection::new(source_id, rejection_id, e.to_string()))
                })
            }
        });
        Ok(Box::pin(stream))
    }

    async fn open_remote(
        &self,
        origin: CandidateOrigin,
        repo: RepoRef,
    ) -> Result<CandidateStream, PlugscopeError> {
        let source_id = origin.source_id.clone();
        let unavailable = |what: &str, e: plugscope_github::ApiError| {
            PlugscopeError::SourceUnavailable {
                source_id: source_id.clone(),
                message: format!("{what} {}: {e}", repo.repository_url()),
                source: Some(Box::new(e)),
            }
        };

        let branch = match &repo.branch {
            Some(branch) => branch.clone(),
            None => {
                self.client
                    .repo(&repo.owner, &repo.repo)
                    .await
                    .map_err(|e| unavailable("looking up", e))?
                    .default_branch
            }
        };
        let listing = self
            .client
            .tree(&repo.owner, &repo.repo, &branch)
            .await
            .map_err(|e| unavailable("listing", e))?;
        if listing.truncated {
            warn!(source_id = %source_id, repo = %repo.slug(), "repository tree listing truncated");
        }

        let scope = repo.subpath.clone().unwrap_or_default();
        let scoped: Vec<(String, Option<u64>)> = listing
            .tree
            .into_iter()
            .filter(|e| e.is_file())
            .filter_map(|e| {
                let relative = if scope.is_empty() {
                    e.path
                } else {
                    e.path.strip_prefix(&format!("{scope}/"))?.to_string()
                };
                Some((relative, e.size))
            })
            .collect();
        let dirs = discover_plugin_dirs(scoped.iter().map(|(p, _)| p.as_str()));
        info!(source_id = %source_id, repo = %repo.slug(), branch = %branch, plugins = dirs.len(), "plugin directories found");

        let scoped = Arc::new(scoped);
        let client = self.client.clone();
        let inspection = self.inspection.clone();
        let repo = Arc::new(repo);
        let stream = futures::stream::iter(dirs).then(move |dir| {
            let ctx = RemotePlugin {
                client: client.clone(),
                inspection: inspection.clone(),
                origin: origin.clone(),
                repo: repo.clone(),
                branch: branch.clone(),
                scope: scope.clone(),
                files: scoped.clone(),
            };
            async move { ctx.load(dir).await }
        });
        Ok(Box::pin(stream))
    }
}

/// Everything needed to load one remote plugin directory.
struct RemotePlugin {
    client: GithubClient,
    inspection: Arc<InspectionConfig>,
    origin: CandidateOrigin,
    repo: Arc<RepoRef>,
    branch: String,
    scope: String,
    files: Arc<Vec<(String, Option<u64>)>>,
}

impl RemotePlugin {
    fn repo_path(&self, relative: &str) -> String {
        [self.scope.as_str(), relative]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn fetch(&self, relative: &str) -> Result<String, plugscope_github::ApiError> {
        self.client
            .fetch_raw(&self.repo.owner, &self.repo.repo, &self.branch, &self.repo_path(relative))
            .await
    }

    async fn load(self, dir: String) -> Result<RawCandidate, CandidateRejection> {
        let raw_id = raw_id_for(&dir);
        let prefix = if dir.is_empty() { String::new() } else { format!("{dir}/") };
        let plugin_files: Vec<(String, Option<u64>)> = self
            .files
            .iter()
            .filter_map(|(p, size)| p.strip_prefix(&prefix).map(|rel| (rel.to_string(), *size)))
            .collect();

        let manifest_path = PLUGIN_MANIFESTS
            .iter()
            .find(|m| plugin_files.iter().any(|(p, _)| p.as_str() == **m))
            .map(|m| format!("{prefix}{m}"))
            .ok_or_else(|| {
                CandidateRejection::new(&self.origin.source_id, &raw_id, "plugin manifest missing")
            })?;
        let text = self.fetch(&manifest_path).await.map_err(|e| {
            CandidateRejection::new(
                &self.origin.source_id,
                &raw_id,
                format!("fetching {manifest_path}: {e}"),
            )
        })?;
        let manifest = parse_manifest_object(&self.origin, &raw_id, &text)?;

        let selected = select_inspectable(
            plugin_files.iter().map(|(p, size)| (p.as_str(), *size)),
            &self.inspection,
        );
        let this = &self;
        let prefix_ref = prefix.as_str();
        let fetched = futures::future::join_all(selected.iter().map(|rel| async move {
            let result = this.fetch(&format!("{prefix_ref}{rel}")).await;
            (rel.clone(), result)
        }))
        .await;
        let mut contents = BTreeMap::new();
        for (rel, result) in fetched {
            match result {
                Ok(text) => {
                    contents.insert(rel, text);
                }
                Err(e) => debug!(file = %rel, error = %e, "skipping uninspectable file"),
            }
        }

        let location = self.repo_path(&dir);
        let hint = if location.is_empty() {
            self.repo.repository_url()
        } else {
            format!("{}/tree/{}/{location}", self.repo.repository_url(), self.branch)
        };
        Ok(RawCandidate::new(self.origin.clone(), raw_id, manifest)
            .with_tree(FileTree::new(plugin_files.into_iter().map(|(p, _)| p)))
            .with_contents(contents)
            .with_repository_hint(hint))
    }
}

#[async_trait]
impl SourceAdapter for GithubScanAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::GithubScan
    }

    async fn open(&self, descriptor: &SourceDescriptor) -> Result<CandidateStream, PlugscopeError> {
        let origin = CandidateOrigin::from_descriptor(descriptor);
        match FetchLocation::parse(&descriptor.fetch_location)
            .map_err(|msg| PlugscopeError::unavailable(&descriptor.source_id, msg))?
        {
            FetchLocation::Local(root) => self.open_local(origin, root).await,
            FetchLocation::Remote(url) => {
                let repo = parse_github_url(url.as_str()).ok_or_else(|| {
                    PlugscopeError::unavailable(
                        &descriptor.source_id,
                        format!("`{url}` is not a GitHub repository URL"),
                    )
                })?;
                self.open_remote(origin, repo).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_nested_and_root_plugins() {
        let dirs = discover_plugin_dirs([
            ".claude-plugin/marketplace.json",
            "plugins/a/.claude-plugin/plugin.json",
            "plugins/a/commands/x.md",
            "plugins/b/plugin.json",
            "node_modules/c/.claude-plugin/plugin.json",
        ]);
        assert_eq!(dirs, ["plugins/a", "plugins/b"]);
        assert_eq!(discover_plugin_dirs([".claude-plugin/plugin.json"]), [""]);
    }

    #[test]
    fn manifest_must_be_object() {
        let origin = CandidateOrigin {
            source_id: "scan".into(),
            source_url: "x".into(),
            is_canonical: false,
            priority: 0,
        };
        assert!(parse_manifest_object(&origin, "p", "[1]").is_err());
        assert!(parse_manifest_object(&origin, "p", "{").is_err());
        assert!(parse_manifest_object(&origin, "p", r#"{"name":"x"}"#).is_ok());
    }
}
