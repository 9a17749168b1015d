// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository activity signals from the GitHub API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use plugscope_core::{RepositorySignals, SignalFetcher, SignalOutcome, UnresolvableReason};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::client::GithubClient;
use crate::repo_url::{RepoRef, parse_github_url};
use crate::types::RepoResponse;

/// Commit listing page size; also the cap on the reported 90-day count.
const COMMIT_PAGE: u32 = 100;

type RepoCell = Arc<OnceCell<Result<RepoResponse, UnresolvableReason>>>;

/// [`SignalFetcher`] backed by [`GithubClient`].
///
/// Repository metadata is looked up once per `owner/repo` and shared by all
/// plugins that live in the same repository. Commit activity is scoped to
/// the plugin's subdirectory when the URL names one.
pub struct GithubSignalFetcher {
    client: GithubClient,
    repos: Mutex<HashMap<String, RepoCell>>,
}

impl GithubSignalFetcher {
    pub fn new(client: GithubClient) -> Self {
        Self {
            client,
            repos: Mutex::new(HashMap::new()),
        }
    }

    async fn repo_info(&self, repo: &RepoRef) -> Result<RepoResponse, UnresolvableReason> {
        let cell = {
            let mut repos = self.repos.lock().unwrap_or_else(|e| e.into_inner());
            repos.entry(repo.slug()).or_default().clone()
        };
        cell.get_or_init(|| async {
            self.client
                .repo(&repo.owner, &repo.repo)
                .await
                .map_err(|e| {
                    debug!(repo = %repo.slug(), error = %e, "repository lookup failed");
                    e.unresolvable_reason()
                })
        })
        .await
        .clone()
    }

    async fn last_commit_in(&self, repo: &RepoRef, path: &str) -> Option<DateTime<Utc>> {
        self.client
            .commits(&repo.owner, &repo.repo, None, Some(path), repo.branch.as_deref(), 1)
            .await
            .ok()
            .and_then(|list| list.first().and_then(|c| c.date()))
    }
}

#[async_trait]
impl SignalFetcher for GithubSignalFetcher {
    async fn fetch(&self, repository_url: &str) -> SignalOutcome {
        if repository_url.trim().is_empty() {
            return SignalOutcome::unresolvable(UnresolvableReason::NoRepository);
        }
        let Some(repo) = parse_github_url(repository_url) else {
            debug!(url = repository_url, "not a GitHub repository");
            return SignalOutcome::unresolvable(UnresolvableReason::UnsupportedHost);
        };

        let info = match self.repo_info(&repo).await {
            Ok(info) => info,
            Err(reason) => return SignalOutcome::unresolvable(reason),
        };

        let now = Utc::now();
        let subpath = repo.subpath.as_deref();
        let commits = self
            .client
            .commits(
                &repo.owner,
                &repo.repo,
                Some(now - Duration::days(90)),
                subpath,
                repo.branch.as_deref(),
                COMMIT_PAGE,
            )
            .await;
        let (commits_90d, mut last_commit) = match commits {
            Ok(list) => (
                Some(list.len() as u32),
                list.first().and_then(|c| c.date()),
            ),
            Err(e) => {
                debug!(repo = %repo, error = %e, "commit listing failed");
                (None, None)
            }
        };
        if last_commit.is_none() {
            last_commit = match subpath {
                Some(path) => self.last_commit_in(&repo, path).await,
                None => info.pushed_at,
            };
        }

        let closed_issues_30d = self
            .client
            .closed_issue_count(&repo.owner, &repo.repo, (now - Duration::days(30)).date_naive())
            .await
            .inspect_err(|e| debug!(repo = %repo, error = %e, "closed issue search failed"))
            .ok();

        let signals = RepositorySignals {
            last_commit,
            commits_90d,
            open_issues: Some(info.open_issues_count),
            closed_issues_30d,
            stars: Some(info.stargazers_count),
        };
        info!(repo = %repo, stars = info.stargazers_count, commits_90d = ?commits_90d, "signals fetched");
        SignalOutcome::resolved(signals)
    }
}
