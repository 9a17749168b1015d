// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GitHub REST API response types (only the fields plugscope reads).

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /repos/{owner}/{repo}`
#[derive(Debug, Clone, Deserialize)]
pub struct RepoResponse {
    #[serde(default)]
    pub stargazers_count: u32,
    /// Includes open pull requests, as the API reports it.
    #[serde(default)]
    pub open_issues_count: u32,
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub archived: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

/// One element of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitItem {
    pub commit: CommitDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub committer: Option<GitActor>,
    pub author: Option<GitActor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitActor {
    pub date: Option<DateTime<Utc>>,
}

impl CommitItem {
    /// Committer date, falling back to the author date.
    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.commit
            .committer
            .as_ref()
            .and_then(|c| c.date)
            .or_else(|| self.commit.author.as_ref().and_then(|a| a.date))
    }
}

/// `GET /search/issues`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub total_count: u32,
}

/// `GET /repos/{owner}/{repo}/git/trees/{branch}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
    /// Set when the listing exceeded the API limit and was cut short.
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "blob"
    }
}
