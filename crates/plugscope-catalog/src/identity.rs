// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity keys.
//!
//! An entity is identified by its slug and its normalized repository URL.
//! GitHub URLs normalize to the repository root, so a bare repository link
//! and a `/tree/<branch>/<dir>` link to the same repository agree.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Hex SHA-256 of `slug + "\n" + normalized repository`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the identity key of a slug and an already normalized repository.
pub fn identity_key(slug: &str, normalized_repository: Option<&str>) -> IdentityKey {
    let mut hasher = Sha256::new();
    hasher.update(slug.as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized_repository.unwrap_or_default().as_bytes());
    IdentityKey(hex::encode(hasher.finalize()))
}

/// Normalize a repository URL for identity comparison.
///
/// Returns `None` for blank input. Strings that are not URLs are compared
/// lowercased and trimmed.
pub fn normalize_repository(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if let Some(rest) = trimmed.strip_prefix("git@") {
        // git@host:owner/repo
        format!("https://{}", rest.replacen(':', "/", 1))
    } else if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let Ok(parsed) = Url::parse(&with_scheme) else {
        return Some(trimmed.to_lowercase());
    };
    let Some(host) = parsed.host_str() else {
        return Some(trimmed.to_lowercase());
    };
    let host = host.trim_start_matches("www.").to_lowercase();
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let path = if host == "github.com" && segments.len() >= 2 {
        let repo = segments[1].trim_end_matches(".git");
        format!("{}/{}", segments[0], repo).to_lowercase()
    } else {
        let joined = segments.join("/");
        joined.trim_end_matches(".git").to_lowercase()
    };
    if path.is_empty() {
        Some(format!("https://{host}"))
    } else {
        Some(format!("https://{host}/{path}"))
    }
}
