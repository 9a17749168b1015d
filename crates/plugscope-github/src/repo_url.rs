// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recognizing GitHub repository URLs.

use std::fmt;

/// A repository on github.com, optionally narrowed to a branch and subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    /// Directory inside the repository (monorepo plugin layouts).
    pub subpath: Option<String>,
}

impl RepoRef {
    /// `https://github.com/{owner}/{repo}` without branch or subpath.
    pub fn repository_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// Cache key for repository-wide data.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo).to_lowercase()
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository_url())?;
        if let Some(branch) = &self.branch {
            write!(f, "/tree/{branch}")?;
            if let Some(sub) = &self.subpath {
                write!(f, "/{sub}")?;
            }
        }
        Ok(())
    }
}

/// Parse a GitHub repository reference.
///
/// Accepts `https://github.com/o/r`, `http://www.github.com/o/r.git`,
/// `git@github.com:o/r.git`, `github.com/o/r` and
/// `https://github.com/o/r/tree/<branch>/<subpath>`. Returns `None` for any
/// other host or shape.
pub fn parse_github_url(input: &str) -> Option<RepoRef> {
    let trimmed = input.trim();
    let rest = if let Some(ssh) = trimmed.strip_prefix("git@github.com:") {
        ssh.to_string()
    } else {
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        let url = url::Url::parse(&with_scheme).ok()?;
        if !matches!(url.scheme(), "http" | "https" | "git" | "ssh") {
            return None;
        }
        let host = url.host_str()?.to_ascii_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return None;
        }
        url.path().to_string()
    };

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    let (branch, subpath) = match segments.next() {
        Some("tree") | Some("blob") => {
            let branch = segments.next().map(str::to_string);
            let sub: Vec<&str> = segments.collect();
            let subpath = (!sub.is_empty()).then(|| sub.join("/"));
            (branch, subpath)
        }
        _ => (None, None),
    };

    Some(RepoRef {
        owner,
        repo,
        branch,
        subpath,
    })
}

/// For a `raw.githubusercontent.com/{owner}/{repo}/{branch}/...` URL, the
/// repository, branch and directory the file lives in.
pub fn parse_raw_url(input: &str) -> Option<RepoRef> {
    let url = url::Url::parse(input.trim()).ok()?;
    if url.host_str()? != "raw.githubusercontent.com" {
        return None;
    }
    let segments: Vec<&str> = url.path().split('/').filter(|s| !s.is_empty()).collect();
    let [owner, repo, branch, file_path @ ..] = segments.as_slice() else {
        return None;
    };
    let dir = match file_path.split_last() {
        Some((_, dirs)) if !dirs.is_empty() => Some(dirs.join("/")),
        _ => None,
    };
    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        branch: Some(branch.to_string()),
        subpath: dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_shapes() {
        for input in [
            "https://github.com/anthropics/claude-code",
            "https://github.com/anthropics/claude-code.git",
            "http://www.github.com/anthropics/claude-code/",
            "github.com/anthropics/claude-code",
            "git@github.com:anthropics/claude-code.git",
        ] {
            let r = parse_github_url(input).unwrap_or_else(|| panic!("{input}"));
            assert_eq!(r.owner, "anthropics");
            assert_eq!(r.repo, "claude-code");
            assert!(r.branch.is_none());
        }
    }

    #[test]
    fn parses_tree_urls_with_subpath() {
        let r = parse_github_url("https://github.com/o/r/tree/main/plugins/feature-dev").unwrap();
        assert_eq!(r.branch.as_deref(), Some("main"));
        assert_eq!(r.subpath.as_deref(), Some("plugins/feature-dev"));
        assert_eq!(
            r.to_string(),
            "https://github.com/o/r/tree/main/plugins/feature-dev"
        );
    }

    #[test]
    fn rejects_other_hosts() {
        assert!(parse_github_url("https://gitlab.com/o/r").is_none());
        assert!(parse_github_url("https://github.com/only-owner").is_none());
        assert!(parse_github_url("").is_none());
        assert!(parse_github_url("ftp://github.com/o/r").is_none());
    }

    #[test]
    fn raw_url_yields_repository_and_directory() {
        let r = parse_raw_url(
            "https://raw.githubusercontent.com/anthropics/claude-code/main/.claude-plugin/marketplace.json",
        )
        .unwrap();
        assert_eq!(r.slug(), "anthropics/claude-code");
        assert_eq!(r.branch.as_deref(), Some("main"));
        assert_eq!(r.subpath.as_deref(), Some(".claude-plugin"));

        let root = parse_raw_url("https://raw.githubusercontent.com/o/r/main/index.json").unwrap();
        assert!(root.subpath.is_none());
    }
}
