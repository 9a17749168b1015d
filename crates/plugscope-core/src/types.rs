// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate-level types shared by every stage of the pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Literal version recorded when a manifest declares none.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Schema kind of a configured source. Each kind has exactly one adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SourceKind {
    /// A marketplace index file listing many plugins (`marketplace.json` style).
    ManifestIndex,
    /// A repository or directory whose subdirectories are plugins.
    GithubScan,
}

/// One configured source of plugin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDescriptor {
    /// Stable identifier used in provenance and diagnostics.
    pub source_id: String,
    /// Schema kind, selects the adapter.
    pub kind: SourceKind,
    /// URL or local path the adapter reads from.
    pub fetch_location: String,
    /// Whether this source is the official marketplace.
    #[serde(default)]
    pub is_canonical: bool,
    /// Tie-break rank between non-canonical sources (higher wins).
    #[serde(default)]
    pub priority: i32,
}

/// Where a candidate came from. Copied into provenance records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOrigin {
    pub source_id: String,
    pub source_url: String,
    pub is_canonical: bool,
    pub priority: i32,
}

impl CandidateOrigin {
    /// Origin for a candidate read from the given descriptor.
    pub fn from_descriptor(descriptor: &SourceDescriptor) -> Self {
        Self {
            source_id: descriptor.source_id.clone(),
            source_url: descriptor.fetch_location.clone(),
            is_canonical: descriptor.is_canonical,
            priority: descriptor.priority,
        }
    }
}

/// Relative file paths of a plugin, `/`-separated, sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree(Vec<String>);

impl FileTree {
    /// Build a tree from arbitrary paths, normalizing separators and leading `./`.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = paths
            .into_iter()
            .filter_map(|p| {
                let normalized = p.as_ref().replace('\\', "/");
                let trimmed = normalized.trim_start_matches("./").trim_matches('/');
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self(set.into_iter().collect())
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact file match, case-sensitive.
    pub fn contains(&self, path: &str) -> bool {
        self.0.binary_search_by(|p| p.as_str().cmp(path)).is_ok()
    }

    /// Exact file match ignoring ASCII case.
    pub fn contains_ignore_case(&self, path: &str) -> bool {
        self.0.iter().any(|p| p.eq_ignore_ascii_case(path))
    }

    /// True if any path lives under `dir/`.
    pub fn has_dir(&self, dir: &str) -> bool {
        let prefix = format!("{}/", dir.trim_matches('/'));
        self.0.iter().any(|p| p.starts_with(&prefix))
    }

    /// Files directly inside `dir` (not nested deeper).
    pub fn children<'a>(&'a self, dir: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        let prefix = format!("{}/", dir.trim_matches('/'));
        self.0.iter().filter_map(move |p| {
            p.strip_prefix(&prefix)
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
        })
    }

    /// File names (last path segment) of every path.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .map(|p| p.rsplit('/').next().unwrap_or(p.as_str()))
    }
}

/// One plugin as seen from a single source, before parsing.
///
/// The manifest blob is the only untyped data in the pipeline. It is turned
/// into a [`ParsedManifest`] by the manifest parser and never reaches scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    pub origin: CandidateOrigin,
    /// Identifier of the entry inside its source (index position, directory).
    pub raw_id: String,
    pub declared_name: Option<String>,
    pub declared_version: Option<String>,
    pub manifest: serde_json::Map<String, serde_json::Value>,
    /// `None` when the source only exposes manifests.
    pub file_tree: Option<FileTree>,
    /// Contents of small inspectable files, keyed by relative path.
    #[serde(default)]
    pub file_contents: BTreeMap<String, String>,
    /// Repository URL inferred by the adapter (used when the manifest has none).
    #[serde(default)]
    pub repository_hint: Option<String>,
}

impl RawCandidate {
    /// Build a candidate from a manifest blob, picking declared name/version from it.
    pub fn new(
        origin: CandidateOrigin,
        raw_id: impl Into<String>,
        manifest: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let declared_name = manifest
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let declared_version = manifest
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Self {
            origin,
            raw_id: raw_id.into(),
            declared_name,
            declared_version,
            manifest,
            file_tree: None,
            file_contents: BTreeMap::new(),
            repository_hint: None,
        }
    }

    pub fn with_tree(mut self, tree: FileTree) -> Self {
        self.file_tree = Some(tree);
        self
    }

    pub fn with_contents(mut self, contents: BTreeMap<String, String>) -> Self {
        self.file_contents = contents;
        self
    }

    pub fn with_repository_hint(mut self, hint: impl Into<String>) -> Self {
        self.repository_hint = Some(hint.into());
        self
    }

    /// Identifier used in diagnostics: `source_id:raw_id`.
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.origin.source_id, self.raw_id)
    }
}

/// Plugin author as declared by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Email or URL, whichever the manifest provides.
    pub contact: Option<String>,
}

/// Typed projection of a candidate's manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedManifest {
    /// Trimmed, never empty.
    pub name: String,
    /// Declared version string, or [`UNKNOWN_VERSION`].
    pub version: String,
    pub author: Option<Author>,
    pub description: String,
    /// Lowercase, trimmed, deduplicated.
    pub keywords: BTreeSet<String>,
    pub category: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
}

impl ParsedManifest {
    /// Version as semver, if it is a valid semantic version.
    pub fn semver(&self) -> Option<semver::Version> {
        let v = self.version.trim();
        semver::Version::parse(v.strip_prefix('v').unwrap_or(v)).ok()
    }

    /// True when the manifest declared some version (valid or not).
    pub fn has_declared_version(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }
}

/// Plugin components counted from the file tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInventory {
    pub commands: u32,
    pub agents: u32,
    pub hooks: u32,
    /// Number of servers defined in the MCP descriptor, when readable.
    pub mcp_servers: u32,
    pub has_mcp_descriptor: bool,
}

/// Path of the MCP service descriptor relative to the plugin root.
pub const MCP_DESCRIPTOR: &str = ".mcp.json";

impl ComponentInventory {
    /// Count components from a file tree. Missing directories count as zero.
    ///
    /// `mcp_descriptor` is the content of `.mcp.json` when it was read; an
    /// unreadable or malformed descriptor still counts as present with zero
    /// servers.
    pub fn from_tree(tree: &FileTree, mcp_descriptor: Option<&str>) -> Self {
        let count = |dir: &str, exts: &[&str]| -> u32 {
            tree.children(dir)
                .filter(|name| exts.iter().any(|ext| name.ends_with(ext)))
                .count() as u32
        };
        let has_mcp_descriptor = tree.contains(MCP_DESCRIPTOR);
        let mcp_servers = if has_mcp_descriptor {
            mcp_descriptor.map(count_mcp_servers).unwrap_or(0)
        } else {
            0
        };
        Self {
            commands: count("commands", &[".md"]),
            agents: count("agents", &[".md"]),
            hooks: count("hooks", &[".md", ".py"]),
            mcp_servers,
            has_mcp_descriptor,
        }
    }
}

/// Number of servers in an MCP descriptor. Accepts both the
/// `{"mcpServers": {...}}` layout and a bare server map.
pub fn count_mcp_servers(content: &str) -> u32 {
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(content)
    else {
        return 0;
    };
    match map.get("mcpServers") {
        Some(serde_json::Value::Object(servers)) => servers.len() as u32,
        _ => map.len() as u32,
    }
}

/// Repository activity. Every field is optional; `None` means unknown, not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySignals {
    pub last_commit: Option<DateTime<Utc>>,
    pub commits_90d: Option<u32>,
    pub open_issues: Option<u32>,
    pub closed_issues_30d: Option<u32>,
    pub stars: Option<u32>,
}

impl RepositorySignals {
    /// True when no signal at all is known.
    pub fn is_empty(&self) -> bool {
        self.last_commit.is_none()
            && self.commits_90d.is_none()
            && self.open_issues.is_none()
            && self.closed_issues_30d.is_none()
            && self.stars.is_none()
    }
}

/// Why repository signals could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum UnresolvableReason {
    /// The candidate has no repository URL.
    NoRepository,
    /// The URL is not on a supported hosting provider.
    UnsupportedHost,
    /// The repository does not exist.
    NotFound,
    /// The repository exists but is not readable with the current credentials.
    Private,
    /// Retries were exhausted while rate-limited.
    RateLimited,
    /// The run deadline passed before the fetch completed.
    Cancelled,
    /// Transport or decoding failure.
    Failed(String),
}

impl fmt::Display for UnresolvableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRepository => write!(f, "no repository url"),
            Self::UnsupportedHost => write!(f, "unsupported hosting provider"),
            Self::NotFound => write!(f, "repository not found"),
            Self::Private => write!(f, "repository is private"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Cancelled => write!(f, "cancelled by run deadline"),
            Self::Failed(msg) => write!(f, "fetch failed: {msg}"),
        }
    }
}

/// Result of a repository signal fetch. Never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SignalOutcome {
    Resolved { signals: RepositorySignals },
    Unresolvable { reason: UnresolvableReason },
}

impl SignalOutcome {
    pub fn resolved(signals: RepositorySignals) -> Self {
        Self::Resolved { signals }
    }

    pub fn unresolvable(reason: UnresolvableReason) -> Self {
        Self::Unresolvable { reason }
    }

    /// Signals if the fetch resolved.
    pub fn signals(&self) -> Option<&RepositorySignals> {
        match self {
            Self::Resolved { signals } => Some(signals),
            Self::Unresolvable { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Expected runtime resource intensity. Ordered: `Base < Elevated < Heavy`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ServiceTier {
    #[default]
    Base,
    Elevated,
    Heavy,
}

/// Prerequisites inferred by static inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementProfile {
    pub prerequisites: Vec<String>,
    pub dependencies: Vec<String>,
    pub credentials: Vec<String>,
    pub tier: ServiceTier,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn source_kind_uses_kebab_case() {
        assert_eq!(SourceKind::ManifestIndex.to_string(), "manifest-index");
        assert_eq!(
            SourceKind::from_str("github-scan").unwrap(),
            SourceKind::GithubScan
        );
        let json = serde_json::to_string(&SourceKind::GithubScan).unwrap();
        assert_eq!(json, "\"github-scan\"");
        assert!(serde_json::from_str::<SourceKind>("\"ftp-mirror\"").is_err());
    }

    #[test]
    fn file_tree_normalizes_and_queries() {
        let tree = FileTree::new([
            "./agents/a.md",
            "agents\\b.md",
            "agents/nested/c.md",
            "README.md",
            "README.md",
            "/commands/run.md/",
        ]);
        assert_eq!(tree.len(), 5);
        assert!(tree.contains("README.md"));
        assert!(tree.contains_ignore_case("readme.md"));
        assert!(tree.has_dir("agents"));
        assert!(!tree.has_dir("hooks"));
        let agents: Vec<_> = tree.children("agents").collect();
        assert_eq!(agents, vec!["a.md", "b.md"]);
        assert_eq!(tree.children("commands").count(), 1);
    }

    #[test]
    fn service_tier_is_ordered() {
        assert!(ServiceTier::Base < ServiceTier::Elevated);
        assert!(ServiceTier::Elevated < ServiceTier::Heavy);
        assert_eq!(ServiceTier::Heavy.to_string(), "heavy");
    }

    #[test]
    fn manifest_semver_accepts_v_prefix() {
        let manifest = ParsedManifest {
            name: "x".into(),
            version: "v1.2.3".into(),
            author: None,
            description: String::new(),
            keywords: BTreeSet::new(),
            category: None,
            homepage: None,
            repository: None,
        };
        assert_eq!(manifest.semver(), Some(semver::Version::new(1, 2, 3)));
        let unknown = ParsedManifest {
            version: UNKNOWN_VERSION.into(),
            ..manifest
        };
        assert!(unknown.semver().is_none());
        assert!(!unknown.has_declared_version());
    }

    #[test]
    fn signal_outcome_serializes_with_status_tag() {
        let outcome = SignalOutcome::unresolvable(UnresolvableReason::RateLimited);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unresolvable");
        assert_eq!(json["reason"]["reason"], "rate_limited");
        let back: SignalOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }

    #[test]
    fn inventory_counts_components_from_tree() {
        let tree = FileTree::new([
            "commands/review.md",
            "commands/notes.txt",
            "agents/a.md",
            "agents/b.md",
            "agents/nested/c.md",
            "hooks/pre.py",
            "hooks/post.md",
            ".mcp.json",
        ]);
        let mcp = r#"{"mcpServers":{"github":{},"linear":{}}}"#;
        let inv = ComponentInventory::from_tree(&tree, Some(mcp));
        assert_eq!(inv.commands, 1);
        assert_eq!(inv.agents, 2);
        assert_eq!(inv.hooks, 2);
        assert_eq!(inv.mcp_servers, 2);
        assert!(inv.has_mcp_descriptor);
    }

    #[test]
    fn inventory_of_empty_tree_is_zero() {
        let inv = ComponentInventory::from_tree(&FileTree::default(), None);
        assert_eq!(inv, ComponentInventory::default());
    }

    #[test]
    fn mcp_server_count_accepts_bare_map_and_garbage() {
        assert_eq!(count_mcp_servers(r#"{"a":{},"b":{},"c":{}}"#), 3);
        assert_eq!(count_mcp_servers("not json"), 0);
        assert_eq!(count_mcp_servers("[1,2]"), 0);
    }
}
