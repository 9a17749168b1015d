// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for candidates and entities.

use std::collections::{BTreeMap, BTreeSet};

use plugscope_core::{
    CandidateOrigin, CategoryReport, ComponentInventory, FileTree, MaintenanceStatus,
    MergeConfidence, ParsedManifest, PluginEntity, Provenance, QualityReport, RawCandidate,
    RequirementProfile, ScoreWeights, SignalOutcome, SubScore, UnresolvableReason,
};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Fluent builder for [`RawCandidate`].
///
/// ```
/// use plugscope_test_utils::CandidateBuilder;
///
/// let candidate = CandidateBuilder::new("official", "0")
///     .name("feature-dev")
///     .version("1.0.0")
///     .repository("https://github.com/anthropics/claude-code")
///     .build();
/// assert_eq!(candidate.declared_name.as_deref(), Some("feature-dev"));
/// ```
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    origin: CandidateOrigin,
    raw_id: String,
    manifest: Map<String, Value>,
    tree: Option<Vec<String>>,
    contents: BTreeMap<String, String>,
    hint: Option<String>,
}

impl CandidateBuilder {
    pub fn new(source_id: &str, raw_id: &str) -> Self {
        Self {
            origin: CandidateOrigin {
                source_id: source_id.to_string(),
                source_url: format!("https://example.test/{source_id}/index.json"),
                is_canonical: false,
                priority: 0,
            },
            raw_id: raw_id.to_string(),
            manifest: Map::new(),
            tree: None,
            contents: BTreeMap::new(),
            hint: None,
        }
    }

    pub fn canonical(mut self, canonical: bool) -> Self {
        self.origin.is_canonical = canonical;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.origin.priority = priority;
        self
    }

    pub fn name(self, name: &str) -> Self {
        self.field("name", Value::from(name))
    }

    pub fn version(self, version: &str) -> Self {
        self.field("version", Value::from(version))
    }

    pub fn description(self, description: &str) -> Self {
        self.field("description", Value::from(description))
    }

    pub fn repository(self, url: &str) -> Self {
        self.field("repository", Value::from(url))
    }

    pub fn category(self, category: &str) -> Self {
        self.field("category", Value::from(category))
    }

    /// Set an arbitrary manifest field.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.manifest.insert(key.to_string(), value);
        self
    }

    /// Add paths to the file tree (creates the tree on first use).
    pub fn files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tree
            .get_or_insert_with(Vec::new)
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add a file with inspectable contents (also added to the tree).
    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.tree.get_or_insert_with(Vec::new).push(path.to_string());
        self.contents.insert(path.to_string(), content.to_string());
        self
    }

    pub fn repository_hint(mut self, url: &str) -> Self {
        self.hint = Some(url.to_string());
        self
    }

    pub fn build(self) -> RawCandidate {
        let mut candidate = RawCandidate::new(self.origin, self.raw_id, self.manifest);
        if let Some(tree) = self.tree {
            candidate = candidate.with_tree(FileTree::new(tree));
        }
        candidate = candidate.with_contents(self.contents);
        if let Some(hint) = self.hint {
            candidate = candidate.with_repository_hint(hint);
        }
        candidate
    }
}

/// A fully populated entity with plausible scores.
pub fn entity_fixture(name: &str, repository: Option<&str>) -> PluginEntity {
    let slug = name.to_lowercase().replace(' ', "-");
    let mut hasher = Sha256::new();
    hasher.update(slug.as_bytes());
    hasher.update(b"\n");
    hasher.update(repository.unwrap_or_default().as_bytes());
    let identity_key = hex::encode(hasher.finalize());

    let weights = ScoreWeights::default();
    let quality = QualityReport::new(
        CategoryReport {
            score: SubScore::Scored(100),
            findings: Vec::new(),
        },
        CategoryReport::unscored("repository activity unknown"),
        CategoryReport {
            score: SubScore::Scored(60),
            findings: Vec::new(),
        },
        CategoryReport {
            score: SubScore::Scored(50),
            findings: Vec::new(),
        },
        MaintenanceStatus::Unknown,
        &weights,
    );

    PluginEntity {
        identity_key,
        slug,
        confidence: if repository.is_some() {
            MergeConfidence::High
        } else {
            MergeConfidence::Low
        },
        manifest: ParsedManifest {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            author: None,
            description: format!("{name} plugin"),
            keywords: BTreeSet::new(),
            category: Some("utilities".to_string()),
            homepage: None,
            repository: repository.map(str::to_string),
        },
        category: "utilities".to_string(),
        field_sources: BTreeMap::new(),
        provenance: vec![Provenance {
            source_id: "official".to_string(),
            source_url: "https://example.test/official/index.json".to_string(),
            raw_id: "0".to_string(),
            declared_version: "1.0.0".to_string(),
            is_canonical: true,
            selected: true,
        }],
        inventory: ComponentInventory {
            commands: 1,
            ..ComponentInventory::default()
        },
        signals: SignalOutcome::unresolvable(if repository.is_some() {
            UnresolvableReason::RateLimited
        } else {
            UnresolvableReason::NoRepository
        }),
        requirements: RequirementProfile::default(),
        quality,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_tree_and_contents() {
        let c = CandidateBuilder::new("s", "1")
            .name("x")
            .files(["commands/a.md"])
            .file("README.md", "# x")
            .build();
        let tree = c.file_tree.as_ref().unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(c.file_contents.get("README.md").map(String::as_str), Some("# x"));
    }

    #[test]
    fn fixture_overall_skips_unscored_maintenance() {
        let e = entity_fixture("x", None);
        // (100*0.3 + 60*0.2 + 50*0.2) / 0.7
        let overall = e.quality.overall.unwrap();
        assert!((overall - 74.2857).abs() < 1e-3, "{overall}");
    }
}
