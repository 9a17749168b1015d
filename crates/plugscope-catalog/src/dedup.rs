// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity resolution and merging.
//!
//! Candidates are grouped by [`IdentityKey`]. Candidates without a repository
//! URL form low-confidence groups keyed by slug alone; they are never folded
//! into a group that has a repository, and two different repositories never
//! share a group.
//!
//! Within a group the precedence order is: highest valid semantic version,
//! then canonical sources, then descriptor priority (higher first), then
//! source id and raw id. The first candidate wins; blank fields of its
//! manifest are filled from the others in precedence order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use plugscope_config::CategoryPolicy;
use plugscope_core::{
    ComponentInventory, FileTree, MergeConfidence, ParsedManifest, Provenance,
    RequirementProfile, SignalOutcome,
};
use plugscope_plugin::{categorize, slugify};
use tracing::debug;

use crate::enrich::EnrichedCandidate;
use crate::identity::{IdentityKey, identity_key, normalize_repository};

/// Candidates sharing one identity key, in precedence order.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateGroup {
    pub key: IdentityKey,
    pub slug: String,
    pub confidence: MergeConfidence,
    pub members: Vec<EnrichedCandidate>,
}

/// The merged view of a group, ready for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCandidate {
    pub key: IdentityKey,
    pub slug: String,
    pub confidence: MergeConfidence,
    pub manifest: ParsedManifest,
    pub category: String,
    pub field_sources: BTreeMap<String, String>,
    pub provenance: Vec<Provenance>,
    pub inventory: ComponentInventory,
    pub requirements: RequirementProfile,
    pub signals: SignalOutcome,
    pub file_tree: Option<FileTree>,
    pub file_contents: BTreeMap<String, String>,
}

/// Groups and merges enriched candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator {
    category_policy: CategoryPolicy,
}

fn precedence(a: &EnrichedCandidate, b: &EnrichedCandidate) -> Ordering {
    let version = |c: &EnrichedCandidate| c.manifest.semver();
    // Higher version first; a valid version beats an invalid one.
    version(b)
        .cmp(&version(a))
        .then_with(|| b.candidate.origin.is_canonical.cmp(&a.candidate.origin.is_canonical))
        .then_with(|| b.candidate.origin.priority.cmp(&a.candidate.origin.priority))
        .then_with(|| a.candidate.origin.source_id.cmp(&b.candidate.origin.source_id))
        .then_with(|| a.candidate.raw_id.cmp(&b.candidate.raw_id))
}

impl Deduplicator {
    pub fn new(category_policy: CategoryPolicy) -> Self {
        Self { category_policy }
    }

    /// Group candidates by identity key. Groups come back sorted by slug
    /// then key; members in precedence order.
    pub fn group(&self, candidates: Vec<EnrichedCandidate>) -> Vec<CandidateGroup> {
        let mut groups: BTreeMap<IdentityKey, CandidateGroup> = BTreeMap::new();
        for enriched in candidates {
            let slug = slugify(&enriched.manifest.name);
            let repository = enriched
                .manifest
                .repository
                .as_deref()
                .and_then(normalize_repository);
            let confidence = if repository.is_some() {
                MergeConfidence::High
            } else {
                MergeConfidence::Low
            };
            let key = identity_key(&slug, repository.as_deref());
            groups
                .entry(key.clone())
                .or_insert_with(|| CandidateGroup {
                    key,
                    slug,
                    confidence,
                    members: Vec::new(),
                })
                .members
                .push(enriched);
        }

        let mut out: Vec<CandidateGroup> = groups.into_values().collect();
        for group in &mut out {
            group.members.sort_by(precedence);
        }
        out.sort_by(|a, b| a.slug.cmp(&b.slug).then_with(|| a.key.cmp(&b.key)));
        out
    }

    /// Merge a group into one candidate.
    pub fn merge(&self, group: CandidateGroup) -> MergedCandidate {
        let CandidateGroup {
            key,
            slug,
            confidence,
            members,
        } = group;
        let mut members = members;
        members.sort_by(precedence);

        let Some(winner) = members.first() else {
            // Groups are only built from at least one candidate.
            return empty_merge(key, slug, confidence);
        };
        let winner_source = winner.candidate.origin.source_id.clone();
        let mut manifest = winner.manifest.clone();
        let mut field_sources = BTreeMap::new();
        for field in ["name", "version"] {
            field_sources.insert(field.to_string(), winner_source.clone());
        }

        fill(&mut field_sources, "description", &members, &mut manifest.description, |m| {
            (!m.description.is_empty()).then(|| m.description.clone())
        });
        fill(&mut field_sources, "author", &members, &mut manifest.author, |m| {
            m.author.clone().map(Some)
        });
        fill(&mut field_sources, "homepage", &members, &mut manifest.homepage, |m| {
            m.homepage.clone().map(Some)
        });
        fill(&mut field_sources, "repository", &members, &mut manifest.repository, |m| {
            m.repository.clone().map(Some)
        });
        fill(&mut field_sources, "keywords", &members, &mut manifest.keywords, |m| {
            (!m.keywords.is_empty()).then(|| m.keywords.clone())
        });

        let (category, category_source) = self.resolve_category(&members, &manifest);
        manifest.category = Some(category.clone());
        field_sources.insert("category".to_string(), category_source);

        // Tree, inventory and requirements travel together.
        let inspected = members
            .iter()
            .find(|m| m.candidate.file_tree.is_some())
            .unwrap_or(winner);
        let signals = members
            .iter()
            .map(|m| &m.signals)
            .find(|s| s.is_resolved())
            .unwrap_or(&winner.signals)
            .clone();

        let provenance = members
            .iter()
            .enumerate()
            .map(|(i, m)| Provenance {
                source_id: m.candidate.origin.source_id.clone(),
                source_url: m.candidate.origin.source_url.clone(),
                raw_id: m.candidate.raw_id.clone(),
                declared_version: m.manifest.version.clone(),
                is_canonical: m.candidate.origin.is_canonical,
                selected: i == 0,
            })
            .collect();

        debug!(
            slug = %slug,
            members = members.len(),
            winner = %winner_source,
            "group merged"
        );

        MergedCandidate {
            key,
            slug,
            confidence,
            manifest,
            category,
            field_sources,
            provenance,
            inventory: inspected.inventory,
            requirements: inspected.requirements.clone(),
            signals,
            file_tree: inspected.candidate.file_tree.clone(),
            file_contents: inspected.candidate.file_contents.clone(),
        }
    }

    /// Group and merge in one step.
    pub fn dedup(&self, candidates: Vec<EnrichedCandidate>) -> Vec<MergedCandidate> {
        self.group(candidates)
            .into_iter()
            .map(|g| self.merge(g))
            .collect()
    }

    /// Pick the category per policy, falling back to keyword categorization.
    fn resolve_category(
        &self,
        members: &[EnrichedCandidate],
        merged: &ParsedManifest,
    ) -> (String, String) {
        let declared = |m: &EnrichedCandidate| {
            m.manifest
                .category
                .clone()
                .map(|c| (c, m.candidate.origin.source_id.clone()))
        };
        let canonical_first = || {
            members
                .iter()
                .filter(|m| m.candidate.origin.is_canonical)
                .find_map(declared)
        };
        let in_precedence = || members.iter().find_map(declared);

        let chosen = match self.category_policy {
            CategoryPolicy::CanonicalFirst => canonical_first().or_else(in_precedence),
            CategoryPolicy::WinnerFirst => in_precedence(),
        };
        chosen.unwrap_or_else(|| {
            let derived = categorize(&merged.name, &merged.description, &merged.keywords);
            (derived.to_string(), "derived".to_string())
        })
    }
}

/// Fill `slot` from the first member that has a value, recording its source.
///
/// The winner is consulted first, so a field it already has keeps its source.
fn fill<T>(
    field_sources: &mut BTreeMap<String, String>,
    field: &str,
    members: &[EnrichedCandidate],
    slot: &mut T,
    value_of: impl Fn(&ParsedManifest) -> Option<T>,
) {
    if let Some((value, source)) = members
        .iter()
        .find_map(|m| value_of(&m.manifest).map(|v| (v, m.candidate.origin.source_id.clone())))
    {
        *slot = value;
        field_sources.insert(field.to_string(), source);
    }
}

fn empty_merge(key: IdentityKey, slug: String, confidence: MergeConfidence) -> MergedCandidate {
    MergedCandidate {
        key,
        manifest: ParsedManifest {
            name: slug.clone(),
            version: plugscope_core::UNKNOWN_VERSION.to_string(),
            author: None,
            description: String::new(),
            keywords: BTreeSet::new(),
            category: None,
            homepage: None,
            repository: None,
        },
        slug,
        confidence,
        category: plugscope_plugin::FALLBACK_CATEGORY.to_string(),
        field_sources: BTreeMap::new(),
        provenance: Vec::new(),
        inventory: ComponentInventory::default(),
        requirements: RequirementProfile::default(),
        signals: SignalOutcome::unresolvable(plugscope_core::UnresolvableReason::NoRepository),
        file_tree: None,
        file_contents: BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugscope_config::{InspectionConfig, TierConfig};
    use plugscope_core::{RawCandidate, UnresolvableReason};
    use plugscope_plugin::RequirementDetector;
    use plugscope_test_utils::CandidateBuilder;
    use proptest::prelude::*;

    fn enrich(candidate: RawCandidate) -> EnrichedCandidate {
        let detector =
            RequirementDetector::new(&InspectionConfig::default(), &TierConfig::default()).unwrap();
        EnrichedCandidate::offline(
            candidate,
            &detector,
            SignalOutcome::unresolvable(UnresolvableReason::NoRepository),
        )
        .unwrap()
    }

    fn plugin(
        source: &str,
        raw: &str,
        name: &str,
        version: &str,
        repo: Option<&str>,
    ) -> EnrichedCandidate {
        let mut b = CandidateBuilder::new(source, raw).name(name).version(version);
        if let Some(repo) = repo {
            b = b.repository(repo);
        }
        enrich(b.build())
    }

    const REPO: &str = "https://github.com/anthropics/claude-code";

    #[test]
    fn highest_version_wins_and_all_sources_are_recorded() {
        let groups = Deduplicator::default().dedup(vec![
            plugin("official", "0", "feature-dev", "1.0.0", Some(REPO)),
            plugin("community", "4", "feature-dev", "1.2.0", Some(REPO)),
        ]);
        assert_eq!(groups.len(), 1);
        let merged = &groups[0];
        assert_eq!(merged.manifest.version, "1.2.0");
        assert_eq!(merged.confidence, MergeConfidence::High);
        let sources: Vec<_> = merged.provenance.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(sources, ["community", "official"]);
        assert!(merged.provenance[0].selected);
        assert!(!merged.provenance[1].selected);
        assert_eq!(merged.field_sources["version"], "community");
    }

    #[test]
    fn canonical_source_breaks_version_ties() {
        let official = enrich(
            CandidateBuilder::new("official", "0")
                .canonical(true)
                .name("x")
                .repository(REPO)
                .build(),
        );
        let mirror = enrich(
            CandidateBuilder::new("mirror", "0")
                .priority(50)
                .name("x")
                .repository(REPO)
                .build(),
        );
        let merged = Deduplicator::default().dedup(vec![mirror, official]);
        assert_eq!(merged[0].provenance[0].source_id, "official");
    }

    #[test]
    fn valid_version_beats_unknown() {
        let merged = Deduplicator::default().dedup(vec![
            plugin("a", "0", "x", "not-a-version", Some(REPO)),
            plugin("b", "0", "x", "0.1.0", Some(REPO)),
        ]);
        assert_eq!(merged[0].manifest.version, "0.1.0");
    }

    #[test]
    fn same_name_different_repositories_stay_apart() {
        let merged = Deduplicator::default().dedup(vec![
            plugin("a", "0", "linter", "1.0.0", Some("https://github.com/alice/linter")),
            plugin("b", "0", "linter", "1.0.0", Some("https://github.com/bob/linter")),
        ]);
        assert_eq!(merged.len(), 2);
        assert_ne!(merged[0].key, merged[1].key);
    }

    #[test]
    fn name_only_candidates_form_low_confidence_groups() {
        let merged = Deduplicator::default().dedup(vec![
            plugin("a", "0", "Linter", "1.0.0", None),
            plugin("b", "1", "linter", "1.1.0", None),
            plugin("c", "2", "linter", "2.0.0", Some(REPO)),
        ]);
        assert_eq!(merged.len(), 2);
        let low: Vec<_> = merged
            .iter()
            .filter(|m| m.confidence == MergeConfidence::Low)
            .collect();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].provenance.len(), 2);
    }

    #[test]
    fn blank_fields_are_filled_from_other_sources() {
        let winner = enrich(
            CandidateBuilder::new("community", "0")
                .name("fmt")
                .version("2.0.0")
                .repository(REPO)
                .build(),
        );
        let other = enrich(
            CandidateBuilder::new("official", "3")
                .name("fmt")
                .version("1.0.0")
                .repository(REPO)
                .description("Formats code")
                .field("keywords", serde_json::json!(["Format", "style"]))
                .build(),
        );
        let merged = Deduplicator::default().dedup(vec![winner, other]);
        let m = &merged[0];
        assert_eq!(m.manifest.version, "2.0.0");
        assert_eq!(m.manifest.description, "Formats code");
        assert_eq!(m.field_sources["description"], "official");
        assert_eq!(m.field_sources["name"], "community");
        assert!(m.manifest.keywords.contains("format"));
    }

    #[test]
    fn category_policy_is_configurable() {
        let canonical = enrich(
            CandidateBuilder::new("official", "0")
                .canonical(true)
                .name("x")
                .version("1.0.0")
                .repository(REPO)
                .category("devops")
                .build(),
        );
        let newer = enrich(
            CandidateBuilder::new("community", "0")
                .name("x")
                .version("2.0.0")
                .repository(REPO)
                .category("testing")
                .build(),
        );
        let input = vec![canonical, newer];
        let first = Deduplicator::new(CategoryPolicy::CanonicalFirst).dedup(input.clone());
        let winner = Deduplicator::new(CategoryPolicy::WinnerFirst).dedup(input);
        assert_eq!(first[0].category, "devops");
        assert_eq!(first[0].field_sources["category"], "official");
        assert_eq!(winner[0].category, "testing");
    }

    #[test]
    fn category_is_derived_when_nobody_declares_one() {
        let merged = Deduplicator::default().dedup(vec![enrich(
            CandidateBuilder::new("a", "0")
                .name("pytest-runner")
                .description("Runs your test suite")
                .build(),
        )]);
        assert_eq!(merged[0].category, "testing");
        assert_eq!(merged[0].field_sources["category"], "derived");
    }

    #[test]
    fn tree_comes_from_the_first_inspected_member() {
        let manifest_only = plugin("index", "0", "x", "3.0.0", Some(REPO));
        let scanned = enrich(
            CandidateBuilder::new("scan", "plugins/x")
                .name("x")
                .version("1.0.0")
                .repository(REPO)
                .files(["agents/a.md", "README.md"])
                .build(),
        );
        let merged = Deduplicator::default().dedup(vec![manifest_only, scanned]);
        assert_eq!(merged[0].manifest.version, "3.0.0");
        assert_eq!(merged[0].inventory.agents, 1);
        assert!(merged[0].file_tree.is_some());
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<(u8, u8, u8, bool)>> {
        // (source, name, version, canonical)
        proptest::collection::vec((0u8..4, 0u8..3, 0u8..4, any::<bool>()), 1..12)
    }

    fn build(shape: &[(u8, u8, u8, bool)]) -> Vec<EnrichedCandidate> {
        shape
            .iter()
            .enumerate()
            .map(|(i, (source, name, version, canonical))| {
                enrich(
                    CandidateBuilder::new(&format!("s{source}"), &i.to_string())
                        .canonical(*canonical)
                        .name(&format!("plugin-{name}"))
                        .version(&format!("1.{version}.0"))
                        .repository(REPO)
                        .build(),
                )
            })
            .collect()
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent_and_order_independent(shape in arb_candidates()) {
            let dedup = Deduplicator::default();
            let forward = dedup.dedup(build(&shape));
            let mut reversed_input = build(&shape);
            reversed_input.reverse();
            let reversed = dedup.dedup(reversed_input);
            prop_assert_eq!(&forward, &reversed);

            let again = dedup.dedup(build(&shape));
            let keys = |m: &[MergedCandidate]| -> Vec<(IdentityKey, String)> {
                m.iter()
                    .map(|x| (x.key.clone(), x.provenance[0].raw_id.clone()))
                    .collect()
            };
            prop_assert_eq!(keys(&forward), keys(&again));
        }
    }
}
