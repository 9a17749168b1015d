// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The deduplicated, scored catalog entity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::quality::QualityReport;
use crate::types::{
    ComponentInventory, ParsedManifest, RequirementProfile, SignalOutcome,
};

/// Confidence of an identity merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MergeConfidence {
    /// Grouped by name and repository URL.
    High,
    /// Grouped by name alone; no repository URL was available.
    Low,
}

/// One contributing candidate of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_id: String,
    pub source_url: String,
    pub raw_id: String,
    pub declared_version: String,
    pub is_canonical: bool,
    /// True for the candidate that won field-level precedence.
    pub selected: bool,
}

/// Canonical representation of a plugin across every source that lists it.
///
/// Entities are rebuilt from scratch on every run. Persistence decides how to
/// diff them against stored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntity {
    /// Hex SHA-256 of the normalized name and repository URL.
    pub identity_key: String,
    pub slug: String,
    pub confidence: MergeConfidence,
    pub manifest: ParsedManifest,
    /// Resolved category (declared or derived).
    pub category: String,
    /// Source id that supplied each merged manifest field.
    #[serde(default)]
    pub field_sources: BTreeMap<String, String>,
    pub provenance: Vec<Provenance>,
    pub inventory: ComponentInventory,
    pub signals: SignalOutcome,
    pub requirements: RequirementProfile,
    pub quality: QualityReport,
}

impl PluginEntity {
    /// Provenance record of the winning candidate.
    pub fn canonical_source(&self) -> Option<&Provenance> {
        self.provenance.iter().find(|p| p.selected)
    }

    /// Source ids of every contributing candidate, deduplicated, in order.
    pub fn source_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for p in &self.provenance {
            if !ids.contains(&p.source_id.as_str()) {
                ids.push(&p.source_id);
            }
        }
        ids
    }
}
