// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Requirement detection by static inspection of a candidate's files.
//!
//! Nothing here executes or fetches anything: dependency declarations,
//! credential references and component counts are read from the file tree
//! and the inspected file contents the source adapter already collected.

use plugscope_config::{InspectionConfig, TierConfig};
use plugscope_core::{
    ComponentInventory, MCP_DESCRIPTOR, PlugscopeError, RawCandidate, RequirementProfile,
    ServiceTier,
};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tracing::debug;

pub const PYTHON_PREREQUISITE: &str = "Python 3.8+";
pub const NODE_PREREQUISITE: &str = "Node.js 18+";

/// File extensions scanned for credential references.
const SCANNED_EXTENSIONS: &[&str] = &[".md", ".json", ".py", ".js", ".ts", ".sh"];

/// Substrings that mark an MCP env key as a credential.
const CREDENTIAL_MARKERS: &[&str] = &["KEY", "TOKEN", "SECRET"];

/// Maps agent counts to a minimum service tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierPolicy {
    pub elevated_from: u32,
    pub heavy_above: u32,
}

impl TierPolicy {
    pub fn new(config: &TierConfig) -> Self {
        Self {
            elevated_from: config.elevated_from,
            heavy_above: config.heavy_above,
        }
    }

    /// Heavy above `heavy_above` agents, elevated from `elevated_from`, base otherwise.
    pub fn tier_for(&self, agents: u32) -> ServiceTier {
        if agents > self.heavy_above {
            ServiceTier::Heavy
        } else if agents >= self.elevated_from {
            ServiceTier::Elevated
        } else {
            ServiceTier::Base
        }
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(&TierConfig::default())
    }
}

/// Infers a [`RequirementProfile`] from a candidate.
#[derive(Debug, Clone)]
pub struct RequirementDetector {
    patterns: Vec<(String, Regex)>,
    tiers: TierPolicy,
}

impl RequirementDetector {
    /// Compile the configured credential patterns (case-insensitive).
    pub fn new(inspection: &InspectionConfig, tiers: &TierConfig) -> Result<Self, PlugscopeError> {
        let patterns = inspection
            .credential_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(&p.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (p.name.clone(), re))
                    .map_err(|e| {
                        PlugscopeError::Config(format!(
                            "credential pattern `{}` does not compile: {e}",
                            p.name
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            tiers: TierPolicy::new(tiers),
        })
    }

    pub fn tier_policy(&self) -> TierPolicy {
        self.tiers
    }

    pub fn detect(
        &self,
        candidate: &RawCandidate,
        inventory: &ComponentInventory,
    ) -> RequirementProfile {
        let mut profile = RequirementProfile::default();
        let has_file = |path: &str| {
            candidate.file_contents.contains_key(path)
                || candidate
                    .file_tree
                    .as_ref()
                    .is_some_and(|tree| tree.contains(path))
        };

        if has_file("requirements.txt") {
            push_unique(&mut profile.prerequisites, PYTHON_PREREQUISITE);
            if let Some(content) = candidate.file_contents.get("requirements.txt") {
                for dep in requirements_txt(content) {
                    push_unique(&mut profile.dependencies, &dep);
                }
            }
        }

        if has_file("pyproject.toml") {
            push_unique(&mut profile.prerequisites, PYTHON_PREREQUISITE);
            if let Some(content) = candidate.file_contents.get("pyproject.toml") {
                for dep in pyproject_dependencies(content) {
                    push_unique(&mut profile.dependencies, &dep);
                }
            }
        }

        if has_file("package.json") {
            push_unique(&mut profile.prerequisites, NODE_PREREQUISITE);
            if let Some(content) = candidate.file_contents.get("package.json") {
                for dep in package_json_dependencies(content) {
                    push_unique(&mut profile.dependencies, &dep);
                }
            }
        }

        if let Some(content) = candidate.file_contents.get(MCP_DESCRIPTOR) {
            for key in mcp_credential_keys(content) {
                push_unique(&mut profile.credentials, &key);
            }
        }
        if let Some(Value::Object(servers)) = candidate.manifest.get("mcpServers") {
            for key in server_env_credentials(servers) {
                push_unique(&mut profile.credentials, &key);
            }
        }

        for (path, content) in &candidate.file_contents {
            if !SCANNED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
                continue;
            }
            for (name, re) in &self.patterns {
                if re.is_match(content) {
                    push_unique(&mut profile.credentials, name);
                }
            }
        }

        profile.tier = self.tiers.tier_for(inventory.agents);
        match profile.tier {
            ServiceTier::Heavy => profile.prerequisites.push(format!(
                "heavy service tier ({} agents)",
                inventory.agents
            )),
            ServiceTier::Elevated => profile.prerequisites.push(format!(
                "elevated service tier ({} agents)",
                inventory.agents
            )),
            ServiceTier::Base => {}
        }

        debug!(
            candidate = %candidate.qualified_id(),
            tier = %profile.tier,
            dependencies = profile.dependencies.len(),
            credentials = profile.credentials.len(),
            "requirements detected"
        );
        profile
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Requirement lines, skipping comments, blanks and pip options.
fn requirements_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.split('#').next().unwrap_or_default().trim())
        .filter(|l| !l.is_empty() && !l.starts_with('-'))
        .map(str::to_string)
        .collect()
}

fn pyproject_dependencies(content: &str) -> Vec<String> {
    let Ok(doc) = content.parse::<toml::Table>() else {
        return Vec::new();
    };
    doc.get("project")
        .and_then(|p| p.get("dependencies"))
        .and_then(|d| d.as_array())
        .map(|deps| {
            deps.iter()
                .filter_map(|d| d.as_str())
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn package_json_dependencies(content: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(pkg)) => match pkg.get("dependencies") {
            Some(Value::Object(deps)) => deps.keys().cloned().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn mcp_credential_keys(content: &str) -> Vec<String> {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(content) else {
        return Vec::new();
    };
    match map.get("mcpServers") {
        Some(Value::Object(servers)) => server_env_credentials(servers),
        _ => server_env_credentials(&map),
    }
}

fn server_env_credentials(servers: &serde_json::Map<String, Value>) -> Vec<String> {
    servers
        .values()
        .filter_map(|server| server.get("env").and_then(Value::as_object))
        .flat_map(|env| env.keys())
        .filter(|key| {
            let upper = key.to_uppercase();
            CREDENTIAL_MARKERS.iter().any(|m| upper.contains(m))
        })
        .cloned()
        .collect()
}
