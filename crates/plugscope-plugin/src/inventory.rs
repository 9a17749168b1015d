// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counting a plugin's commands, agents, hooks and MCP servers.

use plugscope_core::{ComponentInventory, MCP_DESCRIPTOR, RawCandidate};
use serde_json::Value;

/// Component inventory of a candidate.
///
/// Uses the file tree when the source provided one. Manifest-only candidates
/// fall back to component lists declared inline in the manifest
/// (`commands`, `agents`, `hooks`, `mcpServers`), which marketplace indexes
/// sometimes carry.
pub fn inventory_for(candidate: &RawCandidate) -> ComponentInventory {
    if let Some(tree) = &candidate.file_tree {
        let mcp = candidate.file_contents.get(MCP_DESCRIPTOR).map(String::as_str);
        return ComponentInventory::from_tree(tree, mcp);
    }

    let manifest = &candidate.manifest;
    let declared = |key: &str| -> u32 {
        match manifest.get(key) {
            Some(Value::Array(items)) => items.len() as u32,
            Some(Value::Object(map)) => map.len() as u32,
            Some(Value::String(s)) if !s.is_empty() => 1,
            _ => 0,
        }
    };
    let mcp_servers = match manifest.get("mcpServers") {
        Some(Value::Object(map)) => map.len() as u32,
        _ => 0,
    };
    ComponentInventory {
        commands: declared("commands"),
        agents: declared("agents"),
        hooks: declared("hooks"),
        mcp_servers,
        has_mcp_descriptor: manifest.contains_key("mcpServers"),
    }
}
