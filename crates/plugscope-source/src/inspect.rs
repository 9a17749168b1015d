// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which files of a plugin are read for static inspection.

use plugscope_config::InspectionConfig;
use plugscope_core::MCP_DESCRIPTOR;

/// Files read first when present, regardless of the file budget order.
const PRIORITY_FILES: &[&str] = &[
    MCP_DESCRIPTOR,
    "requirements.txt",
    "pyproject.toml",
    "package.json",
    "README.md",
];

const INSPECTED_EXTENSIONS: &[&str] = &[
    ".md", ".json", ".toml", ".txt", ".py", ".js", ".mjs", ".cjs", ".ts", ".sh",
];

/// Directory names never descended into or listed.
pub const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "__pycache__", "target", ".venv"];

/// Manifest locations, relative to the plugin directory.
pub const PLUGIN_MANIFESTS: &[&str] = &[".claude-plugin/plugin.json", "plugin.json"];

/// True for a path inside a skipped directory.
pub fn is_skipped(path: &str) -> bool {
    path.split('/').any(|segment| SKIPPED_DIRS.contains(&segment))
}

/// Choose the files to read, given `(relative path, size in bytes)` pairs.
///
/// Oversized files are dropped, priority files come first, and at most
/// `max_files` paths are returned.
pub fn select_inspectable<'a>(
    files: impl IntoIterator<Item = (&'a str, Option<u64>)>,
    config: &InspectionConfig,
) -> Vec<String> {
    let mut priority = Vec::new();
    let mut rest = Vec::new();
    for (path, size) in files {
        if size.is_some_and(|s| s > config.max_file_bytes) || is_skipped(path) {
            continue;
        }
        if PRIORITY_FILES.contains(&path) {
            priority.push(path.to_string());
        } else if INSPECTED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            rest.push(path.to_string());
        }
    }
    priority.sort_by_key(|p| PRIORITY_FILES.iter().position(|f| f == p));
    priority.extend(rest);
    priority.truncate(config.max_files);
    priority
}

/// Plugin directory for a manifest path, if `path` is a plugin manifest.
///
/// `plugins/x/.claude-plugin/plugin.json` gives `plugins/x`, a root
/// `plugin.json` gives the empty string.
pub fn plugin_dir_of(path: &str) -> Option<String> {
    for manifest in PLUGIN_MANIFESTS {
        if path == *manifest {
            return Some(String::new());
        }
        if let Some(dir) = path.strip_suffix(&format!("/{manifest}")) {
            if dir.ends_with(".claude-plugin") {
                continue;
            }
            return Some(dir.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_files_first_and_budget_applied() {
        let config = InspectionConfig {
            max_files: 3,
            max_file_bytes: 100,
            ..InspectionConfig::default()
        };
        let picked = select_inspectable(
            [
                ("commands/a.md", Some(10)),
                ("package.json", Some(10)),
                ("big.py", Some(1000)),
                ("logo.png", Some(10)),
                (".mcp.json", Some(10)),
                ("node_modules/x/index.js", Some(10)),
                ("src/main.py", None),
            ],
            &config,
        );
        assert_eq!(picked, [".mcp.json", "package.json", "commands/a.md"]);
    }

    #[test]
    fn plugin_dirs() {
        assert_eq!(
            plugin_dir_of("plugins/x/.claude-plugin/plugin.json").as_deref(),
            Some("plugins/x")
        );
        assert_eq!(plugin_dir_of(".claude-plugin/plugin.json").as_deref(), Some(""));
        assert_eq!(plugin_dir_of("plugin.json").as_deref(), Some(""));
        assert_eq!(plugin_dir_of("tools/y/plugin.json").as_deref(), Some("tools/y"));
        assert_eq!(plugin_dir_of("plugins/x/README.md"), None);
        assert_eq!(plugin_dir_of(".claude-plugin/marketplace.json"), None);
    }
}
