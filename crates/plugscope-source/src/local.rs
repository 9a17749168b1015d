// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading plugin directories from the local filesystem.

use std::collections::BTreeMap;
use std::path::Path;

use plugscope_config::InspectionConfig;
use plugscope_core::FileTree;
use tracing::debug;

use crate::inspect::{SKIPPED_DIRS, select_inspectable};

/// File tree of `root` plus the contents of the inspectable files.
#[derive(Debug, Clone, Default)]
pub struct LocalSnapshot {
    pub tree: FileTree,
    pub contents: BTreeMap<String, String>,
}

/// Every file below `root` as `(relative path, size)`, skipping
/// dependency and VCS directories.
pub fn list_files(root: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && SKIPPED_DIRS.contains(&entry.file_name().to_string_lossy().as_ref()))
        });
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(std::io::Error::other)?
            .to_string_lossy()
            .replace('\\', "/");
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push((relative, size));
    }
    Ok(files)
}

/// Snapshot a plugin directory.
pub fn snapshot(root: &Path, config: &InspectionConfig) -> std::io::Result<LocalSnapshot> {
    let files = list_files(root)?;
    let selected = select_inspectable(
        files.iter().map(|(p, size)| (p.as_str(), Some(*size))),
        config,
    );
    let mut contents = BTreeMap::new();
    for path in selected {
        match std::fs::read_to_string(root.join(&path)) {
            Ok(text) => {
                contents.insert(path, text);
            }
            // Binary or unreadable files are listed but not inspected.
            Err(e) => debug!(path = %path, error = %e, "skipping unreadable file"),
        }
    }
    Ok(LocalSnapshot {
        tree: FileTree::new(files.into_iter().map(|(p, _)| p)),
        contents,
    })
}
