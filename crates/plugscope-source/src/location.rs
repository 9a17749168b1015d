// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::PathBuf;

use url::Url;

/// Where a source is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchLocation {
    Remote(Url),
    Local(PathBuf),
}

impl FetchLocation {
    /// `http(s)://` is remote, `file://` and anything without a scheme is a
    /// local path. Other schemes are rejected.
    pub fn parse(location: &str) -> Result<Self, String> {
        let location = location.trim();
        if location.is_empty() {
            return Err("fetch location is empty".to_string());
        }
        if !location.contains("://") {
            return Ok(Self::Local(PathBuf::from(location)));
        }
        let url = Url::parse(location).map_err(|e| format!("invalid fetch location: {e}"))?;
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|_| format!("invalid file URL `{location}`")),
            other => Err(format!("unsupported scheme `{other}`")),
        }
    }
}

/// Join `base` (a directory path using `/`) with a relative entry path such
/// as `./plugins/x` or `../shared/y`. Returns `None` when the result would
/// escape the root.
pub fn join_relative(base: &str, relative: &str) -> Option<String> {
    let mut parts: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}
