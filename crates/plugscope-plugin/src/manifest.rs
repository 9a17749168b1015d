// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest parsing: the boundary where the untyped manifest blob of a
//! [`RawCandidate`] becomes a typed [`ParsedManifest`].
//!
//! Parsing is purely structural and never performs I/O.

use std::collections::BTreeSet;

use plugscope_core::{Author, ParsedManifest, PlugscopeError, RawCandidate, UNKNOWN_VERSION};
use serde_json::{Map, Value};

/// Descriptions longer than this are truncated.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Parse the manifest of a raw candidate.
///
/// Fails with `CandidateInvalid` when the name is missing, not a string, or
/// blank after trimming. Every other field degrades gracefully: a missing
/// version becomes `"unknown"`, a missing description becomes empty.
pub fn parse_manifest(candidate: &RawCandidate) -> Result<ParsedManifest, PlugscopeError> {
    let raw = &candidate.manifest;
    let invalid = |reason: &str| PlugscopeError::invalid(candidate.qualified_id(), reason);

    let name = match raw.get("name") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => candidate
            .declared_name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        Some(_) => return Err(invalid("manifest name must be a string")),
    };
    if name.is_empty() {
        return Err(invalid("manifest name is missing or empty"));
    }

    let version = match raw.get("version") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_VERSION.to_string(),
    };

    let description = truncate_chars(
        string_field(raw, "description").unwrap_or_default().trim(),
        MAX_DESCRIPTION_CHARS,
    );

    let mut keywords = BTreeSet::new();
    for key in ["keywords", "tags"] {
        keywords.extend(keyword_list(raw.get(key)));
    }

    let category = string_field(raw, "category")
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());

    let homepage = string_field(raw, "homepage")
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty());

    let repository = repository_field(raw)
        .or_else(|| candidate.repository_hint.clone())
        .filter(|r| !r.is_empty());

    Ok(ParsedManifest {
        name,
        version,
        author: parse_author(raw.get("author")),
        description,
        keywords,
        category,
        homepage,
        repository,
    })
}

/// URL-safe slug of a plugin name.
///
/// Lowercases, turns whitespace and underscores into hyphens, drops every
/// other non-alphanumeric character, collapses hyphen runs and trims them.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }
    slug
}

fn string_field<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

fn repository_field(raw: &Map<String, Value>) -> Option<String> {
    match raw.get("repository")? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(o) => o
            .get("url")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string()),
        _ => None,
    }
}

/// Keywords come either as an array of strings or a comma-separated string.
fn keyword_list(value: Option<&Value>) -> Vec<String> {
    let items: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => s.split(',').collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_author(value: Option<&Value>) -> Option<Author> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(Author {
            name: s.trim().to_string(),
            contact: None,
        }),
        Value::Object(o) => {
            let name = o.get("name").and_then(Value::as_str)?.trim();
            if name.is_empty() {
                return None;
            }
            let contact = ["email", "url", "homepage"]
                .iter()
                .find_map(|k| o.get(*k).and_then(Value::as_str))
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            Some(Author {
                name: name.to_string(),
                contact,
            })
        }
        _ => None,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
