// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-to-miette error bridge with fuzzy match suggestions.
//!
//! Converts Figment deserialization errors into miette diagnostics with
//! source spans, valid key listings, and "did you mean?" suggestions using
//! Jaro-Winkler string similarity.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(plugscope::config::unknown_key),
        help("{}", format_suggestion_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// An enum-valued key has a value outside its variants (e.g. a source kind).
    #[error("unknown value `{value}` for `{key}`")]
    #[diagnostic(
        code(plugscope::config::unknown_variant),
        help("{}", format_suggestion_help(suggestion.as_deref(), valid_values))
    )]
    UnknownVariant {
        key: String,
        value: String,
        suggestion: Option<String>,
        valid_values: String,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(plugscope::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(plugscope::config::missing_key),
        help("add `{key} = <value>` to your plugscope.toml")
    )]
    MissingKey { key: String },

    /// A semantic validation failure.
    #[error("validation error: {message}")]
    #[diagnostic(code(plugscope::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(plugscope::config::other))]
    Other(String),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn format_suggestion_help(suggestion: Option<&str>, valid: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid values: {valid}"),
        None => format!("valid values: {valid}"),
    }
}

/// Convert a `figment::Error` into a list of `ConfigError` diagnostics.
///
/// A figment error may hold several errors; each becomes one diagnostic.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let key = error
            .path
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                let (span, src) = find_source_span(&error, field, toml_sources);

                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::UnknownVariant(value, expected) => {
                let valid: Vec<&str> = expected.to_vec();
                ConfigError::UnknownVariant {
                    key,
                    value: value.clone(),
                    suggestion: suggest_key(value, &valid),
                    valid_values: valid.join(", "),
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: if key.is_empty() {
                    field.to_string()
                } else {
                    format!("{key}.{field}")
                },
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key,
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
                span: None,
                src: None,
            },
            _ => ConfigError::Other(format!("{error}")),
        };

        errors.push(config_error);
    }

    errors
}

fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    // Inline strings have no file source; fall back to the single provided source.
    let source = match source_path {
        Some(path) => toml_sources
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(p, c)| (p.as_str(), c.as_str())),
        None if toml_sources.len() == 1 => {
            toml_sources.first().map(|(p, c)| (p.as_str(), c.as_str()))
        }
        None => None,
    };

    if let Some((path, content)) = source {
        let section: Vec<String> = error.path.iter().map(|s| s.to_string()).collect();

        if let Some(offset) = find_key_offset(content, &section, field) {
            let span = SourceSpan::new(offset.into(), field.len());
            let named = NamedSource::new(path, content.to_string());
            return (Some(span), Some(named));
        }
    }

    (None, None)
}

/// Find the byte offset of a key in TOML content, relative to a section path.
///
/// For `path = ["github", "retry"]` and `field = "max_atempts"`, finds the
/// `[github.retry]` header then searches for the key after it. For top-level
/// fields, searches from the start.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = if path.is_empty() {
        0
    } else {
        let header = format!("[{}]", path.join("."));
        content.find(&header).map(|pos| pos + header.len())?
    };

    let remaining = &content[search_start..];

    let mut byte_offset = 0;
    for line in remaining.lines() {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            let field_start_in_line = line.len() - trimmed.len();
            return Some(search_start + byte_offset + field_start_in_line);
        }
        byte_offset += line.len() + 1;
    }

    None
}

/// Suggest a similar key name using Jaro-Winkler string similarity.
///
/// Returns the best match above the similarity threshold, or `None`.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > best_score {
            best_score = score;
            best_match = Some(key.to_string());
        }
    }

    best_match
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
