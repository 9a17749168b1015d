// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static security scan over inspected file contents.
//!
//! Two pattern families:
//! 1. **Code patterns** in script files: dynamic evaluation (issue), process
//!    execution, file deletion, outbound HTTP and dynamic imports (warnings).
//! 2. **Secret assignments** (`api_key = "..."`, `password = '...'`) in
//!    scripts and config files. One finding per file.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use plugscope_core::Finding;
use regex::{Regex, RegexBuilder};

/// Extensions scanned for code patterns.
const CODE_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".mjs", ".sh"];

/// Extensions scanned for hardcoded secrets.
const SECRET_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".mjs", ".json", ".yml", ".yaml"];

/// What a scan match counts as in the security rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    /// Dynamic code evaluation.
    Evaluation,
    /// Risky but often legitimate behavior.
    Behavior,
    /// A credential written into a file.
    Secret,
}

struct CodePattern {
    regex: Regex,
    message: &'static str,
    kind: FindingKind,
}

const CODE_PATTERN_TABLE: &[(&str, &str, FindingKind)] = &[
    (r"\beval\s*\(", "uses eval(), potential code injection", FindingKind::Evaluation),
    (r"\bexec\s*\(", "uses exec(), potential code injection", FindingKind::Evaluation),
    (
        r"child_process|subprocess\.(call|run|Popen)|os\.system",
        "executes external processes",
        FindingKind::Behavior,
    ),
    (
        r"fs\.(unlink|rm)|os\.remove|shutil\.rmtree",
        "deletes files or directories",
        FindingKind::Behavior,
    ),
    (
        r"requests\.(get|post)|httpx\.(get|post)|\bfetch\s*\(",
        "makes outbound HTTP requests",
        FindingKind::Behavior,
    ),
    (r"__import__|importlib\.import_module", "uses dynamic imports", FindingKind::Behavior),
];

const SECRET_PATTERN_TABLE: &[&str] = &[
    r#"api[_-]?key['"]?\s*[=:]\s*['"][^'"\s]{4,}['"]"#,
    r#"password['"]?\s*[=:]\s*['"][^'"\s]{4,}['"]"#,
    r#"secret['"]?\s*[=:]\s*['"][^'"\s]{4,}['"]"#,
    r#"token['"]?\s*[=:]\s*['"][^'"\s]{4,}['"]"#,
];

fn compile(pattern: &str) -> Option<Regex> {
    RegexBuilder::new(pattern).case_insensitive(true).build().ok()
}

static CODE_PATTERNS: LazyLock<Vec<CodePattern>> = LazyLock::new(|| {
    CODE_PATTERN_TABLE
        .iter()
        .filter_map(|(pattern, message, kind)| {
            compile(pattern).map(|regex| CodePattern {
                regex,
                message: *message,
                kind: *kind,
            })
        })
        .collect()
});

static SECRET_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| SECRET_PATTERN_TABLE.iter().filter_map(|p| compile(p)).collect());

/// Message of the hardcoded secret finding.
pub const HARDCODED_SECRET: &str = "potential hardcoded secret";

/// One scan hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub kind: FindingKind,
    pub finding: Finding,
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    let lower = path.to_ascii_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext))
}

/// Scan every inspected file. Hits are ordered by file path, then pattern.
pub fn scan(files: &BTreeMap<String, String>) -> Vec<ScanHit> {
    let mut hits = Vec::new();
    for (path, content) in files {
        if has_extension(path, CODE_EXTENSIONS) {
            for pattern in CODE_PATTERNS.iter() {
                if pattern.regex.is_match(content) {
                    let finding = match pattern.kind {
                        FindingKind::Evaluation => Finding::issue(pattern.message),
                        _ => Finding::warning(pattern.message),
                    };
                    hits.push(ScanHit {
                        kind: pattern.kind,
                        finding: finding.in_file(path),
                    });
                }
            }
        }
        if has_extension(path, SECRET_EXTENSIONS)
            && SECRET_PATTERNS.iter().any(|re| re.is_match(content))
        {
            hits.push(ScanHit {
                kind: FindingKind::Secret,
                finding: Finding::issue(HARDCODED_SECRET).in_file(path),
            });
        }
    }
    hits
}
