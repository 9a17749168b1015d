// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-driven categorization for plugins that declare no category.

use std::collections::BTreeSet;

/// Fixed category set, in tie-break order.
pub const CATEGORIES: &[&str] = &[
    "devops",
    "testing",
    "frontend",
    "backend",
    "security",
    "ai",
    "database",
    "documentation",
    "git",
    "deployment",
    "monitoring",
    "utilities",
    "mobile",
    "cloud",
    "other",
];

/// Fallback when no keyword matches.
pub const FALLBACK_CATEGORY: &str = "other";

const KEYWORD_TO_CATEGORY: &[(&str, &str)] = &[
    ("docker", "devops"),
    ("kubernetes", "devops"),
    ("k8s", "devops"),
    ("ci", "devops"),
    ("cd", "devops"),
    ("pipeline", "devops"),
    ("terraform", "devops"),
    ("ansible", "devops"),
    ("helm", "devops"),
    ("test", "testing"),
    ("testing", "testing"),
    ("jest", "testing"),
    ("pytest", "testing"),
    ("e2e", "testing"),
    ("unit", "testing"),
    ("coverage", "testing"),
    ("react", "frontend"),
    ("vue", "frontend"),
    ("angular", "frontend"),
    ("nextjs", "frontend"),
    ("next", "frontend"),
    ("tailwind", "frontend"),
    ("css", "frontend"),
    ("ui", "frontend"),
    ("component", "frontend"),
    ("api", "backend"),
    ("rest", "backend"),
    ("graphql", "backend"),
    ("fastapi", "backend"),
    ("django", "backend"),
    ("flask", "backend"),
    ("express", "backend"),
    ("security", "security"),
    ("audit", "security"),
    ("vulnerability", "security"),
    ("auth", "security"),
    ("oauth", "security"),
    ("ai", "ai"),
    ("ml", "ai"),
    ("machine-learning", "ai"),
    ("llm", "ai"),
    ("agent", "ai"),
    ("mcp", "ai"),
    ("database", "database"),
    ("sql", "database"),
    ("postgres", "database"),
    ("mysql", "database"),
    ("mongodb", "database"),
    ("redis", "database"),
    ("migration", "database"),
    ("git", "git"),
    ("github", "git"),
    ("gitlab", "git"),
    ("commit", "git"),
    ("pr", "git"),
    ("pull-request", "git"),
    ("doc", "documentation"),
    ("documentation", "documentation"),
    ("readme", "documentation"),
    ("markdown", "documentation"),
    ("deploy", "deployment"),
    ("deployment", "deployment"),
    ("vercel", "deployment"),
    ("netlify", "deployment"),
    ("aws", "deployment"),
    ("gcp", "deployment"),
    ("azure", "deployment"),
    ("monitoring", "monitoring"),
    ("observability", "monitoring"),
    ("logging", "monitoring"),
    ("metrics", "monitoring"),
    ("mobile", "mobile"),
    ("ios", "mobile"),
    ("android", "mobile"),
    ("react-native", "mobile"),
    ("flutter", "mobile"),
    ("cloud", "cloud"),
    ("serverless", "cloud"),
    ("lambda", "cloud"),
    ("functions", "cloud"),
];

/// Derive a category from the name, description and keywords.
///
/// Text is split into word tokens (hyphenated words also count as their
/// parts). Each table keyword present adds one hit to its category; the
/// category with most hits wins, ties go to the earlier category in
/// [`CATEGORIES`].
pub fn categorize<'a>(
    name: &str,
    description: &str,
    keywords: impl IntoIterator<Item = &'a String>,
) -> &'static str {
    let mut text = format!("{name} {description}");
    for k in keywords {
        text.push(' ');
        text.push_str(k);
    }
    let tokens = tokenize(&text);

    let mut hits = [0u32; CATEGORIES.len()];
    for (keyword, category) in KEYWORD_TO_CATEGORY {
        if tokens.contains(*keyword)
            && let Some(idx) = CATEGORIES.iter().position(|c| c == category)
        {
            hits[idx] += 1;
        }
    }

    let best = hits
        .iter()
        .enumerate()
        .filter(|(_, h)| **h > 0)
        .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)));
    match best {
        Some((idx, _)) => CATEGORIES[idx],
        None => FALLBACK_CATEGORY,
    }
}

fn tokenize(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut tokens = BTreeSet::new();
    for word in lower.split(|c: char| !(c.is_alphanumeric() || c == '-')) {
        let word = word.trim_matches('-');
        if word.is_empty() {
            continue;
        }
        if word.contains('-') {
            tokens.extend(word.split('-').filter(|p| !p.is_empty()).map(str::to_string));
        }
        tokens.insert(word.to_string());
    }
    tokens
}
