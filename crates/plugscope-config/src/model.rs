// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for plugscope.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use plugscope_core::{ScoreWeights, SourceDescriptor, SourceKind};
use serde::{Deserialize, Serialize};

/// Top-level plugscope configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults to the values
/// documented on its fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlugscopeConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Hosting API access for repository signals.
    #[serde(default)]
    pub github: GithubConfig,

    /// Service tier thresholds.
    #[serde(default)]
    pub tiers: TierConfig,

    /// Quality rubric.
    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    /// Static inspection limits and credential patterns.
    #[serde(default)]
    pub inspection: InspectionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Sources scraped by a full run.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceDescriptor>,
}

impl Default for PlugscopeConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            github: GithubConfig::default(),
            tiers: TierConfig::default(),
            scoring: ScoringConfig::default(),
            dedup: DedupConfig::default(),
            inspection: InspectionConfig::default(),
            storage: StorageConfig::default(),
            sources: default_sources(),
        }
    }
}

fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            source_id: "anthropic-official".into(),
            kind: SourceKind::ManifestIndex,
            fetch_location: "https://raw.githubusercontent.com/anthropics/claude-code/main/.claude-plugin/marketplace.json".into(),
            is_canonical: true,
            priority: 100,
        },
        SourceDescriptor {
            source_id: "plugins-plus-skills".into(),
            kind: SourceKind::ManifestIndex,
            fetch_location: "https://raw.githubusercontent.com/jeremylongshore/claude-code-plugins-plus-skills/main/marketplace.extended.json".into(),
            is_canonical: false,
            priority: 80,
        },
    ]
}

/// Run-level behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deadline for a whole run. Outstanding signal fetches are cancelled
    /// when it passes.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Sources read concurrently.
    #[serde(default = "default_source_concurrency")]
    pub source_concurrency: usize,

    /// Candidates enriched concurrently within one source.
    #[serde(default = "default_candidate_concurrency")]
    pub candidate_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            run_timeout_secs: default_run_timeout_secs(),
            source_concurrency: default_source_concurrency(),
            candidate_concurrency: default_candidate_concurrency(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_run_timeout_secs() -> u64 {
    600
}

fn default_source_concurrency() -> usize {
    4
}

fn default_candidate_concurrency() -> usize {
    16
}

/// GitHub API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfig {
    /// Personal access token. Runs unauthenticated when absent.
    /// Falls back to the `GITHUB_TOKEN` environment variable.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Base URL for raw file downloads.
    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub budget: BudgetConfig,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            raw_base: default_raw_base(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_user_agent() -> String {
    format!("plugscope/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Exponential backoff for rate-limited requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub factor: f64,

    /// Upper bound on a single backoff sleep.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    60_000
}

/// Per-provider request budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetConfig {
    /// Maximum in-flight requests per provider.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Requests allowed per window when a token is configured.
    #[serde(default = "default_authenticated_per_window")]
    pub authenticated_per_window: u32,

    /// Requests allowed per window without a token.
    #[serde(default = "default_anonymous_per_window")]
    pub anonymous_per_window: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            authenticated_per_window: default_authenticated_per_window(),
            anonymous_per_window: default_anonymous_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_in_flight() -> usize {
    8
}

fn default_authenticated_per_window() -> u32 {
    5_000
}

fn default_anonymous_per_window() -> u32 {
    60
}

fn default_window_secs() -> u64 {
    3_600
}

/// Agent-count thresholds for the minimum service tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Agent count at which a plugin needs the elevated tier.
    #[serde(default = "default_elevated_from")]
    pub elevated_from: u32,

    /// Agent counts strictly above this need the heavy tier.
    #[serde(default = "default_heavy_above")]
    pub heavy_above: u32,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            elevated_from: default_elevated_from(),
            heavy_above: default_heavy_above(),
        }
    }
}

fn default_elevated_from() -> u32 {
    3
}

fn default_heavy_above() -> u32 {
    5
}

/// Quality rubric thresholds and weights.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoreWeights,

    #[serde(default)]
    pub maintenance: MaintenanceRubric,

    #[serde(default)]
    pub security: SecurityRubric,

    #[serde(default)]
    pub documentation: DocumentationRubric,

    #[serde(default)]
    pub testing: TestingRubric,
}

/// Recency buckets and commit cadence adjustments.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MaintenanceRubric {
    /// Commits more recent than this many days count as active.
    #[serde(default = "default_active_days")]
    pub active_days: i64,
    #[serde(default = "default_maintained_days")]
    pub maintained_days: i64,
    #[serde(default = "default_slow_days")]
    pub slow_days: i64,

    #[serde(default = "default_active_score")]
    pub active_score: u8,
    #[serde(default = "default_maintained_score")]
    pub maintained_score: u8,
    #[serde(default = "default_slow_score")]
    pub slow_score: u8,
    #[serde(default = "default_stale_score")]
    pub stale_score: u8,

    /// Commits in the trailing 90 days that earn the cadence bonus.
    #[serde(default = "default_busy_commits")]
    pub busy_commits_90d: u32,
    #[serde(default = "default_busy_bonus")]
    pub busy_bonus: u8,
    /// Subtracted when no commit landed in the trailing 90 days.
    #[serde(default = "default_idle_penalty")]
    pub idle_penalty: u8,
}

impl Default for MaintenanceRubric {
    fn default() -> Self {
        Self {
            active_days: default_active_days(),
            maintained_days: default_maintained_days(),
            slow_days: default_slow_days(),
            active_score: default_active_score(),
            maintained_score: default_maintained_score(),
            slow_score: default_slow_score(),
            stale_score: default_stale_score(),
            busy_commits_90d: default_busy_commits(),
            busy_bonus: default_busy_bonus(),
            idle_penalty: default_idle_penalty(),
        }
    }
}

fn default_active_days() -> i64 {
    14
}

fn default_maintained_days() -> i64 {
    90
}

fn default_slow_days() -> i64 {
    365
}

fn default_active_score() -> u8 {
    100
}

fn default_maintained_score() -> u8 {
    85
}

fn default_slow_score() -> u8 {
    60
}

fn default_stale_score() -> u8 {
    30
}

fn default_busy_commits() -> u32 {
    20
}

fn default_busy_bonus() -> u8 {
    10
}

fn default_idle_penalty() -> u8 {
    15
}

/// Penalties applied to the security baseline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityRubric {
    #[serde(default = "default_security_baseline")]
    pub baseline: u8,
    /// Per dynamic-evaluation finding.
    #[serde(default = "default_issue_penalty")]
    pub issue_penalty: u8,
    /// Per process execution, file deletion, network or dynamic import finding.
    #[serde(default = "default_warning_penalty")]
    pub warning_penalty: u8,
    /// Per hardcoded secret assignment.
    #[serde(default = "default_secret_penalty")]
    pub secret_penalty: u8,
    /// Per required credential not mentioned in the description or README.
    #[serde(default = "default_undocumented_credential_penalty")]
    pub undocumented_credential_penalty: u8,
}

impl Default for SecurityRubric {
    fn default() -> Self {
        Self {
            baseline: default_security_baseline(),
            issue_penalty: default_issue_penalty(),
            warning_penalty: default_warning_penalty(),
            secret_penalty: default_secret_penalty(),
            undocumented_credential_penalty: default_undocumented_credential_penalty(),
        }
    }
}

fn default_security_baseline() -> u8 {
    100
}

fn default_issue_penalty() -> u8 {
    20
}

fn default_warning_penalty() -> u8 {
    5
}

fn default_secret_penalty() -> u8 {
    30
}

fn default_undocumented_credential_penalty() -> u8 {
    10
}

/// Points awarded per documentation signal. The sum is clamped to 100.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentationRubric {
    /// Description length (chars) that earns the full description points.
    #[serde(default = "default_good_description_chars")]
    pub good_description_chars: usize,
    #[serde(default = "default_description_points")]
    pub description_points: u8,
    /// Awarded for a non-empty description below the good length.
    #[serde(default = "default_short_description_points")]
    pub short_description_points: u8,
    #[serde(default = "default_readme_points")]
    pub readme_points: u8,
    #[serde(default = "default_examples_points")]
    pub examples_points: u8,
    #[serde(default = "default_changelog_points")]
    pub changelog_points: u8,
    #[serde(default = "default_license_points")]
    pub license_points: u8,
    #[serde(default = "default_contributing_points")]
    pub contributing_points: u8,
    /// Awarded when every command and agent file is non-trivial markdown.
    #[serde(default = "default_component_docs_points")]
    pub component_docs_points: u8,
}

impl Default for DocumentationRubric {
    fn default() -> Self {
        Self {
            good_description_chars: default_good_description_chars(),
            description_points: default_description_points(),
            short_description_points: default_short_description_points(),
            readme_points: default_readme_points(),
            examples_points: default_examples_points(),
            changelog_points: default_changelog_points(),
            license_points: default_license_points(),
            contributing_points: default_contributing_points(),
            component_docs_points: default_component_docs_points(),
        }
    }
}

fn default_good_description_chars() -> usize {
    40
}

fn default_description_points() -> u8 {
    20
}

fn default_short_description_points() -> u8 {
    10
}

fn default_readme_points() -> u8 {
    35
}

fn default_examples_points() -> u8 {
    15
}

fn default_changelog_points() -> u8 {
    10
}

fn default_license_points() -> u8 {
    10
}

fn default_contributing_points() -> u8 {
    5
}

fn default_component_docs_points() -> u8 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestingRubric {
    #[serde(default = "default_tests_points")]
    pub tests_points: u8,
    #[serde(default = "default_ci_points")]
    pub ci_points: u8,
}

impl Default for TestingRubric {
    fn default() -> Self {
        Self {
            tests_points: default_tests_points(),
            ci_points: default_ci_points(),
        }
    }
}

fn default_tests_points() -> u8 {
    50
}

fn default_ci_points() -> u8 {
    50
}

/// How to pick an entity's category when merged candidates disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryPolicy {
    /// Category declared by a canonical source, then the merge winner's.
    #[default]
    CanonicalFirst,
    /// Category declared by the merge winner, then any other candidate's.
    WinnerFirst,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    #[serde(default)]
    pub category_policy: CategoryPolicy,
}

/// A named regex that reveals a required credential.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialPattern {
    /// Credential name reported in the requirement profile.
    pub name: String,
    pub pattern: String,
}

/// Static inspection limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InspectionConfig {
    /// Files larger than this are not read for inspection.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Maximum number of files read per plugin.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default = "default_credential_patterns")]
    pub credential_patterns: Vec<CredentialPattern>,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            max_files: default_max_files(),
            credential_patterns: default_credential_patterns(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    64 * 1024
}

fn default_max_files() -> usize {
    64
}

fn default_credential_patterns() -> Vec<CredentialPattern> {
    [
        ("OPENAI_API_KEY", r"OPENAI_API_KEY"),
        ("ANTHROPIC_API_KEY", r"ANTHROPIC_API_KEY"),
        ("GITHUB_TOKEN", r"GITHUB_TOKEN"),
        ("AWS_ACCESS_KEY_ID", r"AWS_ACCESS_KEY(_ID)?"),
        ("GOOGLE_API_KEY", r"GOOGLE_API_KEY"),
    ]
    .into_iter()
    .map(|(name, pattern)| CredentialPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
    })
    .collect()
}

/// SQLite catalog store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "plugscope.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}
