// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the GitHub REST API and raw content host.
//!
//! Provides [`GithubClient`] which handles request construction,
//! authentication, rate-budget accounting, and transient error retry with
//! exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use plugscope_config::model::{GithubConfig, RetryConfig};
use plugscope_core::{BudgetDenied, PlugscopeError, RateBudget, UnresolvableReason};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{CommitItem, RepoResponse, SearchResponse, TreeResponse};

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Failure of a single GitHub request after retries.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    /// 401/403 that is not a rate-limit response (private or blocked).
    #[error("access denied ({status})")]
    Forbidden { status: u16 },

    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("GitHub returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// How a failed repository lookup is reported on the entity.
    pub fn unresolvable_reason(&self) -> UnresolvableReason {
        match self {
            ApiError::NotFound => UnresolvableReason::NotFound,
            ApiError::Forbidden { .. } => UnresolvableReason::Private,
            ApiError::RateLimited { .. } => UnresolvableReason::RateLimited,
            other => UnresolvableReason::Failed(other.to_string()),
        }
    }
}

impl From<ApiError> for PlugscopeError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::Transport(e) => PlugscopeError::Http {
                message,
                source: Some(Box::new(e)),
            },
            _ => PlugscopeError::Http {
                message,
                source: None,
            },
        }
    }
}

impl From<BudgetDenied> for ApiError {
    fn from(denied: BudgetDenied) -> Self {
        ApiError::RateLimited {
            retry_after: denied.retry_after,
        }
    }
}

/// What the retry loop should do with a response status.
enum Disposition {
    Done,
    Retry(ApiError),
    Fail(ApiError),
}

/// GitHub API client shared by the signal fetcher and the GitHub scan source.
///
/// Every request first takes a permit from the shared [`RateBudget`] under
/// the host name of the URL it targets.
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    raw_base: String,
    retry: RetryConfig,
    budget: Arc<dyn RateBudget>,
    authenticated: bool,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("authenticated", &self.authenticated)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Creates a client. Without a token the client runs anonymously at the
    /// lower rate limit.
    pub fn new(config: &GithubConfig, budget: Arc<dyn RateBudget>) -> Result<Self, PlugscopeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                PlugscopeError::Config(format!("invalid user agent header value: {e}"))
            })?,
        );
        let token = config.token.as_deref().filter(|t| !t.trim().is_empty());
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| PlugscopeError::Config(format!("invalid token header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        } else {
            debug!("no GitHub token configured, using anonymous rate limit");
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| PlugscopeError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            raw_base: config.raw_base.trim_end_matches('/').to_string(),
            retry: config.retry.clone(),
            budget,
            authenticated: token.is_some(),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `GET` a JSON document with retries.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET` a body as text with retries. Works for any URL, not only the
    /// configured API base.
    pub async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let provider = provider_for(url);
        let mut last_error = None;

        for attempt in 1..=self.retry.max_attempts.max(1) {
            if attempt > 1 {
                let delay = self.backoff(attempt, last_error.as_ref());
                warn!(attempt, delay_ms = delay.as_millis() as u64, url, "retrying GitHub request");
                tokio::time::sleep(delay).await;
            }

            let permit = match self.budget.acquire(&provider).await {
                Ok(permit) => permit,
                Err(denied) => {
                    debug!(provider = %denied.provider, "budget denied request");
                    last_error = Some(ApiError::from(denied));
                    continue;
                }
            };

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, attempt, "GitHub request failed");
                    last_error = Some(ApiError::Transport(e));
                    continue;
                }
            };
            let status = response.status();
            debug!(status = %status, attempt, url, "GitHub response received");

            match self.classify(&provider, status, response.headers()) {
                Disposition::Done => {
                    let body = response.text().await.map_err(ApiError::Transport);
                    drop(permit);
                    return body;
                }
                Disposition::Retry(err) => {
                    let body = response.text().await.unwrap_or_default();
                    warn!(status = %status, body = %truncate(&body), "transient error, will retry");
                    last_error = Some(err);
                }
                Disposition::Fail(ApiError::Status { status, .. }) => {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ApiError::Status { status, body });
                }
                Disposition::Fail(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or(ApiError::RateLimited { retry_after: None }))
    }

    fn classify(&self, provider: &str, status: StatusCode, headers: &HeaderMap) -> Disposition {
        if status.is_success() {
            return Disposition::Done;
        }
        if status == StatusCode::NOT_FOUND {
            return Disposition::Fail(ApiError::NotFound);
        }
        if is_rate_limited(status, headers) {
            let retry_after = rate_limit_reset(headers);
            if let Some(reset) = retry_after {
                self.budget.mark_exhausted(provider, reset);
            }
            return Disposition::Retry(ApiError::RateLimited { retry_after });
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Disposition::Fail(ApiError::Forbidden {
                status: status.as_u16(),
            });
        }
        if is_transient_error(status) {
            return Disposition::Retry(ApiError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Disposition::Fail(ApiError::Status {
            status: status.as_u16(),
            body: String::new(),
        })
    }

    /// Delay before `attempt` (2-based): `base * factor^(attempt-2)`, raised
    /// to a server-provided reset and capped at `max_delay_ms`.
    fn backoff(&self, attempt: u32, last: Option<&ApiError>) -> Duration {
        let exp = self.retry.factor.powi(attempt.saturating_sub(2) as i32);
        let millis = (self.retry.base_delay_ms as f64 * exp).min(self.retry.max_delay_ms as f64);
        let mut delay = Duration::from_millis(millis as u64);
        if let Some(ApiError::RateLimited {
            retry_after: Some(reset),
        }) = last
        {
            delay = delay.max(*reset);
        }
        delay.min(Duration::from_millis(self.retry.max_delay_ms))
    }

    /// `GET /repos/{owner}/{repo}`
    pub async fn repo(&self, owner: &str, repo: &str) -> Result<RepoResponse, ApiError> {
        self.get_json(&format!("{}/repos/{owner}/{repo}", self.api_base))
            .await
    }

    /// Commits since `since`, newest first, optionally limited to a path and branch.
    pub async fn commits(
        &self,
        owner: &str,
        repo: &str,
        since: Option<chrono::DateTime<chrono::Utc>>,
        path: Option<&str>,
        branch: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<CommitItem>, ApiError> {
        let mut url = url::Url::parse(&format!("{}/repos/{owner}/{repo}/commits", self.api_base))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("per_page", &per_page.to_string());
            if let Some(since) = since {
                query.append_pair("since", &since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
            }
            if let Some(path) = path {
                query.append_pair("path", path);
            }
            if let Some(branch) = branch {
                query.append_pair("sha", branch);
            }
        }
        self.get_json(url.as_str()).await
    }

    /// Number of issues closed since `since`.
    pub async fn closed_issue_count(
        &self,
        owner: &str,
        repo: &str,
        since: chrono::NaiveDate,
    ) -> Result<u32, ApiError> {
        let mut url = url::Url::parse(&format!("{}/search/issues", self.api_base))
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(
                "q",
                &format!("repo:{owner}/{repo} type:issue state:closed closed:>={since}"),
            )
            .append_pair("per_page", "1");
        let response: SearchResponse = self.get_json(url.as_str()).await?;
        Ok(response.total_count)
    }

    /// Recursive tree listing of a branch.
    pub async fn tree(&self, owner: &str, repo: &str, branch: &str) -> Result<TreeResponse, ApiError> {
        self.get_json(&format!(
            "{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1",
            self.api_base
        ))
        .await
    }

    /// Raw file contents from the raw content host.
    pub async fn fetch_raw(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, ApiError> {
        self.get_text(&format!(
            "{}/{owner}/{repo}/{branch}/{}",
            self.raw_base,
            path.trim_start_matches('/')
        ))
        .await
    }
}

/// Budget key for a URL: its host, or the whole string if it has none.
pub fn provider_for(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{h}:{port}"),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| url.to_string())
}

/// 429, or 403 with an exhausted `x-ratelimit-remaining`, or a secondary
/// limit signalled by `retry-after`.
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (header_str(headers, "x-ratelimit-remaining") == Some("0")
            || headers.contains_key("retry-after"))
}

/// Time until the provider's limit resets, from `retry-after` seconds or
/// the `x-ratelimit-reset` epoch timestamp.
fn rate_limit_reset(headers: &HeaderMap) -> Option<Duration> {
    if let Some(secs) = header_str(headers, "retry-after").and_then(|v| v.parse::<u64>().ok()) {
        return Some(Duration::from_secs(secs));
    }
    let reset = header_str(headers, "x-ratelimit-reset")?.parse::<i64>().ok()?;
    let wait = reset - chrono::Utc::now().timestamp();
    Some(Duration::from_secs(wait.max(0) as u64))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Returns true if the HTTP status code is transient and the request
/// should be retried.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
