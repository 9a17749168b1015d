// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the live pipeline from configuration.

use std::sync::Arc;

use plugscope_catalog::Pipeline;
use plugscope_config::PlugscopeConfig;
use plugscope_core::{PlugscopeError, RateBudget, SourceKind};
use plugscope_github::{GithubClient, GithubSignalFetcher, ProviderBudget};
use plugscope_source::adapter_for;
use tracing::info;

pub fn client(config: &PlugscopeConfig) -> Result<GithubClient, PlugscopeError> {
    let authenticated = config
        .github
        .token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    let budget: Arc<dyn RateBudget> = Arc::new(ProviderBudget::from_config(
        &config.github.budget,
        authenticated,
    ));
    GithubClient::new(&config.github, budget)
}

/// A pipeline backed by GitHub with every source adapter registered.
pub fn pipeline(config: &PlugscopeConfig) -> Result<Pipeline, PlugscopeError> {
    let client = client(config)?;
    info!(
        api_base = %client.api_base(),
        authenticated = client.is_authenticated(),
        "github client ready"
    );
    let signals = Arc::new(GithubSignalFetcher::new(client.clone()));
    let mut pipeline = Pipeline::new(config, signals)?;
    for kind in [SourceKind::ManifestIndex, SourceKind::GithubScan] {
        pipeline = pipeline.with_adapter(adapter_for(kind, &client, &config.inspection));
    }
    Ok(pipeline)
}
