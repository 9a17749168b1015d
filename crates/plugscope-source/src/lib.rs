// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapters: turn a [`SourceDescriptor`] into a lazy stream of raw
//! candidates.
//!
//! - [`ManifestIndexAdapter`] reads marketplace index JSON (remote or local).
//! - [`GithubScanAdapter`] discovers plugin directories in a repository tree
//!   (GitHub or a local checkout).
//!
//! [`SourceDescriptor`]: plugscope_core::SourceDescriptor

pub mod github_scan;
pub mod inspect;
pub mod local;
pub mod location;
pub mod manifest_index;

use std::sync::Arc;

use plugscope_config::InspectionConfig;
use plugscope_core::{SourceAdapter, SourceKind};
use plugscope_github::GithubClient;

pub use github_scan::GithubScanAdapter;
pub use location::FetchLocation;
pub use manifest_index::ManifestIndexAdapter;

/// The adapter for a source kind.
pub fn adapter_for(
    kind: SourceKind,
    client: &GithubClient,
    inspection: &InspectionConfig,
) -> Arc<dyn SourceAdapter> {
    match kind {
        SourceKind::ManifestIndex => Arc::new(ManifestIndexAdapter::new(
            client.clone(),
            inspection.clone(),
        )),
        SourceKind::GithubScan => {
            Arc::new(GithubScanAdapter::new(client.clone(), inspection.clone()))
        }
    }
}
