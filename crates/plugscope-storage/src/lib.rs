// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the plugscope catalog.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, and a JSON file sink for
//! `--output`. Both implement the upsert-only [`plugscope_core::CatalogSink`].

pub mod database;
pub mod json_sink;
pub mod migrations;
pub mod store;

pub use database::Database;
pub use json_sink::{CatalogDocument, JsonFileSink};
pub use store::{SqliteCatalog, StoredPlugin};
