// SPDX-FileCopyrightText: 2026 Plugscope Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use plugscope_core::PlugscopeError;
use tracing::debug;

use crate::migrations;

/// Open SQLite database with migrations applied.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` and run pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, PlugscopeError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PlugscopeError::Storage {
                source: Box::new(e),
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PlugscopeError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(wal_mode).await?;
        debug!(path, wal_mode, "database opened");
        Ok(db)
    }

    /// In-memory database, used by tests and `--dry-run`.
    pub async fn open_in_memory() -> Result<Self, PlugscopeError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| PlugscopeError::Storage {
                source: Box::new(e),
            })?;
        let db = Self { conn };
        db.prepare(false).await?;
        Ok(db)
    }

    async fn prepare(&self, wal_mode: bool) -> Result<(), PlugscopeError> {
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                if wal_mode {
                    let mode: String =
                        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                            row.get(0)
                        })?;
                    debug!(journal_mode = %mode, "journal mode set");
                }
                conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
                conn.busy_timeout(std::time::Duration::from_secs(5))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        self.conn
            .call(|conn| -> Result<(), refinery::Error> {
                migrations::run_migrations(conn)
            })
            .await
            .map_err(|e| PlugscopeError::Storage {
                source: Box::new(e),
            })
    }

    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so the database file is self-contained.
    pub async fn close(&self) -> Result<(), PlugscopeError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Convert a tokio-rusqlite error into `PlugscopeError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PlugscopeError {
    PlugscopeError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_create_plugins_table() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'plugins'",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/catalog.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        db.close().await.unwrap();
        assert!(path.exists());
    }
}
