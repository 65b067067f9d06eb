// ABOUTME: Embedded SQLite store: connection, migrations, and per-entity query/upsert surface
// ABOUTME: Grounded on teacher src/database/mod.rs (SqlitePool, migrate-on-connect) + database_plugins/sqlite.rs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod activities;
mod body_composition;
mod health;
mod ledger;
mod schema;
mod timeseries;

pub use schema::EXPECTED_TABLES;

use crate::errors::{SyncError, SyncResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Scoped handle to the local health-data database.
///
/// A single file-backed `SqlitePool` in WAL mode, shared (via internal
/// pooling) across the sync engine's concurrent per-kind writes. Cloning is
/// cheap; `sqlx::Pool` is itself `Arc`-backed.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the SQLite file at `db_path`, enable WAL
    /// mode, and run all pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created/opened or a migration fails.
    pub async fn connect(db_path: &Path) -> SyncResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::filesystem_critical(format!("creating store directory: {e}"))
            })?;
        }
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| SyncError::store(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        info!(path = %db_path.display(), "store connected");
        Ok(store)
    }

    /// In-memory store for tests; a fresh, empty, migrated database per call.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails.
    pub async fn connect_in_memory() -> SyncResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run all additive migrations. Safe to call on every startup.
    ///
    /// # Errors
    ///
    /// Returns an error if any migration statement fails.
    pub async fn migrate(&self) -> SyncResult<()> {
        schema::migrate(&self.pool).await
    }

    /// Assert the expected table set is a subset of the actual tables,
    /// per spec.md §4.9. Call before a sync run begins.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] naming the first missing table.
    pub async fn validate_schema(&self) -> SyncResult<()> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;
        let existing: std::collections::HashSet<_> = rows.into_iter().map(|(n,)| n).collect();
        for table in EXPECTED_TABLES {
            if !existing.contains(*table) {
                return Err(SyncError::store(format!("missing expected table: {table}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_passes_schema_validation() {
        let store = Store::connect_in_memory().await.unwrap();
        store.validate_schema().await.unwrap();
    }

    #[tokio::test]
    async fn connect_creates_file_and_parent_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let db_path = tempdir.path().join("nested").join("health.db");
        let store = Store::connect(&db_path).await.unwrap();
        store.validate_schema().await.unwrap();
        assert!(db_path.exists());
    }
}
