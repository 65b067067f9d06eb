// ABOUTME: Status ledger CRUD: per-(user, date, kind) sync outcome tracking
// ABOUTME: Grounded on spec.md §4.9 ledger contract; upsert style from teacher database/user_oauth_tokens.rs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::{SyncState, SyncStatusRow};
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use sqlx::Row;

impl Store {
    /// Insert a `PENDING` ledger row if one does not already exist for this
    /// `(user, date, kind)`. No-op otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_sync_status(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: &str,
    ) -> SyncResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO sync_status (user_id, sync_date, metric_kind, state, synced_at, error_message)
             VALUES (?, ?, ?, ?, NULL, NULL)",
        )
        .bind(user_id)
        .bind(date.to_string())
        .bind(kind)
        .bind(SyncState::Pending.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_sync_status(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: &str,
        state: SyncState,
        error: Option<&str>,
    ) -> SyncResult<()> {
        sqlx::query(
            "INSERT INTO sync_status (user_id, sync_date, metric_kind, state, synced_at, error_message)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (user_id, sync_date, metric_kind) DO UPDATE SET
                state = excluded.state,
                synced_at = excluded.synced_at,
                error_message = excluded.error_message",
        )
        .bind(user_id)
        .bind(date.to_string())
        .bind(kind)
        .bind(state.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(error)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails or an unknown state string is stored.
    pub async fn get_sync_status(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: &str,
    ) -> SyncResult<Option<SyncStatusRow>> {
        let row = sqlx::query(
            "SELECT user_id, sync_date, metric_kind, state, synced_at, error_message
             FROM sync_status WHERE user_id = ? AND sync_date = ? AND metric_kind = ?",
        )
        .bind(user_id)
        .bind(date.to_string())
        .bind(kind)
        .fetch_optional(self.pool())
        .await?;
        row.map(|row| row_to_status(&row)).transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn sync_status_exists(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: &str,
    ) -> SyncResult<bool> {
        Ok(self.get_sync_status(user_id, date, kind).await?.is_some())
    }

    /// Reset every `FAILED` row for `user_id` back to `PENDING`, so the next
    /// `sync_range` over the same dates retries them (spec.md §3 "a separate
    /// reset operation"; CLI `reset` subcommand).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn reset_failed_to_pending(&self, user_id: i64) -> SyncResult<u64> {
        let result = sqlx::query(
            "UPDATE sync_status SET state = ?, error_message = NULL
             WHERE user_id = ? AND state = ?",
        )
        .bind(SyncState::Pending.as_str())
        .bind(user_id)
        .bind(SyncState::Failed.as_str())
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected())
    }

    /// Kinds for `(user, date)` whose ledger row is absent or not `COMPLETED`
    /// — i.e. work a sync rerun should still attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_pending_metrics(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> SyncResult<Vec<SyncStatusRow>> {
        let rows = sqlx::query(
            "SELECT user_id, sync_date, metric_kind, state, synced_at, error_message
             FROM sync_status WHERE user_id = ? AND sync_date = ? AND state != ?",
        )
        .bind(user_id)
        .bind(date.to_string())
        .bind(SyncState::Completed.as_str())
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_status).collect()
    }
}

fn row_to_status(row: &sqlx::sqlite::SqliteRow) -> SyncResult<SyncStatusRow> {
    let sync_date: String = row.try_get("sync_date")?;
    let state: String = row.try_get("state")?;
    let synced_at: Option<String> = row.try_get("synced_at")?;
    Ok(SyncStatusRow {
        user_id: row.try_get("user_id")?,
        sync_date: sync_date.parse().map_err(crate::errors::SyncError::from)?,
        metric_kind: row.try_get("metric_kind")?,
        state: state
            .parse()
            .map_err(|e| SyncError::store(format!("corrupt sync_status.state: {e}")))?,
        synced_at: synced_at
            .map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .map_err(crate::errors::SyncError::from)?,
        error_message: row.try_get("error_message")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_is_a_noop_when_row_already_exists() {
        let store = Store::connect_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        store.create_sync_status(1, date, "sleep").await.unwrap();
        store
            .update_sync_status(1, date, "sleep", SyncState::Completed, None)
            .await
            .unwrap();
        store.create_sync_status(1, date, "sleep").await.unwrap();
        let status = store.get_sync_status(1, date, "sleep").await.unwrap().unwrap();
        assert_eq!(status.state, SyncState::Completed);
    }

    #[tokio::test]
    async fn reset_failed_only_touches_failed_rows() {
        let store = Store::connect_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        store.create_sync_status(1, date, "sleep").await.unwrap();
        store.create_sync_status(1, date, "steps").await.unwrap();
        store
            .update_sync_status(1, date, "sleep", SyncState::Completed, None)
            .await
            .unwrap();
        store
            .update_sync_status(1, date, "steps", SyncState::Failed, Some("boom"))
            .await
            .unwrap();

        let reset = store.reset_failed_to_pending(1).await.unwrap();
        assert_eq!(reset, 1);

        let sleep_status = store.get_sync_status(1, date, "sleep").await.unwrap().unwrap();
        assert_eq!(sleep_status.state, SyncState::Completed);
        let steps_status = store.get_sync_status(1, date, "steps").await.unwrap().unwrap();
        assert_eq!(steps_status.state, SyncState::Pending);
        assert!(steps_status.error_message.is_none());
    }

    #[tokio::test]
    async fn pending_metrics_excludes_completed() {
        let store = Store::connect_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        store.create_sync_status(1, date, "sleep").await.unwrap();
        store.create_sync_status(1, date, "steps").await.unwrap();
        store
            .update_sync_status(1, date, "sleep", SyncState::Completed, None)
            .await
            .unwrap();
        store
            .update_sync_status(1, date, "steps", SyncState::Failed, Some("boom"))
            .await
            .unwrap();

        let pending = store.get_pending_metrics(1, date).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].metric_kind, "steps");
        assert_eq!(pending[0].error_message.as_deref(), Some("boom"));
    }
}
