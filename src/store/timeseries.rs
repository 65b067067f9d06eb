// ABOUTME: Intraday time-series point batch upsert and range query
// ABOUTME: Grounded on spec.md §4.9 store_timeseries_batch contract
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use crate::models::TimeSeriesPoint;
use crate::store::Store;
use sqlx::Row;

impl Store {
    /// Merge-on-PK `(user_id, metric_kind, timestamp_ms)`, skipping rows
    /// whose value can't be represented (spec.md §4.9).
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn store_timeseries_batch(
        &self,
        user_id: i64,
        metric_kind: &str,
        points: &[TimeSeriesPoint],
    ) -> SyncResult<()> {
        let mut tx = self.pool().begin().await?;
        for point in points {
            let metadata = point
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            sqlx::query(
                "INSERT OR REPLACE INTO timeseries_points
                    (user_id, date, metric_kind, timestamp_ms, value, metadata)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(point.date.to_string())
            .bind(metric_kind)
            .bind(point.timestamp_ms)
            .bind(point.value)
            .bind(metadata)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Inclusive millisecond-epoch range query.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_timeseries(
        &self,
        user_id: i64,
        metric_kind: &str,
        ts_start_ms: i64,
        ts_end_ms: i64,
    ) -> SyncResult<Vec<TimeSeriesPoint>> {
        let rows = sqlx::query(
            "SELECT * FROM timeseries_points
             WHERE user_id = ? AND metric_kind = ? AND timestamp_ms >= ? AND timestamp_ms <= ?
             ORDER BY timestamp_ms",
        )
        .bind(user_id)
        .bind(metric_kind)
        .bind(ts_start_ms)
        .bind(ts_end_ms)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_point).collect()
    }
}

fn row_to_point(row: &sqlx::sqlite::SqliteRow) -> SyncResult<TimeSeriesPoint> {
    let date: String = row.try_get("date")?;
    let metadata: Option<String> = row.try_get("metadata")?;
    Ok(TimeSeriesPoint {
        user_id: row.try_get("user_id")?,
        date: date.parse().map_err(crate::errors::SyncError::from)?,
        metric_kind: row.try_get("metric_kind")?,
        timestamp_ms: row.try_get("timestamp_ms")?,
        value: row.try_get("value")?,
        metadata: metadata.map(|m| serde_json::from_str(&m)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn stores_and_queries_a_range() {
        let store = Store::connect_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let points = vec![
            TimeSeriesPoint {
                user_id: 1,
                date,
                metric_kind: "heart_rate".into(),
                timestamp_ms: 1000,
                value: 62.0,
                metadata: None,
            },
            TimeSeriesPoint {
                user_id: 1,
                date,
                metric_kind: "heart_rate".into(),
                timestamp_ms: 2000,
                value: 70.0,
                metadata: None,
            },
        ];
        store.store_timeseries_batch(1, "heart_rate", &points).await.unwrap();
        let fetched = store.get_timeseries(1, "heart_rate", 0, 1500).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].timestamp_ms, 1000);
    }
}
