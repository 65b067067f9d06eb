// ABOUTME: Daily health metric upsert-merge and range query
// ABOUTME: Grounded on teacher database/user_oauth_tokens.rs upsert style; merge semantics per spec.md §4.9
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use crate::models::DailyHealthFields;
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use sqlx::Row;

impl Store {
    /// Read the stored fields for `(user_id, date)`, if any row exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_health_metric(
        &self,
        user_id: i64,
        date: NaiveDate,
    ) -> SyncResult<Option<DailyHealthFields>> {
        let row = sqlx::query("SELECT * FROM daily_health WHERE user_id = ? AND date = ?")
            .bind(user_id)
            .bind(date.to_string())
            .fetch_optional(self.pool())
            .await?;
        row.map(|row| row_to_fields(&row)).transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn health_metric_exists(&self, user_id: i64, date: NaiveDate) -> SyncResult<bool> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM daily_health WHERE user_id = ? AND date = ?")
                .bind(user_id)
                .bind(date.to_string())
                .fetch_one(self.pool())
                .await?;
        Ok(row.0 > 0)
    }

    /// Merge `fields` onto any existing `(user_id, date)` row: read the
    /// existing row, overlay non-null incoming fields, write the merged
    /// result back. Never lets a null field clobber an existing non-null
    /// value (spec.md §4.9).
    ///
    /// # Errors
    ///
    /// Returns an error if either the read or the write fails.
    pub async fn store_health_metric(
        &self,
        user_id: i64,
        date: NaiveDate,
        fields: &DailyHealthFields,
    ) -> SyncResult<()> {
        let mut merged = self
            .get_health_metric(user_id, date)
            .await?
            .unwrap_or_default();
        merged.merge_from(fields);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT OR REPLACE INTO daily_health (user_id, date, steps, step_goal, distance_meters, total_calories, active_calories, bmr_calories, resting_heart_rate, min_heart_rate, max_heart_rate, avg_heart_rate, avg_stress, max_stress, body_battery_high, body_battery_low, sleep_duration_hours, sleep_deep_hours, sleep_light_hours, sleep_rem_hours, sleep_awake_hours, sleep_deep_pct, sleep_light_pct, sleep_rem_pct, sleep_awake_pct, avg_spo2, avg_respiration, waking_respiration, sleep_respiration, lowest_respiration, highest_respiration, training_readiness_score, training_readiness_level, training_readiness_feedback, hrv_weekly_avg, hrv_last_night_avg, hrv_status, sleep_score, sleep_score_qualifier, sleep_bedtime, sleep_wake_time, sleep_need_minutes, skin_temp_deviation_c, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(date.to_string())
            .bind(merged.steps)
            .bind(merged.step_goal)
            .bind(merged.distance_meters)
            .bind(merged.total_calories)
            .bind(merged.active_calories)
            .bind(merged.bmr_calories)
            .bind(merged.resting_heart_rate)
            .bind(merged.min_heart_rate)
            .bind(merged.max_heart_rate)
            .bind(merged.avg_heart_rate)
            .bind(merged.avg_stress)
            .bind(merged.max_stress)
            .bind(merged.body_battery_high)
            .bind(merged.body_battery_low)
            .bind(merged.sleep_duration_hours)
            .bind(merged.sleep_deep_hours)
            .bind(merged.sleep_light_hours)
            .bind(merged.sleep_rem_hours)
            .bind(merged.sleep_awake_hours)
            .bind(merged.sleep_deep_pct)
            .bind(merged.sleep_light_pct)
            .bind(merged.sleep_rem_pct)
            .bind(merged.sleep_awake_pct)
            .bind(merged.avg_spo2)
            .bind(merged.avg_respiration)
            .bind(merged.waking_respiration)
            .bind(merged.sleep_respiration)
            .bind(merged.lowest_respiration)
            .bind(merged.highest_respiration)
            .bind(merged.training_readiness_score)
            .bind(merged.training_readiness_level)
            .bind(merged.training_readiness_feedback)
            .bind(merged.hrv_weekly_avg)
            .bind(merged.hrv_last_night_avg)
            .bind(merged.hrv_status)
            .bind(merged.sleep_score)
            .bind(merged.sleep_score_qualifier)
            .bind(merged.sleep_bedtime)
            .bind(merged.sleep_wake_time)
            .bind(merged.sleep_need_minutes)
            .bind(merged.skin_temp_deviation_c)
        .bind(now.clone())
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Inclusive date-range query over `daily_health`, ordered by date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_health_metrics(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SyncResult<Vec<(NaiveDate, DailyHealthFields)>> {
        let rows = sqlx::query(
            "SELECT * FROM daily_health WHERE user_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )
        .bind(user_id)
        .bind(start.to_string())
        .bind(end.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let date_str: String = row.try_get("date")?;
                let date = date_str
                    .parse::<NaiveDate>()
                    .map_err(crate::errors::SyncError::from)?;
                Ok((date, row_to_fields(row)?))
            })
            .collect()
    }
}

fn row_to_fields(row: &sqlx::sqlite::SqliteRow) -> SyncResult<DailyHealthFields> {
    Ok(DailyHealthFields {
            steps: row.try_get("steps")?,
            step_goal: row.try_get("step_goal")?,
            distance_meters: row.try_get("distance_meters")?,
            total_calories: row.try_get("total_calories")?,
            active_calories: row.try_get("active_calories")?,
            bmr_calories: row.try_get("bmr_calories")?,
            resting_heart_rate: row.try_get("resting_heart_rate")?,
            min_heart_rate: row.try_get("min_heart_rate")?,
            max_heart_rate: row.try_get("max_heart_rate")?,
            avg_heart_rate: row.try_get("avg_heart_rate")?,
            avg_stress: row.try_get("avg_stress")?,
            max_stress: row.try_get("max_stress")?,
            body_battery_high: row.try_get("body_battery_high")?,
            body_battery_low: row.try_get("body_battery_low")?,
            sleep_duration_hours: row.try_get("sleep_duration_hours")?,
            sleep_deep_hours: row.try_get("sleep_deep_hours")?,
            sleep_light_hours: row.try_get("sleep_light_hours")?,
            sleep_rem_hours: row.try_get("sleep_rem_hours")?,
            sleep_awake_hours: row.try_get("sleep_awake_hours")?,
            sleep_deep_pct: row.try_get("sleep_deep_pct")?,
            sleep_light_pct: row.try_get("sleep_light_pct")?,
            sleep_rem_pct: row.try_get("sleep_rem_pct")?,
            sleep_awake_pct: row.try_get("sleep_awake_pct")?,
            avg_spo2: row.try_get("avg_spo2")?,
            avg_respiration: row.try_get("avg_respiration")?,
            waking_respiration: row.try_get("waking_respiration")?,
            sleep_respiration: row.try_get("sleep_respiration")?,
            lowest_respiration: row.try_get("lowest_respiration")?,
            highest_respiration: row.try_get("highest_respiration")?,
            training_readiness_score: row.try_get("training_readiness_score")?,
            training_readiness_level: row.try_get("training_readiness_level")?,
            training_readiness_feedback: row.try_get("training_readiness_feedback")?,
            hrv_weekly_avg: row.try_get("hrv_weekly_avg")?,
            hrv_last_night_avg: row.try_get("hrv_last_night_avg")?,
            hrv_status: row.try_get("hrv_status")?,
            sleep_score: row.try_get("sleep_score")?,
            sleep_score_qualifier: row.try_get("sleep_score_qualifier")?,
            sleep_bedtime: row.try_get("sleep_bedtime")?,
            sleep_wake_time: row.try_get("sleep_wake_time")?,
            sleep_need_minutes: row.try_get("sleep_need_minutes")?,
            skin_temp_deviation_c: row.try_get("skin_temp_deviation_c")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_preserves_values_across_two_partial_writes() {
        let store = Store::connect_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

        store
            .store_health_metric(
                1,
                date,
                &DailyHealthFields {
                    steps: Some(12_000),
                    resting_heart_rate: Some(55),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store
            .store_health_metric(
                1,
                date,
                &DailyHealthFields {
                    sleep_score: Some(82),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let merged = store.get_health_metric(1, date).await.unwrap().unwrap();
        assert_eq!(merged.steps, Some(12_000));
        assert_eq!(merged.resting_heart_rate, Some(55));
        assert_eq!(merged.sleep_score, Some(82));
    }
}
