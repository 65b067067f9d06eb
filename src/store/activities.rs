// ABOUTME: Activity, exercise-set, and split upsert/query surface
// ABOUTME: Merge-on-PK semantics grounded on spec.md §4.9; upsert style from teacher database/user_oauth_tokens.rs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use crate::models::{Activity, ActivitySplit, ExerciseSet, IntensityType, SetType};
use crate::store::Store;
use chrono::{NaiveDate, Utc};
use sqlx::Row;
use std::str::FromStr;

impl Store {
    /// Merge `activity` onto any existing `(user_id, activity_id)` row: a
    /// later detail-sync write (which only populates `total_sets`,
    /// `total_reps`, `total_weight_kg`, `details_synced`) never blanks out
    /// fields the original list-sync write already populated, and vice versa.
    ///
    /// # Errors
    ///
    /// Returns an error if either the read or the write fails.
    pub async fn store_activity(&self, activity: &Activity) -> SyncResult<()> {
        let existing = self
            .get_activity(activity.user_id, &activity.activity_id)
            .await?;
        let merged = merge_activity(existing, activity.clone());

        sqlx::query(
            "INSERT OR REPLACE INTO activities (
                user_id, activity_id, activity_date, name, activity_type, duration_seconds,
                avg_heart_rate, max_heart_rate, training_load, start_time, distance_meters,
                calories, elevation_gain, elevation_loss, avg_speed, max_speed, total_sets,
                total_reps, total_weight_kg, details_synced, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(merged.user_id)
        .bind(&merged.activity_id)
        .bind(merged.activity_date.to_string())
        .bind(&merged.name)
        .bind(&merged.activity_type)
        .bind(merged.duration_seconds)
        .bind(merged.avg_heart_rate)
        .bind(merged.max_heart_rate)
        .bind(merged.training_load)
        .bind(&merged.start_time)
        .bind(merged.distance_meters)
        .bind(merged.calories)
        .bind(merged.elevation_gain)
        .bind(merged.elevation_loss)
        .bind(merged.avg_speed)
        .bind(merged.max_speed)
        .bind(merged.total_sets)
        .bind(merged.total_reps)
        .bind(merged.total_weight_kg)
        .bind(merged.details_synced)
        .bind(merged.created_at.to_rfc3339())
        .bind(merged.updated_at.to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activity(&self, user_id: i64, activity_id: &str) -> SyncResult<Option<Activity>> {
        let row = sqlx::query("SELECT * FROM activities WHERE user_id = ? AND activity_id = ?")
            .bind(user_id)
            .bind(activity_id)
            .fetch_optional(self.pool())
            .await?;
        row.map(|row| row_to_activity(&row)).transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn activity_exists(&self, user_id: i64, activity_id: &str) -> SyncResult<bool> {
        Ok(self.get_activity(user_id, activity_id).await?.is_some())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn activity_has_splits(&self, user_id: i64, activity_id: &str) -> SyncResult<bool> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM activity_splits WHERE user_id = ? AND activity_id = ?")
                .bind(user_id)
                .bind(activity_id)
                .fetch_one(self.pool())
                .await?;
        Ok(row.0 > 0)
    }

    /// Inclusive date range, optionally filtered by a case-sensitive
    /// substring of `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activities(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
        name: Option<&str>,
    ) -> SyncResult<Vec<Activity>> {
        let pattern = name.map(|n| format!("%{n}%"));
        let rows = sqlx::query(
            "SELECT * FROM activities
             WHERE user_id = ? AND activity_date >= ? AND activity_date <= ?
               AND (? IS NULL OR name LIKE ?)
             ORDER BY activity_date DESC",
        )
        .bind(user_id)
        .bind(start.to_string())
        .bind(end.to_string())
        .bind(pattern.clone())
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_activity).collect()
    }

    /// Activities not yet detail-synced, newest first (spec.md §4.10
    /// `backfill_activity_details`).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activities_pending_details(
        &self,
        user_id: i64,
        limit: i64,
    ) -> SyncResult<Vec<Activity>> {
        let rows = sqlx::query(
            "SELECT * FROM activities WHERE user_id = ? AND details_synced = 0
             ORDER BY activity_date DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_activity).collect()
    }

    /// Activities with no stored splits, newest first (spec.md §4.10
    /// `backfill_activity_splits`; caller filters by sport class).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activities_missing_splits(
        &self,
        user_id: i64,
        limit: i64,
    ) -> SyncResult<Vec<Activity>> {
        let rows = sqlx::query(
            "SELECT * FROM activities a WHERE a.user_id = ?
               AND NOT EXISTS (
                 SELECT 1 FROM activity_splits s
                 WHERE s.user_id = a.user_id AND s.activity_id = a.activity_id
               )
             ORDER BY a.activity_date DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_activity).collect()
    }

    /// Activities with splits stored but a null `distance_meters` (spec.md
    /// §4.10 `backfill_activity_distance_from_splits`).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activities_missing_distance_with_splits(
        &self,
        user_id: i64,
    ) -> SyncResult<Vec<Activity>> {
        let rows = sqlx::query(
            "SELECT * FROM activities a WHERE a.user_id = ? AND a.distance_meters IS NULL
               AND EXISTS (
                 SELECT 1 FROM activity_splits s
                 WHERE s.user_id = a.user_id AND s.activity_id = a.activity_id
               )
             ORDER BY a.activity_date DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_activity).collect()
    }

    /// Replace all stored sets for `activity_id` with `sets` (detail sync
    /// always re-fetches the full set list, so a clean replace is correct).
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn store_exercise_sets(
        &self,
        user_id: i64,
        activity_id: &str,
        sets: &[ExerciseSet],
    ) -> SyncResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM exercise_sets WHERE user_id = ? AND activity_id = ?")
            .bind(user_id)
            .bind(activity_id)
            .execute(&mut *tx)
            .await?;
        for set in sets {
            sqlx::query(
                "INSERT INTO exercise_sets (
                    user_id, activity_id, set_order, exercise_category, exercise_name,
                    set_type, repetition_count, weight_grams, duration_seconds, start_time
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(set.user_id)
            .bind(&set.activity_id)
            .bind(set.set_order)
            .bind(&set.exercise_category)
            .bind(&set.exercise_name)
            .bind(set.set_type.as_str())
            .bind(set.repetition_count)
            .bind(set.weight_grams)
            .bind(set.duration_seconds)
            .bind(&set.start_time)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_exercise_sets(&self, user_id: i64, activity_id: &str) -> SyncResult<Vec<ExerciseSet>> {
        let rows = sqlx::query(
            "SELECT * FROM exercise_sets WHERE user_id = ? AND activity_id = ? ORDER BY set_order",
        )
        .bind(user_id)
        .bind(activity_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_exercise_set).collect()
    }

    /// Replace all stored splits for `activity_id` with `splits`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails.
    pub async fn store_activity_splits(
        &self,
        user_id: i64,
        activity_id: &str,
        splits: &[ActivitySplit],
    ) -> SyncResult<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM activity_splits WHERE user_id = ? AND activity_id = ?")
            .bind(user_id)
            .bind(activity_id)
            .execute(&mut *tx)
            .await?;
        for split in splits {
            sqlx::query(
                "INSERT INTO activity_splits (
                    user_id, activity_id, lap_index, start_time, duration_seconds,
                    moving_duration_seconds, distance_meters, avg_speed, max_speed,
                    avg_moving_speed, avg_heart_rate, max_heart_rate, elevation_gain,
                    elevation_loss, max_elevation, min_elevation, avg_cadence, max_cadence,
                    calories, start_lat, start_lon, end_lat, end_lon, intensity_type
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(split.user_id)
            .bind(&split.activity_id)
            .bind(split.lap_index)
            .bind(&split.start_time)
            .bind(split.duration_seconds)
            .bind(split.moving_duration_seconds)
            .bind(split.distance_meters)
            .bind(split.avg_speed)
            .bind(split.max_speed)
            .bind(split.avg_moving_speed)
            .bind(split.avg_heart_rate)
            .bind(split.max_heart_rate)
            .bind(split.elevation_gain)
            .bind(split.elevation_loss)
            .bind(split.max_elevation)
            .bind(split.min_elevation)
            .bind(split.avg_cadence)
            .bind(split.max_cadence)
            .bind(split.calories)
            .bind(split.start_lat)
            .bind(split.start_lon)
            .bind(split.end_lat)
            .bind(split.end_lon)
            .bind(split.intensity_type.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_activity_splits(
        &self,
        user_id: i64,
        activity_id: &str,
    ) -> SyncResult<Vec<ActivitySplit>> {
        let rows = sqlx::query(
            "SELECT * FROM activity_splits WHERE user_id = ? AND activity_id = ? ORDER BY lap_index",
        )
        .bind(user_id)
        .bind(activity_id)
        .fetch_all(self.pool())
        .await?;
        rows.iter().map(row_to_split).collect()
    }
}

fn merge_activity(existing: Option<Activity>, incoming: Activity) -> Activity {
    let Some(mut existing) = existing else {
        return incoming;
    };
    macro_rules! overlay {
        ($field:ident) => {
            if incoming.$field.is_some() {
                existing.$field = incoming.$field.clone();
            }
        };
    }
    overlay!(name);
    overlay!(activity_type);
    overlay!(duration_seconds);
    overlay!(avg_heart_rate);
    overlay!(max_heart_rate);
    overlay!(training_load);
    overlay!(start_time);
    overlay!(distance_meters);
    overlay!(calories);
    overlay!(elevation_gain);
    overlay!(elevation_loss);
    overlay!(avg_speed);
    overlay!(max_speed);
    overlay!(total_sets);
    overlay!(total_reps);
    overlay!(total_weight_kg);
    existing.activity_date = incoming.activity_date;
    existing.details_synced = existing.details_synced || incoming.details_synced;
    existing.updated_at = Utc::now();
    existing
}

fn row_to_activity(row: &sqlx::sqlite::SqliteRow) -> SyncResult<Activity> {
    let activity_date: String = row.try_get("activity_date")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    Ok(Activity {
        user_id: row.try_get("user_id")?,
        activity_id: row.try_get("activity_id")?,
        activity_date: NaiveDate::from_str(&activity_date).map_err(crate::errors::SyncError::from)?,
        name: row.try_get("name")?,
        activity_type: row.try_get("activity_type")?,
        duration_seconds: row.try_get("duration_seconds")?,
        avg_heart_rate: row.try_get("avg_heart_rate")?,
        max_heart_rate: row.try_get("max_heart_rate")?,
        training_load: row.try_get("training_load")?,
        start_time: row.try_get("start_time")?,
        distance_meters: row.try_get("distance_meters")?,
        calories: row.try_get("calories")?,
        elevation_gain: row.try_get("elevation_gain")?,
        elevation_loss: row.try_get("elevation_loss")?,
        avg_speed: row.try_get("avg_speed")?,
        max_speed: row.try_get("max_speed")?,
        total_sets: row.try_get("total_sets")?,
        total_reps: row.try_get("total_reps")?,
        total_weight_kg: row.try_get("total_weight_kg")?,
        details_synced: row.try_get("details_synced")?,
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(crate::errors::SyncError::from)?
            .with_timezone(&Utc),
        updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map_err(crate::errors::SyncError::from)?
            .with_timezone(&Utc),
    })
}

fn row_to_exercise_set(row: &sqlx::sqlite::SqliteRow) -> SyncResult<ExerciseSet> {
    let set_type: String = row.try_get("set_type")?;
    Ok(ExerciseSet {
        user_id: row.try_get("user_id")?,
        activity_id: row.try_get("activity_id")?,
        set_order: row.try_get("set_order")?,
        exercise_category: row.try_get("exercise_category")?,
        exercise_name: row.try_get("exercise_name")?,
        set_type: if set_type == "REST" { SetType::Rest } else { SetType::Active },
        repetition_count: row.try_get("repetition_count")?,
        weight_grams: row.try_get("weight_grams")?,
        duration_seconds: row.try_get("duration_seconds")?,
        start_time: row.try_get("start_time")?,
    })
}

fn row_to_split(row: &sqlx::sqlite::SqliteRow) -> SyncResult<ActivitySplit> {
    let intensity_type: String = row.try_get("intensity_type")?;
    Ok(ActivitySplit {
        user_id: row.try_get("user_id")?,
        activity_id: row.try_get("activity_id")?,
        lap_index: row.try_get("lap_index")?,
        start_time: row.try_get("start_time")?,
        duration_seconds: row.try_get("duration_seconds")?,
        moving_duration_seconds: row.try_get("moving_duration_seconds")?,
        distance_meters: row.try_get("distance_meters")?,
        avg_speed: row.try_get("avg_speed")?,
        max_speed: row.try_get("max_speed")?,
        avg_moving_speed: row.try_get("avg_moving_speed")?,
        avg_heart_rate: row.try_get("avg_heart_rate")?,
        max_heart_rate: row.try_get("max_heart_rate")?,
        elevation_gain: row.try_get("elevation_gain")?,
        elevation_loss: row.try_get("elevation_loss")?,
        max_elevation: row.try_get("max_elevation")?,
        min_elevation: row.try_get("min_elevation")?,
        avg_cadence: row.try_get("avg_cadence")?,
        max_cadence: row.try_get("max_cadence")?,
        calories: row.try_get("calories")?,
        start_lat: row.try_get("start_lat")?,
        start_lon: row.try_get("start_lon")?,
        end_lat: row.try_get("end_lat")?,
        end_lon: row.try_get("end_lon")?,
        intensity_type: if intensity_type == "REST" {
            IntensityType::Rest
        } else {
            IntensityType::Active
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_activity(id: &str, date: &str) -> Activity {
        let now = Utc::now();
        Activity {
            user_id: 1,
            activity_id: id.to_string(),
            activity_date: NaiveDate::from_str(date).unwrap(),
            name: Some("Morning Run".into()),
            activity_type: Some("running".into()),
            duration_seconds: Some(1800),
            avg_heart_rate: Some(140),
            max_heart_rate: Some(165),
            training_load: Some(80.0),
            start_time: Some(format!("{date} 06:00:00")),
            distance_meters: Some(5000.0),
            calories: Some(350),
            elevation_gain: Some(20.0),
            elevation_loss: Some(18.0),
            avg_speed: None,
            max_speed: None,
            total_sets: None,
            total_reps: None,
            total_weight_kg: None,
            details_synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn detail_sync_merge_preserves_list_sync_fields() {
        let store = Store::connect_in_memory().await.unwrap();
        let activity = sample_activity("999", "2026-01-01");
        store.store_activity(&activity).await.unwrap();

        let detail_patch = Activity {
            name: None,
            activity_type: None,
            duration_seconds: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            training_load: None,
            start_time: None,
            distance_meters: None,
            calories: None,
            elevation_gain: None,
            elevation_loss: None,
            total_sets: Some(3),
            total_reps: Some(24),
            total_weight_kg: Some(1300.0),
            details_synced: true,
            ..sample_activity("999", "2026-01-01")
        };
        store.store_activity(&detail_patch).await.unwrap();

        let merged = store.get_activity(1, "999").await.unwrap().unwrap();
        assert_eq!(merged.name.as_deref(), Some("Morning Run"));
        assert_eq!(merged.total_sets, Some(3));
        assert_eq!(merged.total_reps, Some(24));
        assert!(merged.details_synced);
    }

    #[tokio::test]
    async fn exercise_sets_round_trip_and_replace() {
        let store = Store::connect_in_memory().await.unwrap();
        let sets = vec![ExerciseSet {
            user_id: 1,
            activity_id: "999".into(),
            set_order: 0,
            exercise_category: Some("BENCH_PRESS".into()),
            exercise_name: None,
            set_type: SetType::Active,
            repetition_count: Some(10),
            weight_grams: Some(50_000),
            duration_seconds: None,
            start_time: None,
        }];
        store.store_exercise_sets(1, "999", &sets).await.unwrap();
        let stored = store.get_exercise_sets(1, "999").await.unwrap();
        assert_eq!(stored.len(), 1);

        store.store_exercise_sets(1, "999", &[]).await.unwrap();
        let stored_after_replace = store.get_exercise_sets(1, "999").await.unwrap();
        assert!(stored_after_replace.is_empty());
    }
}
