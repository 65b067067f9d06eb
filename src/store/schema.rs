// ABOUTME: Schema migrations for the local SQLite store
// ABOUTME: Grounded on teacher src/database/mod.rs/user_oauth_tokens.rs CREATE TABLE IF NOT EXISTS + index pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use sqlx::SqlitePool;

/// Tables the engine expects to exist; checked by `validate_schema`.
pub const EXPECTED_TABLES: &[&str] = &[
    "daily_health",
    "activities",
    "exercise_sets",
    "activity_splits",
    "timeseries_points",
    "body_composition",
    "sync_status",
];

/// Additive, idempotent migrations. `CREATE TABLE IF NOT EXISTS` and
/// `CREATE INDEX IF NOT EXISTS` make re-running this on every startup safe;
/// no destructive migration is ever issued (spec.md §4.9).
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn migrate(pool: &SqlitePool) -> SyncResult<()> {
    migrate_daily_health(pool).await?;
    migrate_activities(pool).await?;
    migrate_exercise_sets(pool).await?;
    migrate_activity_splits(pool).await?;
    migrate_timeseries(pool).await?;
    migrate_body_composition(pool).await?;
    migrate_sync_status(pool).await?;
    Ok(())
}

async fn migrate_daily_health(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS daily_health (
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            steps INTEGER,
            step_goal INTEGER,
            distance_meters REAL,
            total_calories INTEGER,
            active_calories INTEGER,
            bmr_calories INTEGER,
            resting_heart_rate INTEGER,
            min_heart_rate INTEGER,
            max_heart_rate INTEGER,
            avg_heart_rate INTEGER,
            avg_stress REAL,
            max_stress REAL,
            body_battery_high INTEGER,
            body_battery_low INTEGER,
            sleep_duration_hours REAL,
            sleep_deep_hours REAL,
            sleep_light_hours REAL,
            sleep_rem_hours REAL,
            sleep_awake_hours REAL,
            sleep_deep_pct REAL,
            sleep_light_pct REAL,
            sleep_rem_pct REAL,
            sleep_awake_pct REAL,
            avg_spo2 REAL,
            avg_respiration REAL,
            waking_respiration REAL,
            sleep_respiration REAL,
            lowest_respiration REAL,
            highest_respiration REAL,
            training_readiness_score INTEGER,
            training_readiness_level TEXT,
            training_readiness_feedback TEXT,
            hrv_weekly_avg REAL,
            hrv_last_night_avg REAL,
            hrv_status TEXT,
            sleep_score INTEGER,
            sleep_score_qualifier TEXT,
            sleep_bedtime TEXT,
            sleep_wake_time TEXT,
            sleep_need_minutes INTEGER,
            skin_temp_deviation_c REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, date)
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn migrate_activities(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS activities (
            user_id INTEGER NOT NULL,
            activity_id TEXT NOT NULL,
            activity_date TEXT NOT NULL,
            name TEXT,
            activity_type TEXT,
            duration_seconds INTEGER,
            avg_heart_rate INTEGER,
            max_heart_rate INTEGER,
            training_load REAL,
            start_time TEXT,
            distance_meters REAL,
            calories INTEGER,
            elevation_gain REAL,
            elevation_loss REAL,
            avg_speed REAL,
            max_speed REAL,
            total_sets INTEGER,
            total_reps INTEGER,
            total_weight_kg REAL,
            details_synced INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (user_id, activity_id)
        )
        ",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_activities_user_date ON activities(user_id, activity_date)")
        .execute(pool)
        .await?;
    Ok(())
}

async fn migrate_exercise_sets(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS exercise_sets (
            user_id INTEGER NOT NULL,
            activity_id TEXT NOT NULL,
            set_order INTEGER NOT NULL,
            exercise_category TEXT,
            exercise_name TEXT,
            set_type TEXT NOT NULL,
            repetition_count INTEGER,
            weight_grams INTEGER,
            duration_seconds REAL,
            start_time TEXT,
            PRIMARY KEY (user_id, activity_id, set_order)
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn migrate_activity_splits(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS activity_splits (
            user_id INTEGER NOT NULL,
            activity_id TEXT NOT NULL,
            lap_index INTEGER NOT NULL,
            start_time TEXT,
            duration_seconds REAL,
            moving_duration_seconds REAL,
            distance_meters REAL,
            avg_speed REAL,
            max_speed REAL,
            avg_moving_speed REAL,
            avg_heart_rate INTEGER,
            max_heart_rate INTEGER,
            elevation_gain REAL,
            elevation_loss REAL,
            max_elevation REAL,
            min_elevation REAL,
            avg_cadence REAL,
            max_cadence REAL,
            calories INTEGER,
            start_lat REAL,
            start_lon REAL,
            end_lat REAL,
            end_lon REAL,
            intensity_type TEXT NOT NULL,
            PRIMARY KEY (user_id, activity_id, lap_index)
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn migrate_timeseries(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS timeseries_points (
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            metric_kind TEXT NOT NULL,
            timestamp_ms INTEGER NOT NULL,
            value REAL NOT NULL,
            metadata TEXT,
            PRIMARY KEY (user_id, metric_kind, timestamp_ms)
        )
        ",
    )
    .execute(pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_timeseries_user_kind_date ON timeseries_points(user_id, metric_kind, date)",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn migrate_body_composition(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS body_composition (
            user_id INTEGER NOT NULL,
            measurement_date TEXT NOT NULL,
            timestamp_gmt TEXT NOT NULL,
            weight_grams INTEGER,
            bmi REAL,
            body_fat_pct REAL,
            body_water_pct REAL,
            bone_mass_g INTEGER,
            muscle_mass_g INTEGER,
            visceral_fat REAL,
            metabolic_age INTEGER,
            physique_rating TEXT,
            source_type TEXT,
            PRIMARY KEY (user_id, timestamp_gmt)
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn migrate_sync_status(pool: &SqlitePool) -> SyncResult<()> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS sync_status (
            user_id INTEGER NOT NULL,
            sync_date TEXT NOT NULL,
            metric_kind TEXT NOT NULL,
            state TEXT NOT NULL,
            synced_at TEXT,
            error_message TEXT,
            PRIMARY KEY (user_id, sync_date, metric_kind)
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}
