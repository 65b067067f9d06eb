// ABOUTME: Activity list, exercise set, and split (lap) JSON parsing
// ABOUTME: Field names grounded on original_source garmy/metrics/activities.py ActivitySummary/typeKey shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::{Activity, ActivitySplit, ExerciseSet, IntensityType, SetType};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ActivityTypeDto {
    #[serde(rename = "typeKey")]
    type_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityListEntry {
    activity_id: i64,
    activity_name: Option<String>,
    activity_type: Option<ActivityTypeDto>,
    start_time_gmt: Option<String>,
    start_time_local: Option<String>,
    duration: Option<f64>,
    average_hr: Option<f64>,
    max_hr: Option<f64>,
    activity_training_load: Option<f64>,
    distance: Option<f64>,
    calories: Option<f64>,
    elevation_gain: Option<f64>,
    elevation_loss: Option<f64>,
}

/// Parse one page of `/activitylist-service/activities/search/activities`
/// (spec.md §4.8). Entries arrive newest-first; this function preserves
/// that order rather than sorting, since the pagination iterator depends
/// on it.
///
/// # Errors
///
/// Returns [`SyncError::Api`] if the page body is not a JSON array of the
/// expected shape.
pub fn parse_activities_page(user_id: i64, raw: &serde_json::Value) -> SyncResult<Vec<Activity>> {
    let entries: Vec<ActivityListEntry> = serde_json::from_value(raw.clone())?;
    entries
        .into_iter()
        .map(|e| to_activity(user_id, e))
        .collect()
}

fn to_activity(user_id: i64, e: ActivityListEntry) -> SyncResult<Activity> {
    let start_time = e.start_time_local.or(e.start_time_gmt.clone());
    let activity_date = e
        .start_time_gmt
        .as_deref()
        .and_then(|s| s.split(' ').next())
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| SyncError::api(0, "activity missing a parseable start date"))?;

    let now = Utc::now();
    Ok(Activity {
        user_id,
        activity_id: e.activity_id.to_string(),
        activity_date,
        name: e.activity_name,
        activity_type: e.activity_type.and_then(|t| t.type_key),
        duration_seconds: e.duration.map(|d| d.round() as i64),
        avg_heart_rate: e.average_hr.map(|h| h.round() as i64),
        max_heart_rate: e.max_hr.map(|h| h.round() as i64),
        training_load: e.activity_training_load,
        start_time,
        distance_meters: e.distance,
        calories: e.calories.map(|c| c.round() as i64),
        elevation_gain: e.elevation_gain,
        elevation_loss: e.elevation_loss,
        avg_speed: None,
        max_speed: None,
        total_sets: None,
        total_reps: None,
        total_weight_kg: None,
        details_synced: false,
        created_at: now,
        updated_at: now,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseSetEntry {
    exercise_category: Option<String>,
    exercise_name: Option<String>,
    set_type: Option<String>,
    repetition_count: Option<i64>,
    weight: Option<i64>,
    duration: Option<f64>,
    start_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExerciseSetsResponse {
    #[serde(default)]
    exercise_sets: Vec<ExerciseSetEntry>,
}

/// Parse `/activity-service/activity/{id}/exerciseSets` (strength detail sync, spec.md §4.11).
///
/// # Errors
///
/// Returns [`SyncError::Api`] if the body does not match the expected shape.
pub fn parse_exercise_sets(
    user_id: i64,
    activity_id: &str,
    raw: &serde_json::Value,
) -> SyncResult<Vec<ExerciseSet>> {
    let r: ExerciseSetsResponse = serde_json::from_value(raw.clone())?;
    Ok(r.exercise_sets
        .into_iter()
        .enumerate()
        .map(|(i, entry)| ExerciseSet {
            user_id,
            activity_id: activity_id.to_string(),
            set_order: i as i64,
            exercise_category: entry.exercise_category,
            exercise_name: entry.exercise_name,
            set_type: if entry.set_type.as_deref() == Some("REST") {
                SetType::Rest
            } else {
                SetType::Active
            },
            repetition_count: entry.repetition_count,
            weight_grams: entry.weight,
            duration_seconds: entry.duration,
            start_time: entry.start_time,
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitEntry {
    start_time_gmt: Option<String>,
    duration: Option<f64>,
    moving_duration: Option<f64>,
    distance: Option<f64>,
    average_speed: Option<f64>,
    max_speed: Option<f64>,
    average_moving_speed: Option<f64>,
    average_hr: Option<f64>,
    max_hr: Option<f64>,
    elevation_gain: Option<f64>,
    elevation_loss: Option<f64>,
    max_elevation: Option<f64>,
    min_elevation: Option<f64>,
    average_run_cadence: Option<f64>,
    max_run_cadence: Option<f64>,
    calories: Option<f64>,
    start_latitude: Option<f64>,
    start_longitude: Option<f64>,
    end_latitude: Option<f64>,
    end_longitude: Option<f64>,
    intensity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitsResponse {
    #[serde(default)]
    lap_dtos: Vec<SplitEntry>,
}

/// Parse `/activity-service/activity/{id}/splits` (cardio detail sync, spec.md §4.11).
///
/// # Errors
///
/// Returns [`SyncError::Api`] if the body does not match the expected shape.
pub fn parse_splits(
    user_id: i64,
    activity_id: &str,
    raw: &serde_json::Value,
) -> SyncResult<Vec<ActivitySplit>> {
    let r: SplitsResponse = serde_json::from_value(raw.clone())?;
    Ok(r.lap_dtos
        .into_iter()
        .enumerate()
        .map(|(i, entry)| ActivitySplit {
            user_id,
            activity_id: activity_id.to_string(),
            lap_index: i as i64,
            start_time: entry.start_time_gmt,
            duration_seconds: entry.duration,
            moving_duration_seconds: entry.moving_duration,
            distance_meters: entry.distance,
            avg_speed: entry.average_speed,
            max_speed: entry.max_speed,
            avg_moving_speed: entry.average_moving_speed,
            avg_heart_rate: entry.average_hr.map(|h| h.round() as i64),
            max_heart_rate: entry.max_hr.map(|h| h.round() as i64),
            elevation_gain: entry.elevation_gain,
            elevation_loss: entry.elevation_loss,
            max_elevation: entry.max_elevation,
            min_elevation: entry.min_elevation,
            avg_cadence: entry.average_run_cadence,
            max_cadence: entry.max_run_cadence,
            calories: entry.calories.map(|c| c.round() as i64),
            start_lat: entry.start_latitude,
            start_lon: entry.start_longitude,
            end_lat: entry.end_latitude,
            end_lon: entry.end_longitude,
            intensity_type: if entry.intensity_type.as_deref() == Some("REST") {
                IntensityType::Rest
            } else {
                IntensityType::Active
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_activity_list_preserving_order() {
        let raw = serde_json::json!([
            {
                "activityId": 2,
                "activityName": "Evening Run",
                "activityType": {"typeKey": "running"},
                "startTimeGmt": "2026-01-02 18:00:00",
                "duration": 1800.0,
                "averageHr": 145.0,
                "maxHr": 172.0
            },
            {
                "activityId": 1,
                "activityName": "Morning Run",
                "activityType": {"typeKey": "running"},
                "startTimeGmt": "2026-01-01 06:00:00",
                "duration": 1500.0
            }
        ]);
        let activities = parse_activities_page(1, &raw).unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].activity_id, "2");
        assert_eq!(activities[1].activity_id, "1");
    }

    #[test]
    fn parses_exercise_sets_with_rest_type() {
        let raw = serde_json::json!({
            "exerciseSets": [
                {"exerciseCategory": "BENCH_PRESS", "setType": "ACTIVE", "repetitionCount": 10, "weight": 60000},
                {"setType": "REST", "duration": 90.0}
            ]
        });
        let sets = parse_exercise_sets(1, "abc", &raw).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].set_type, SetType::Active);
        assert_eq!(sets[1].set_type, SetType::Rest);
    }
}
