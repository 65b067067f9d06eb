// ABOUTME: Activity, ExerciseSet, and ActivitySplit (lap) row types
// ABOUTME: Grounded on teacher src/providers/garmin_provider.rs::GarminActivityResponse field set
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row per `(user_id, activity_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub user_id: i64,
    pub activity_id: String,
    pub activity_date: chrono::NaiveDate,
    pub name: Option<String>,
    pub activity_type: Option<String>,
    pub duration_seconds: Option<i64>,
    pub avg_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub training_load: Option<f64>,
    pub start_time: Option<String>,
    pub distance_meters: Option<f64>,
    pub calories: Option<i64>,
    pub elevation_gain: Option<f64>,
    pub elevation_loss: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub total_sets: Option<i64>,
    pub total_reps: Option<i64>,
    pub total_weight_kg: Option<f64>,
    pub details_synced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `set_type` discriminant for `ExerciseSet` and `intensity_type` for `ActivitySplit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SetType {
    Active,
    Rest,
}

impl SetType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Rest => "REST",
        }
    }
}

/// Same tag values as `SetType`, kept as a distinct type so a lap's intensity
/// and a set's activity state aren't silently interchangeable at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IntensityType {
    Active,
    Rest,
}

impl IntensityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Rest => "REST",
        }
    }
}

/// One row per `(user_id, activity_id, set_order)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    pub user_id: i64,
    pub activity_id: String,
    pub set_order: i64,
    pub exercise_category: Option<String>,
    pub exercise_name: Option<String>,
    pub set_type: SetType,
    pub repetition_count: Option<i64>,
    pub weight_grams: Option<i64>,
    pub duration_seconds: Option<f64>,
    pub start_time: Option<String>,
}

/// One row per `(user_id, activity_id, lap_index)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivitySplit {
    pub user_id: i64,
    pub activity_id: String,
    pub lap_index: i64,
    pub start_time: Option<String>,
    pub duration_seconds: Option<f64>,
    pub moving_duration_seconds: Option<f64>,
    pub distance_meters: Option<f64>,
    pub avg_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub avg_moving_speed: Option<f64>,
    pub avg_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub elevation_gain: Option<f64>,
    pub elevation_loss: Option<f64>,
    pub max_elevation: Option<f64>,
    pub min_elevation: Option<f64>,
    pub avg_cadence: Option<f64>,
    pub max_cadence: Option<f64>,
    pub calories: Option<i64>,
    pub start_lat: Option<f64>,
    pub start_lon: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lon: Option<f64>,
    pub intensity_type: IntensityType,
}

impl ActivitySplit {
    /// Pace in minutes/km, computed on read rather than stored (spec.md §4.11).
    #[must_use]
    pub fn pace_min_per_km(&self) -> Option<f64> {
        match (self.duration_seconds, self.distance_meters) {
            (Some(duration_s), Some(distance_m)) if distance_m > 0.0 => {
                Some((duration_s / 60.0) / (distance_m / 1000.0))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_is_none_for_zero_distance() {
        let split = ActivitySplit {
            user_id: 1,
            activity_id: "1".into(),
            lap_index: 0,
            start_time: None,
            duration_seconds: Some(300.0),
            moving_duration_seconds: None,
            distance_meters: Some(0.0),
            avg_speed: None,
            max_speed: None,
            avg_moving_speed: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            elevation_gain: None,
            elevation_loss: None,
            max_elevation: None,
            min_elevation: None,
            avg_cadence: None,
            max_cadence: None,
            calories: None,
            start_lat: None,
            start_lon: None,
            end_lat: None,
            end_lon: None,
            intensity_type: IntensityType::Active,
        };
        assert_eq!(split.pace_min_per_km(), None);
    }

    #[test]
    fn pace_matches_formula() {
        let split = ActivitySplit {
            user_id: 1,
            activity_id: "1".into(),
            lap_index: 0,
            start_time: None,
            duration_seconds: Some(300.0),
            moving_duration_seconds: None,
            distance_meters: Some(1000.0),
            avg_speed: None,
            max_speed: None,
            avg_moving_speed: None,
            avg_heart_rate: None,
            max_heart_rate: None,
            elevation_gain: None,
            elevation_loss: None,
            max_elevation: None,
            min_elevation: None,
            avg_cadence: None,
            max_cadence: None,
            calories: None,
            start_lat: None,
            start_lon: None,
            end_lat: None,
            end_lon: None,
            intensity_type: IntensityType::Active,
        };
        assert_eq!(split.pace_min_per_km(), Some(5.0));
    }
}
