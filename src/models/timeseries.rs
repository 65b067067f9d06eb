// ABOUTME: Intraday time-series points and body composition rows
// ABOUTME: Grounded on teacher src/models/health.rs value-with-metadata shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One intraday sample for a time-series-bearing metric kind (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesPoint {
    pub user_id: i64,
    pub date: NaiveDate,
    pub metric_kind: String,
    pub timestamp_ms: i64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One row per `(user_id, measurement_date)`, populated by the body
/// composition range-mode fetch (spec.md §4.10 phase 3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyCompositionEntry {
    pub user_id: i64,
    pub measurement_date: NaiveDate,
    pub timestamp_gmt: DateTime<Utc>,
    pub weight_grams: Option<i64>,
    pub bmi: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub body_water_pct: Option<f64>,
    pub bone_mass_g: Option<i64>,
    pub muscle_mass_g: Option<i64>,
    pub visceral_fat: Option<f64>,
    pub metabolic_age: Option<i64>,
    pub physique_rating: Option<String>,
    pub source_type: Option<String>,
}
