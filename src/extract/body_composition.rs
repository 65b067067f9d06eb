// ABOUTME: Body composition range-endpoint JSON parsing
// ABOUTME: Field names grounded on original_source garmy/metrics/body_composition.py BodyCompositionEntry
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::SyncResult;
use crate::models::BodyCompositionEntry;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateWeightEntry {
    calendar_date: String,
    weight: Option<i64>,
    bmi: Option<f64>,
    body_fat: Option<f64>,
    body_water: Option<f64>,
    bone_mass: Option<f64>,
    muscle_mass: Option<f64>,
    visceral_fat: Option<f64>,
    metabolic_age: Option<i64>,
    physique_rating: Option<f64>,
    source_type: Option<String>,
    timestamp_gmt: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeightRangeResponse {
    #[serde(default)]
    date_weight_list: Vec<DateWeightEntry>,
}

/// Parse `/weight-service/weight/range` (spec.md §4.10 phase 3, body
/// composition synced once per run in range mode rather than per-date).
///
/// # Errors
///
/// Returns [`crate::errors::SyncError::Api`] if the body does not match the
/// expected shape, or if an entry's `calendarDate` is not a valid date.
pub fn parse_body_composition_range(
    user_id: i64,
    raw: &serde_json::Value,
) -> SyncResult<Vec<BodyCompositionEntry>> {
    let r: WeightRangeResponse = serde_json::from_value(raw.clone())?;
    r.date_weight_list
        .into_iter()
        .map(|e| to_entry(user_id, e))
        .collect()
}

fn to_entry(user_id: i64, e: DateWeightEntry) -> SyncResult<BodyCompositionEntry> {
    let measurement_date = NaiveDate::parse_from_str(&e.calendar_date, "%Y-%m-%d")?;
    let timestamp_gmt = e
        .timestamp_gmt
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(|| measurement_date.and_hms_opt(0, 0, 0).unwrap().and_utc());

    Ok(BodyCompositionEntry {
        user_id,
        measurement_date,
        timestamp_gmt,
        weight_grams: e.weight,
        bmi: e.bmi,
        body_fat_pct: e.body_fat,
        body_water_pct: e.body_water,
        bone_mass_g: e.bone_mass.map(|v| v.round() as i64),
        muscle_mass_g: e.muscle_mass.map(|v| v.round() as i64),
        visceral_fat: e.visceral_fat,
        metabolic_age: e.metabolic_age,
        physique_rating: e.physique_rating.map(|v| v.to_string()),
        source_type: e.source_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weight_range_response() {
        let raw = serde_json::json!({
            "dateWeightList": [
                {
                    "calendarDate": "2026-01-01",
                    "weight": 72_500,
                    "bmi": 22.1,
                    "bodyFat": 15.4,
                    "sourceType": "INDEX_SCALE",
                    "timestampGmt": 1_767_225_600_000_i64
                }
            ]
        });
        let entries = parse_body_composition_range(1, &raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weight_grams, Some(72_500));
        assert_eq!(entries[0].source_type.as_deref(), Some("INDEX_SCALE"));
    }
}
