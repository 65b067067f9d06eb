// ABOUTME: The wide per-(user, date) DailyHealthRow field set, as a mergeable partial struct
// ABOUTME: Grounded on teacher src/models/health.rs field-density and per-field doc style
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A partial set of `DailyHealthRow` columns contributed by one metric kind.
///
/// Every field is nullable. Multiple metric kinds merge into the same
/// `(user_id, date)` row; the merge never lets a null field clobber an
/// existing non-null value (spec.md §3, §4.9, invariant 2).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyHealthFields {
    pub steps: Option<i64>,
    pub step_goal: Option<i64>,
    pub distance_meters: Option<f64>,
    pub total_calories: Option<i64>,
    pub active_calories: Option<i64>,
    pub bmr_calories: Option<i64>,
    pub resting_heart_rate: Option<i64>,
    pub min_heart_rate: Option<i64>,
    pub max_heart_rate: Option<i64>,
    pub avg_heart_rate: Option<i64>,
    pub avg_stress: Option<f64>,
    pub max_stress: Option<f64>,
    pub body_battery_high: Option<i64>,
    pub body_battery_low: Option<i64>,
    pub sleep_duration_hours: Option<f64>,
    pub sleep_deep_hours: Option<f64>,
    pub sleep_light_hours: Option<f64>,
    pub sleep_rem_hours: Option<f64>,
    pub sleep_awake_hours: Option<f64>,
    pub sleep_deep_pct: Option<f64>,
    pub sleep_light_pct: Option<f64>,
    pub sleep_rem_pct: Option<f64>,
    pub sleep_awake_pct: Option<f64>,
    pub avg_spo2: Option<f64>,
    pub avg_respiration: Option<f64>,
    pub waking_respiration: Option<f64>,
    pub sleep_respiration: Option<f64>,
    pub lowest_respiration: Option<f64>,
    pub highest_respiration: Option<f64>,
    pub training_readiness_score: Option<i64>,
    pub training_readiness_level: Option<String>,
    pub training_readiness_feedback: Option<String>,
    pub hrv_weekly_avg: Option<f64>,
    pub hrv_last_night_avg: Option<f64>,
    pub hrv_status: Option<String>,
    pub sleep_score: Option<i64>,
    pub sleep_score_qualifier: Option<String>,
    pub sleep_bedtime: Option<String>,
    pub sleep_wake_time: Option<String>,
    pub sleep_need_minutes: Option<i64>,
    pub skin_temp_deviation_c: Option<f64>,
}

impl DailyHealthFields {
    /// True if every field is null — signals a `SKIPPED` ledger outcome (spec.md §4.10 step 4).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay `other`'s non-null fields onto `self`, leaving `self`'s values
    /// untouched wherever `other` is null. This is the read-overlay-write
    /// merge semantics of `store_health_metric` (spec.md §4.9), implemented
    /// here as pure in-memory merge so the store layer can read-modify-write
    /// without duplicating the rule.
    pub fn merge_from(&mut self, other: &Self) {
        macro_rules! overlay {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }
        overlay!(steps);
        overlay!(step_goal);
        overlay!(distance_meters);
        overlay!(total_calories);
        overlay!(active_calories);
        overlay!(bmr_calories);
        overlay!(resting_heart_rate);
        overlay!(min_heart_rate);
        overlay!(max_heart_rate);
        overlay!(avg_heart_rate);
        overlay!(avg_stress);
        overlay!(max_stress);
        overlay!(body_battery_high);
        overlay!(body_battery_low);
        overlay!(sleep_duration_hours);
        overlay!(sleep_deep_hours);
        overlay!(sleep_light_hours);
        overlay!(sleep_rem_hours);
        overlay!(sleep_awake_hours);
        overlay!(sleep_deep_pct);
        overlay!(sleep_light_pct);
        overlay!(sleep_rem_pct);
        overlay!(sleep_awake_pct);
        overlay!(avg_spo2);
        overlay!(avg_respiration);
        overlay!(waking_respiration);
        overlay!(sleep_respiration);
        overlay!(lowest_respiration);
        overlay!(highest_respiration);
        overlay!(training_readiness_score);
        overlay!(training_readiness_level);
        overlay!(training_readiness_feedback);
        overlay!(hrv_weekly_avg);
        overlay!(hrv_last_night_avg);
        overlay!(hrv_status);
        overlay!(sleep_score);
        overlay!(sleep_score_qualifier);
        overlay!(sleep_bedtime);
        overlay!(sleep_wake_time);
        overlay!(sleep_need_minutes);
        overlay!(skin_temp_deviation_c);
    }
}

/// Key for a daily health row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DailyHealthKey {
    pub user_id: i64,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_never_lets_null_clobber_existing_value() {
        let mut existing = DailyHealthFields {
            steps: Some(12_500),
            resting_heart_rate: Some(55),
            ..Default::default()
        };
        let incoming = DailyHealthFields {
            steps: None,
            resting_heart_rate: Some(52),
            ..Default::default()
        };
        existing.merge_from(&incoming);
        assert_eq!(existing.steps, Some(12_500));
        assert_eq!(existing.resting_heart_rate, Some(52));
    }

    #[test]
    fn empty_fields_detected() {
        assert!(DailyHealthFields::default().is_empty());
        let non_empty = DailyHealthFields {
            steps: Some(1),
            ..Default::default()
        };
        assert!(!non_empty.is_empty());
    }
}
