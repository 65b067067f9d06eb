// ABOUTME: Secondary per-activity fetches: exercise sets (strength) and splits (cardio)
// ABOUTME: Grounded on teacher src/providers/garmin_provider.rs::get_activities_multi_page paged-fetch + error-isolation pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::api::Api;
use crate::errors::SyncResult;
use crate::extract::{parse_exercise_sets, parse_splits};
use crate::models::{Activity, ActivityClass, ActivitySplit, SetType};
use crate::store::Store;

/// Strength-training aggregate over `ACTIVE` sets, per spec.md §4.11.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct StrengthSummary {
    total_sets: i64,
    total_reps: i64,
    total_weight_kg: f64,
}

fn summarize_sets(sets: &[crate::models::ExerciseSet]) -> StrengthSummary {
    let mut summary = StrengthSummary::default();
    for set in sets {
        if set.set_type != SetType::Active {
            continue;
        }
        summary.total_sets += 1;
        let reps = set.repetition_count.unwrap_or(0);
        summary.total_reps += reps;
        if let Some(weight_grams) = set.weight_grams {
            summary.total_weight_kg += (weight_grams * reps) as f64 / 1000.0;
        }
    }
    summary
}

/// Cardio aggregate over `ACTIVE` splits, per spec.md §4.11.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CardioSummary {
    pub(crate) distance_meters: Option<f64>,
    pub(crate) calories: Option<i64>,
    pub(crate) elevation_gain: Option<f64>,
}

pub(crate) fn summarize_splits(splits: &[ActivitySplit]) -> CardioSummary {
    let active: Vec<&ActivitySplit> = splits
        .iter()
        .filter(|s| s.intensity_type == crate::models::IntensityType::Active)
        .collect();
    if active.is_empty() {
        return CardioSummary::default();
    }
    let distance_meters = active.iter().filter_map(|s| s.distance_meters).reduce(|a, b| a + b);
    let calories = active.iter().filter_map(|s| s.calories).reduce(|a, b| a + b);
    let elevation_gain = active.iter().filter_map(|s| s.elevation_gain).reduce(|a, b| a + b);
    CardioSummary {
        distance_meters,
        calories,
        elevation_gain,
    }
}

/// Fetch and store exercise sets for a strength activity, then merge the
/// computed summary onto the activity row. Network/parse errors are
/// returned to the caller for isolation there, per spec.md §4.11.
async fn sync_strength_details(api: &Api, store: &Store, activity: &Activity) -> SyncResult<()> {
    let raw: serde_json::Value = api
        .connectapi(
            &format!("/activity-service/activity/{}/exerciseSets", activity.activity_id),
            &[],
        )
        .await?;
    let sets = parse_exercise_sets(activity.user_id, &activity.activity_id, &raw)?;
    store.store_exercise_sets(activity.user_id, &activity.activity_id, &sets).await?;

    let summary = summarize_sets(&sets);
    let mut updated = activity.clone();
    updated.total_sets = Some(summary.total_sets);
    updated.total_reps = Some(summary.total_reps);
    updated.total_weight_kg = Some(summary.total_weight_kg);
    store.store_activity(&updated).await?;
    Ok(())
}

/// Fetch and store splits for a cardio activity (skipping if already
/// stored), then backfill `{distance, calories, elevation_gain}` on the
/// activity row if they are null, per spec.md §4.11.
async fn sync_cardio_details(api: &Api, store: &Store, activity: &Activity) -> SyncResult<()> {
    if store.activity_has_splits(activity.user_id, &activity.activity_id).await? {
        return Ok(());
    }
    let raw: serde_json::Value = api
        .connectapi(
            &format!("/activity-service/activity/{}/splits", activity.activity_id),
            &[],
        )
        .await?;
    let splits = parse_splits(activity.user_id, &activity.activity_id, &raw)?;
    store.store_activity_splits(activity.user_id, &activity.activity_id, &splits).await?;
    backfill_from_splits(store, activity, &splits).await
}

async fn backfill_from_splits(
    store: &Store,
    activity: &Activity,
    splits: &[ActivitySplit],
) -> SyncResult<()> {
    if activity.distance_meters.is_some() {
        return Ok(());
    }
    let summary = summarize_splits(splits);
    if summary.distance_meters.is_none() && summary.calories.is_none() && summary.elevation_gain.is_none() {
        return Ok(());
    }
    let mut updated = activity.clone();
    updated.distance_meters = summary.distance_meters;
    updated.calories = summary.calories;
    updated.elevation_gain = summary.elevation_gain;
    store.store_activity(&updated).await
}

/// Dispatch detail sync by activity class (spec.md §4.10 step 5, §4.11).
/// Returns whether a network fetch was attempted, so the caller knows
/// whether to apply `rate_limit_delay`. The activity's `details_synced`
/// flag is the caller's responsibility to set, since it is set regardless
/// of whether the fetch itself found anything to store.
///
/// # Errors
///
/// Propagates fetch/parse/store errors; callers isolate these per
/// spec.md §4.11 rather than failing the parent activity's ledger row.
pub async fn sync_activity_details(api: &Api, store: &Store, activity: &Activity) -> SyncResult<bool> {
    match ActivityClass::classify(activity.activity_type.as_deref().unwrap_or_default()) {
        ActivityClass::Strength => {
            sync_strength_details(api, store, activity).await?;
            Ok(true)
        }
        ActivityClass::Cardio => {
            sync_cardio_details(api, store, activity).await?;
            Ok(true)
        }
        ActivityClass::Other => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IntensityType, SetType};

    fn set(set_type: SetType, reps: Option<i64>, weight_grams: Option<i64>) -> crate::models::ExerciseSet {
        crate::models::ExerciseSet {
            user_id: 1,
            activity_id: "1".into(),
            set_order: 0,
            exercise_category: None,
            exercise_name: None,
            set_type,
            repetition_count: reps,
            weight_grams,
            duration_seconds: None,
            start_time: None,
        }
    }

    #[test]
    fn strength_summary_ignores_rest_sets() {
        let sets = vec![
            set(SetType::Active, Some(10), Some(60_000)),
            set(SetType::Active, Some(8), Some(60_000)),
            set(SetType::Rest, None, None),
        ];
        let summary = summarize_sets(&sets);
        assert_eq!(summary.total_sets, 2);
        assert_eq!(summary.total_reps, 18);
        assert_eq!(summary.total_weight_kg, 1080.0);
    }

    fn split(intensity: IntensityType, distance: Option<f64>, calories: Option<i64>) -> ActivitySplit {
        ActivitySplit {
            user_id: 1,
            activity_id: "1".into(),
            lap_index: 0,
            start_time: None,
            duration_seconds: None,
            moving_duration_seconds: None,
            distance_meters: distance,
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
            calories,
            start_lat: None,
            start_lon: None,
            end_lat: None,
            end_lon: None,
            intensity_type: intensity,
        }
    }

    #[test]
    fn cardio_summary_sums_only_active_splits() {
        let splits = vec![
            split(IntensityType::Active, Some(1000.0), Some(50)),
            split(IntensityType::Active, Some(2000.0), Some(80)),
            split(IntensityType::Rest, Some(9999.0), Some(9999)),
        ];
        let summary = summarize_splits(&splits);
        assert_eq!(summary.distance_meters, Some(3000.0));
        assert_eq!(summary.calories, Some(130));
    }
}
