// ABOUTME: Off-critical-path backfill operations over already-synced activities
// ABOUTME: Grounded on original_source/src/garmy/localdb/sync.py backfill_* operations, named in spec.md §4.10
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::api::Api;
use crate::errors::SyncResult;
use crate::models::ActivityClass;
use crate::store::Store;
use crate::sync::detail::{summarize_splits, sync_activity_details};
use tracing::warn;

/// Walk activities with `details_synced = false`, newest first, running
/// detail sync on each. Errors on an individual activity are isolated
/// (logged, not propagated) so one bad activity doesn't stall the backfill.
///
/// # Errors
///
/// Returns an error only if the initial query fails.
pub async fn backfill_activity_details(api: &Api, store: &Store, user_id: i64, limit: i64) -> SyncResult<usize> {
    let pending = store.get_activities_pending_details(user_id, limit).await?;
    let mut synced = 0;
    for activity in pending {
        match sync_activity_details(api, store, &activity).await {
            Ok(_) => {
                let mut updated = activity;
                updated.details_synced = true;
                if let Err(error) = store.store_activity(&updated).await {
                    warn!(activity_id = %updated.activity_id, %error, "backfill detail store failed");
                    continue;
                }
                synced += 1;
            }
            Err(error) => {
                warn!(activity_id = %activity.activity_id, %error, "backfill detail sync isolated");
            }
        }
    }
    Ok(synced)
}

/// Walk cardio activities with no stored splits, newest first, fetching and
/// storing them.
///
/// # Errors
///
/// Returns an error only if the initial query fails.
pub async fn backfill_activity_splits(api: &Api, store: &Store, user_id: i64, limit: i64) -> SyncResult<usize> {
    let candidates = store.get_activities_missing_splits(user_id, limit).await?;
    let mut synced = 0;
    for activity in candidates {
        let class = ActivityClass::classify(activity.activity_type.as_deref().unwrap_or_default());
        if class != ActivityClass::Cardio {
            continue;
        }
        match sync_activity_details(api, store, &activity).await {
            Ok(_) => synced += 1,
            Err(error) => {
                warn!(activity_id = %activity.activity_id, %error, "backfill splits sync isolated");
            }
        }
    }
    Ok(synced)
}

/// For activities with splits but a null `distance_meters`, recompute
/// `{distance, calories, elevation_gain}` from the stored splits and update
/// the activity row.
///
/// # Errors
///
/// Returns an error if a query or write fails.
pub async fn backfill_activity_distance_from_splits(store: &Store, user_id: i64) -> SyncResult<usize> {
    let candidates = store.get_activities_missing_distance_with_splits(user_id).await?;
    let mut updated_count = 0;
    for mut activity in candidates {
        let splits = store.get_activity_splits(user_id, &activity.activity_id).await?;
        let summary = summarize_splits(&splits);
        if summary.distance_meters.is_none() {
            continue;
        }
        activity.distance_meters = summary.distance_meters;
        activity.calories = summary.calories;
        activity.elevation_gain = summary.elevation_gain;
        store.store_activity(&activity).await?;
        updated_count += 1;
    }
    Ok(updated_count)
}
