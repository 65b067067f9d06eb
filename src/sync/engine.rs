// ABOUTME: Sync engine entry point: date-ordered per-metric, activities, and body-composition phases
// ABOUTME: Phase structure grounded in spec.md §4.10; persistence idioms from teacher src/database/mod.rs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::activities::ActivitiesCursor;
use crate::api::Api;
use crate::config::Config;
use crate::errors::{SyncError, SyncResult};
use crate::extract::{parse_body_composition_range, parse_daily_metric};
use crate::metrics::{body_composition_range_endpoint, MetricRegistry};
use crate::models::{Activity, MetricKind, SyncState};
use crate::reporter::ProgressReporter;
use crate::store::Store;
use crate::sync::detail::sync_activity_details;
use chrono::NaiveDate;

/// Outcome counters for one `sync_range` invocation (spec.md §4.10 step 7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_tasks: usize,
}

/// Composes an authenticated [`Api`] with a [`Store`] and [`Config`] to run
/// date-ranged syncs. Holds no mutable state of its own; every method takes
/// `&self`, matching the "no self-referential composed managers" redesign
/// (SPEC_FULL.md).
#[derive(Clone)]
pub struct SyncEngine {
    api: Api,
    store: Store,
    config: Config,
}

impl SyncEngine {
    #[must_use]
    pub const fn new(api: Api, store: Store, config: Config) -> Self {
        Self { api, store, config }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Sync `[start_date, end_date]` inclusive for `user_id`, restricted to
    /// `kinds`. Guarded by `Config.max_sync_span` — exceeding it fails before
    /// any I/O (spec.md §4.10).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SchemaValidation`] if the range is inverted or
    /// exceeds the configured maximum span. Per-task errors are isolated
    /// into the ledger and never propagate from here.
    pub async fn sync_range(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        kinds: &[MetricKind],
        reporter: &dyn ProgressReporter,
    ) -> SyncResult<SyncSummary> {
        if end_date < start_date {
            return Err(SyncError::schema_validation("end_date precedes start_date"));
        }
        let span = end_date - start_date;
        if span > self.config.max_sync_span {
            return Err(SyncError::schema_validation(format!(
                "range of {} days exceeds max_sync_span of {} days",
                span.num_days(),
                self.config.max_sync_span.num_days()
            )));
        }

        let per_date_kinds: Vec<MetricKind> = kinds
            .iter()
            .copied()
            .filter(|k| !matches!(k, MetricKind::Activities | MetricKind::BodyComposition))
            .collect();
        let has_activities = kinds.contains(&MetricKind::Activities);
        let has_body_composition = kinds.contains(&MetricKind::BodyComposition);

        let dates = date_range_inclusive(start_date, end_date);
        let total_tasks = dates.len() * per_date_kinds.len()
            + if has_activities { dates.len() } else { 0 }
            + usize::from(has_body_composition);

        for date in &dates {
            for kind in &per_date_kinds {
                self.store.create_sync_status(user_id, *date, kind.as_str()).await?;
            }
            if has_activities {
                self.store.create_sync_status(user_id, *date, "activities").await?;
            }
        }
        if has_body_composition {
            self.store
                .create_sync_status(user_id, start_date, MetricKind::BodyComposition.as_str())
                .await?;
        }

        reporter.start_sync(total_tasks);
        let mut summary = SyncSummary {
            total_tasks,
            ..SyncSummary::default()
        };

        for date in &dates {
            for kind in &per_date_kinds {
                self.sync_one_metric(user_id, *date, *kind, reporter, &mut summary).await;
            }
        }

        if has_activities {
            self.sync_activities_phase(user_id, &dates, reporter, &mut summary).await?;
        }

        if has_body_composition {
            self.sync_body_composition_phase(user_id, start_date, end_date, reporter, &mut summary)
                .await;
        }

        reporter.end_sync();
        Ok(summary)
    }

    async fn sync_one_metric(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: MetricKind,
        reporter: &dyn ProgressReporter,
        summary: &mut SyncSummary,
    ) {
        let name = kind.as_str();
        match self.store.get_sync_status(user_id, date, name).await {
            Ok(Some(status)) if status.state.should_skip_rerun() => {
                reporter.task_skipped(name, date);
                summary.skipped += 1;
                return;
            }
            Ok(_) => {}
            Err(error) => {
                reporter.task_failed(name, date, &error.to_string());
                summary.failed += 1;
                return;
            }
        }

        match self.fetch_and_store_metric(user_id, date, kind).await {
            Ok(true) => {
                let _ = self
                    .store
                    .update_sync_status(user_id, date, name, SyncState::Completed, None)
                    .await;
                reporter.task_complete(name, date);
                summary.completed += 1;
            }
            Ok(false) => {
                let _ = self
                    .store
                    .update_sync_status(user_id, date, name, SyncState::Skipped, None)
                    .await;
                reporter.task_skipped(name, date);
                summary.skipped += 1;
            }
            Err(error) => {
                let message = error.to_string();
                let _ = self
                    .store
                    .update_sync_status(user_id, date, name, SyncState::Failed, Some(&message))
                    .await;
                reporter.task_failed(name, date, &message);
                summary.failed += 1;
            }
        }
    }

    /// Returns `Ok(true)` if anything was stored, `Ok(false)` if the
    /// response parsed to an entirely empty field set (spec.md §4.10 step 4).
    async fn fetch_and_store_metric(
        &self,
        user_id: i64,
        date: NaiveDate,
        kind: MetricKind,
    ) -> SyncResult<bool> {
        let registry = MetricRegistry::new();
        let endpoint = registry.build_endpoint(kind, date, Some(user_id))?;
        let raw: serde_json::Value = self.api.connectapi(&format!("/{endpoint}"), &[]).await?;
        let extraction = parse_daily_metric(kind, user_id, date, &raw)?;
        let series = extraction.series().to_vec();
        let fields = extraction.into_fields();

        let mut stored_anything = false;
        if !fields.is_empty() {
            self.store.store_health_metric(user_id, date, &fields).await?;
            stored_anything = true;
        }
        if kind.has_time_series() && !series.is_empty() {
            self.store.store_timeseries_batch(user_id, kind.as_str(), &series).await?;
            stored_anything = true;
        }
        Ok(stored_anything)
    }

    /// Newest-to-oldest pass over `dates`, pulling activities per day from a
    /// forward cursor reset against the full range (spec.md §4.10 step 5;
    /// §5 "this ordering is load-bearing").
    async fn sync_activities_phase(
        &self,
        user_id: i64,
        dates: &[NaiveDate],
        reporter: &dyn ProgressReporter,
        summary: &mut SyncSummary,
    ) -> SyncResult<()> {
        let name = MetricKind::Activities.as_str();
        let mut cursor = ActivitiesCursor::new(self.api.clone(), user_id, self.config.activities_batch_size);
        cursor.initialize().await?;

        for date in dates.iter().rev() {
            match self.store.get_sync_status(user_id, *date, name).await {
                Ok(Some(status)) if status.state.should_skip_rerun() => {
                    reporter.task_skipped(name, *date);
                    summary.skipped += 1;
                    continue;
                }
                Ok(_) => {}
                Err(error) => {
                    reporter.task_failed(name, *date, &error.to_string());
                    summary.failed += 1;
                    continue;
                }
            }

            let outcome = self.sync_activities_for_date(&mut cursor, user_id, *date).await;
            match outcome {
                Ok(()) => {
                    reporter.task_complete(name, *date);
                    let _ = self
                        .store
                        .update_sync_status(user_id, *date, name, SyncState::Completed, None)
                        .await;
                    summary.completed += 1;
                }
                Err(error) => {
                    let message = error.to_string();
                    reporter.task_failed(name, *date, &message);
                    let _ = self
                        .store
                        .update_sync_status(user_id, *date, name, SyncState::Failed, Some(&message))
                        .await;
                    summary.failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn sync_activities_for_date(
        &self,
        cursor: &mut ActivitiesCursor,
        user_id: i64,
        date: NaiveDate,
    ) -> SyncResult<()> {
        let activities = cursor.get_activities_for_date(date).await?;
        for activity in activities {
            self.sync_one_activity(user_id, activity).await?;
        }
        Ok(())
    }

    async fn sync_one_activity(&self, user_id: i64, activity: Activity) -> SyncResult<()> {
        let already_stored = self.store.activity_exists(user_id, &activity.activity_id).await?;
        if already_stored {
            return Ok(());
        }
        self.store.store_activity(&activity).await?;

        let current = self
            .store
            .get_activity(user_id, &activity.activity_id)
            .await?
            .unwrap_or(activity);

        let fetched = sync_activity_details(&self.api, &self.store, &current).await;
        if let Err(error) = &fetched {
            tracing::warn!(activity_id = %current.activity_id, %error, "detail sync isolated, activity kept");
        }
        if matches!(fetched, Ok(true)) {
            tokio::time::sleep(self.config.rate_limit_delay).await;
        }

        let mut finalized = self
            .store
            .get_activity(user_id, &current.activity_id)
            .await?
            .unwrap_or(current);
        finalized.details_synced = true;
        self.store.store_activity(&finalized).await
    }

    /// One call for the entire range (spec.md §4.10 step 6).
    async fn sync_body_composition_phase(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reporter: &dyn ProgressReporter,
        summary: &mut SyncSummary,
    ) {
        let name = MetricKind::BodyComposition.as_str();
        match self.store.get_sync_status(user_id, start_date, name).await {
            Ok(Some(status)) if status.state.should_skip_rerun() => {
                reporter.task_skipped(name, end_date);
                summary.skipped += 1;
                return;
            }
            Ok(_) => {}
            Err(error) => {
                reporter.task_failed(name, end_date, &error.to_string());
                summary.failed += 1;
                return;
            }
        }

        match self.fetch_and_store_body_composition(user_id, start_date, end_date).await {
            Ok(()) => {
                reporter.task_complete(name, end_date);
                let _ = self
                    .store
                    .update_sync_status(user_id, start_date, name, SyncState::Completed, None)
                    .await;
                summary.completed += 1;
            }
            Err(error) => {
                let message = error.to_string();
                reporter.task_failed(name, end_date, &message);
                let _ = self
                    .store
                    .update_sync_status(user_id, start_date, name, SyncState::Failed, Some(&message))
                    .await;
                summary.failed += 1;
            }
        }
    }

    async fn fetch_and_store_body_composition(
        &self,
        user_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> SyncResult<()> {
        let endpoint = body_composition_range_endpoint(start_date, end_date);
        let raw: serde_json::Value = self.api.connectapi(&format!("/{endpoint}"), &[]).await?;
        let entries = parse_body_composition_range(user_id, &raw)?;
        for entry in &entries {
            self.store.store_body_composition(entry).await?;
            tokio::time::sleep(self.config.rate_limit_delay).await;
        }
        Ok(())
    }
}

fn date_range_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current);
        current += chrono::Duration::days(1);
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let dates = date_range_inclusive(start, end);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0], start);
        assert_eq!(dates[2], end);
    }

    #[test]
    fn single_day_range_has_one_date() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(date_range_inclusive(day, day), vec![day]);
    }
}
