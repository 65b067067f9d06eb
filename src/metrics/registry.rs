// ABOUTME: Declarative table of metric kind -> (endpoint template, needs-user-id, range-mode)
// ABOUTME: Grounded on teacher src/providers/registry.rs HashMap/factory registration pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::MetricKind;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Immutable description of how to reach one metric kind's endpoint.
///
/// Activities and body composition are special-cased by the sync engine
/// (pagination cursor, date-range bundle) rather than fetched per-date, but
/// they still carry a descriptor here so the registry remains the single
/// place that documents every kind's endpoint shape.
#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    /// Path template. `{date}` and `{user_id}` are substituted by
    /// [`MetricRegistry::build_endpoint`]; `Activities`/`BodyComposition`
    /// use their own builders instead (see `activities_page_endpoint` and
    /// `body_composition_range_endpoint`).
    pub endpoint_template: &'static str,
    pub requires_user_id: bool,
    pub range_mode: bool,
    pub description: &'static str,
}

const DESCRIPTORS: &[MetricDescriptor] = &[
    MetricDescriptor {
        kind: MetricKind::DailySummary,
        endpoint_template: "usersummary-service/usersummary/daily/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Daily summary aggregate (steps/calories/distance rollups live here too)",
    },
    MetricDescriptor {
        kind: MetricKind::Steps,
        endpoint_template: "usersummary-service/usersummary/daily/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Steps, shares the daily summary endpoint",
    },
    MetricDescriptor {
        kind: MetricKind::Calories,
        endpoint_template: "usersummary-service/usersummary/daily/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Calories, shares the daily summary endpoint",
    },
    MetricDescriptor {
        kind: MetricKind::Sleep,
        endpoint_template: "sleep-service/sleep/dailySleepData/{user_id}?date={date}",
        requires_user_id: true,
        range_mode: false,
        description: "Sleep stages, scores, and need",
    },
    MetricDescriptor {
        kind: MetricKind::BodyBattery,
        endpoint_template: "wellness-service/wellness/dailyStress/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Body battery time series (shares the dailyStress payload with Stress)",
    },
    MetricDescriptor {
        kind: MetricKind::Stress,
        endpoint_template: "wellness-service/wellness/dailyStress/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Stress level time series",
    },
    MetricDescriptor {
        kind: MetricKind::HeartRate,
        endpoint_template: "wellness-service/wellness/dailyHeartRate/{user_id}?date={date}",
        requires_user_id: true,
        range_mode: false,
        description: "Heart rate time series",
    },
    MetricDescriptor {
        kind: MetricKind::TrainingReadiness,
        endpoint_template: "metrics-service/metrics/trainingreadiness/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Training readiness score and contributors",
    },
    MetricDescriptor {
        kind: MetricKind::Hrv,
        endpoint_template: "hrv-service/hrv/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Overnight HRV summary and baseline",
    },
    MetricDescriptor {
        kind: MetricKind::Respiration,
        endpoint_template: "wellness-service/wellness/daily/respiration/{date}",
        requires_user_id: false,
        range_mode: false,
        description: "Waking/sleep respiration averages and time series",
    },
    MetricDescriptor {
        kind: MetricKind::Activities,
        endpoint_template: "activitylist-service/activities/search/activities?start={start}&limit={limit}",
        requires_user_id: false,
        range_mode: false,
        description: "Activity list, newest-first, paginated; use the forward-cursor iterator rather than this template directly",
    },
    MetricDescriptor {
        kind: MetricKind::BodyComposition,
        endpoint_template: "weight-service/weight/range/{start_date}/{end_date}",
        requires_user_id: false,
        range_mode: true,
        description: "Body composition range bundle, synced once per sync_range call",
    },
];

/// Registry of metric descriptors, keyed by kind.
///
/// Open for extension (add a `MetricKind` variant and a descriptor), closed
/// for modification of the sync engine, per spec.md §4.6.
#[derive(Debug, Clone)]
pub struct MetricRegistry {
    descriptors: HashMap<MetricKind, MetricDescriptor>,
}

impl MetricRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: DESCRIPTORS.iter().map(|d| (d.kind, *d)).collect(),
        }
    }

    /// All daily-metric kinds dispatched through `extract::parse_daily_metric`
    /// (i.e. every kind except the two with custom accessors).
    #[must_use]
    pub fn daily_kinds() -> Vec<MetricKind> {
        DESCRIPTORS
            .iter()
            .map(|d| d.kind)
            .filter(|k| !matches!(k, MetricKind::Activities | MetricKind::BodyComposition))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`SyncError::SchemaValidation`] if no descriptor is registered
    /// for `kind` (unreachable for the built-in kinds; guards future additions).
    pub fn descriptor(&self, kind: MetricKind) -> SyncResult<&MetricDescriptor> {
        self.descriptors.get(&kind).ok_or_else(|| {
            SyncError::schema_validation(format!("no metric descriptor registered for {kind}"))
        })
    }

    /// Substitute `{date}` and `{user_id}` holes in a descriptor's endpoint
    /// template. Not valid for `Activities` or `BodyComposition`, which use
    /// their own builders below.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SchemaValidation`] if `kind` requires a user id
    /// but none was supplied, or if `kind` is a custom-accessor kind.
    pub fn build_endpoint(
        &self,
        kind: MetricKind,
        date: NaiveDate,
        user_id: Option<i64>,
    ) -> SyncResult<String> {
        if matches!(kind, MetricKind::Activities | MetricKind::BodyComposition) {
            return Err(SyncError::schema_validation(format!(
                "{kind} uses a custom accessor, not build_endpoint"
            )));
        }
        let descriptor = self.descriptor(kind)?;
        let mut endpoint = descriptor.endpoint_template.replace("{date}", &date.to_string());
        if descriptor.requires_user_id {
            let user_id = user_id.ok_or_else(|| {
                SyncError::schema_validation(format!("{kind} requires a user id"))
            })?;
            endpoint = endpoint.replace("{user_id}", &user_id.to_string());
        }
        Ok(endpoint)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the paginated activities-list endpoint (spec.md §4.8).
#[must_use]
pub fn activities_page_endpoint(start: usize, limit: usize) -> String {
    format!("activitylist-service/activities/search/activities?start={start}&limit={limit}")
}

/// Build the body-composition range endpoint (spec.md §4.6/§4.10).
#[must_use]
pub fn body_composition_range_endpoint(start_date: NaiveDate, end_date: NaiveDate) -> String {
    format!("weight-service/weight/range/{start_date}/{end_date}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_date_only_endpoint() {
        let registry = MetricRegistry::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let endpoint = registry.build_endpoint(MetricKind::DailySummary, date, None).unwrap();
        assert_eq!(endpoint, "usersummary-service/usersummary/daily/2026-01-15");
    }

    #[test]
    fn missing_user_id_for_a_user_scoped_kind_is_an_error() {
        let registry = MetricRegistry::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let result = registry.build_endpoint(MetricKind::Sleep, date, None);
        assert!(result.is_err());
    }

    #[test]
    fn sleep_endpoint_puts_user_id_in_the_path_not_the_query() {
        let registry = MetricRegistry::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let endpoint = registry.build_endpoint(MetricKind::Sleep, date, Some(7)).unwrap();
        assert_eq!(endpoint, "sleep-service/sleep/dailySleepData/7?date=2026-01-15");
    }

    #[test]
    fn activities_and_body_composition_reject_build_endpoint() {
        let registry = MetricRegistry::new();
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert!(registry.build_endpoint(MetricKind::Activities, date, None).is_err());
        assert!(registry
            .build_endpoint(MetricKind::BodyComposition, date, None)
            .is_err());
    }

    #[test]
    fn daily_kinds_excludes_custom_accessors() {
        let kinds = MetricRegistry::daily_kinds();
        assert!(!kinds.contains(&MetricKind::Activities));
        assert!(!kinds.contains(&MetricKind::BodyComposition));
        assert!(kinds.contains(&MetricKind::Sleep));
    }
}
