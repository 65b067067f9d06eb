// ABOUTME: Entity types for the local store schema
// ABOUTME: DailyHealthRow, Activity, ExerciseSet, ActivitySplit, TimeSeriesPoint, BodyCompositionEntry, ledger state
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod activity;
mod daily_health;
mod ledger;
mod timeseries;
mod token;

pub use activity::{Activity, ActivitySplit, ExerciseSet, IntensityType, SetType};
pub use daily_health::DailyHealthFields;
pub use ledger::{SyncState, SyncStatusRow};
pub use timeseries::{BodyCompositionEntry, TimeSeriesPoint};
pub use token::{OAuth1Token, OAuth2Token};

/// Metric kinds the registry (C6) and extractor (C7) dispatch on.
///
/// The registry is "open for extension via a declarative descriptor, closed
/// for modification of the engine" (spec.md §4.6): adding a kind means adding
/// a variant here and a descriptor in `metrics::registry`, not touching the
/// sync engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    DailySummary,
    Sleep,
    Activities,
    BodyBattery,
    Stress,
    HeartRate,
    TrainingReadiness,
    Hrv,
    Respiration,
    Steps,
    Calories,
    BodyComposition,
}

impl MetricKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailySummary => "daily_summary",
            Self::Sleep => "sleep",
            Self::Activities => "activities",
            Self::BodyBattery => "body_battery",
            Self::Stress => "stress",
            Self::HeartRate => "heart_rate",
            Self::TrainingReadiness => "training_readiness",
            Self::Hrv => "hrv",
            Self::Respiration => "respiration",
            Self::Steps => "steps",
            Self::Calories => "calories",
            Self::BodyComposition => "body_composition",
        }
    }

    /// Time-series-bearing kinds, per spec.md §4.7.
    #[must_use]
    pub const fn has_time_series(self) -> bool {
        matches!(
            self,
            Self::HeartRate | Self::Stress | Self::BodyBattery | Self::Respiration
        )
    }

    /// Every kind, in the default `sync` order (per-date kinds first, then
    /// the two custom-accessor kinds). Used as the default `--metrics` set.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::DailySummary,
            Self::Steps,
            Self::Calories,
            Self::Sleep,
            Self::BodyBattery,
            Self::Stress,
            Self::HeartRate,
            Self::TrainingReadiness,
            Self::Hrv,
            Self::Respiration,
            Self::Activities,
            Self::BodyComposition,
        ]
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily_summary" => Ok(Self::DailySummary),
            "sleep" => Ok(Self::Sleep),
            "activities" => Ok(Self::Activities),
            "body_battery" => Ok(Self::BodyBattery),
            "stress" => Ok(Self::Stress),
            "heart_rate" => Ok(Self::HeartRate),
            "training_readiness" => Ok(Self::TrainingReadiness),
            "hrv" => Ok(Self::Hrv),
            "respiration" => Ok(Self::Respiration),
            "steps" => Ok(Self::Steps),
            "calories" => Ok(Self::Calories),
            "body_composition" => Ok(Self::BodyComposition),
            other => Err(format!("unknown metric kind: {other}")),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sport classification used to route detail-sync fetches (C11).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityClass {
    Strength,
    Cardio,
    Other,
}

const STRENGTH_TYPES: &[&str] = &["strength_training", "indoor_strength_training"];
const CARDIO_TYPES: &[&str] = &[
    "running",
    "treadmill_running",
    "trail_running",
    "cycling",
    "indoor_cycling",
    "mountain_biking",
    "swimming",
    "open_water_swimming",
    "walking",
    "hiking",
    "elliptical",
    "rowing",
    "indoor_rowing",
];

impl ActivityClass {
    #[must_use]
    pub fn classify(activity_type: &str) -> Self {
        let lowered = activity_type.to_lowercase();
        if STRENGTH_TYPES.contains(&lowered.as_str()) {
            Self::Strength
        } else if CARDIO_TYPES.contains(&lowered.as_str()) {
            Self::Cardio
        } else {
            Self::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn metric_kind_round_trips_through_str() {
        for kind in MetricKind::all() {
            let parsed = MetricKind::from_str(kind.as_str()).unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn unknown_metric_kind_is_an_error() {
        assert!(MetricKind::from_str("not_a_kind").is_err());
    }

    #[test]
    fn classifies_known_sport_families() {
        assert_eq!(ActivityClass::classify("running"), ActivityClass::Cardio);
        assert_eq!(ActivityClass::classify("strength_training"), ActivityClass::Strength);
        assert_eq!(ActivityClass::classify("yoga"), ActivityClass::Other);
    }
}
