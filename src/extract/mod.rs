// ABOUTME: Pure transformation layer: typed JSON response -> DailyHealthFields / time series / typed rows
// ABOUTME: Grounded on teacher src/providers/garmin_provider.rs typed-response-struct + convert_* pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod activities;
mod body_composition;
mod daily_metrics;

pub use activities::{parse_activities_page, parse_exercise_sets, parse_splits};
pub use body_composition::parse_body_composition_range;
pub use daily_metrics::{parse_daily_metric, MetricExtraction};
