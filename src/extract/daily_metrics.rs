// ABOUTME: Per-metric-kind JSON response parsing into DailyHealthFields and optional time-series points
// ABOUTME: Field names grounded on original_source garmy/metrics/{sleep,hrv,body_battery}.py dataclasses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::{DailyHealthFields, TimeSeriesPoint};
use chrono::NaiveDate;
use serde::Deserialize;

/// Result of parsing one metric kind's response. Kinds flagged
/// `has_time_series()` may additionally carry intraday points (spec.md §4.7).
#[derive(Debug, Clone, PartialEq)]
pub enum MetricExtraction {
    Fields(DailyHealthFields),
    FieldsWithSeries(DailyHealthFields, Vec<TimeSeriesPoint>),
}

impl MetricExtraction {
    #[must_use]
    pub fn into_fields(self) -> DailyHealthFields {
        match self {
            Self::Fields(f) | Self::FieldsWithSeries(f, _) => f,
        }
    }

    #[must_use]
    pub fn series(&self) -> &[TimeSeriesPoint] {
        match self {
            Self::Fields(_) => &[],
            Self::FieldsWithSeries(_, series) => series,
        }
    }
}

/// Dispatches to the right parser for `kind`. `raw` is the deserialized
/// JSON body returned by the registry's endpoint fetch.
///
/// # Errors
///
/// Returns [`SyncError::Api`] if the response does not match the expected
/// shape for `kind`.
pub fn parse_daily_metric(
    kind: crate::models::MetricKind,
    user_id: i64,
    date: NaiveDate,
    raw: &serde_json::Value,
) -> SyncResult<MetricExtraction> {
    use crate::models::MetricKind as K;
    match kind {
        K::DailySummary => parse_daily_summary(raw).map(MetricExtraction::Fields),
        K::Steps => parse_steps(raw).map(MetricExtraction::Fields),
        K::Calories => parse_calories(raw).map(MetricExtraction::Fields),
        K::Sleep => parse_sleep(raw).map(MetricExtraction::Fields),
        K::TrainingReadiness => parse_training_readiness(raw).map(MetricExtraction::Fields),
        K::Hrv => parse_hrv(raw).map(MetricExtraction::Fields),
        K::HeartRate => parse_heart_rate(user_id, date, raw),
        K::Stress => parse_stress(user_id, date, raw),
        K::BodyBattery => parse_body_battery(user_id, date, raw),
        K::Respiration => parse_respiration(user_id, date, raw),
        K::Activities | K::BodyComposition => Err(SyncError::api(
            0,
            format!("{kind} is not a daily-fields metric kind"),
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailySummaryResponse {
    total_steps: Option<i64>,
    total_distance_meters: Option<f64>,
    total_kilocalories: Option<i64>,
    active_kilocalories: Option<i64>,
    bmr_kilocalories: Option<i64>,
    resting_heart_rate: Option<i64>,
    min_heart_rate: Option<i64>,
    max_heart_rate: Option<i64>,
    average_stress_level: Option<f64>,
    max_stress_level: Option<f64>,
}

fn parse_daily_summary(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: DailySummaryResponse = serde_json::from_value(raw.clone())?;
    Ok(DailyHealthFields {
        steps: r.total_steps,
        distance_meters: r.total_distance_meters,
        total_calories: r.total_kilocalories,
        active_calories: r.active_kilocalories,
        bmr_calories: r.bmr_kilocalories,
        resting_heart_rate: r.resting_heart_rate,
        min_heart_rate: r.min_heart_rate,
        max_heart_rate: r.max_heart_rate,
        avg_stress: r.average_stress_level,
        max_stress: r.max_stress_level,
        ..Default::default()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepsResponse {
    total_steps: Option<i64>,
    step_goal: Option<i64>,
}

fn parse_steps(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: StepsResponse = serde_json::from_value(raw.clone())?;
    Ok(DailyHealthFields {
        steps: r.total_steps,
        step_goal: r.step_goal,
        ..Default::default()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaloriesResponse {
    total_kilocalories: Option<i64>,
    active_kilocalories: Option<i64>,
    bmr_kilocalories: Option<i64>,
}

fn parse_calories(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: CaloriesResponse = serde_json::from_value(raw.clone())?;
    Ok(DailyHealthFields {
        total_calories: r.total_kilocalories,
        active_calories: r.active_kilocalories,
        bmr_calories: r.bmr_kilocalories,
        ..Default::default()
    })
}

/// Mirrors `SleepSummary` in `original_source/src/garmy/metrics/sleep.py`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailySleepDto {
    sleep_time_seconds: Option<i64>,
    deep_sleep_seconds: Option<i64>,
    light_sleep_seconds: Option<i64>,
    rem_sleep_seconds: Option<i64>,
    awake_sleep_seconds: Option<i64>,
    average_sp_o2_value: Option<f64>,
    average_respiration_value: Option<f64>,
    lowest_respiration_value: Option<f64>,
    highest_respiration_value: Option<f64>,
    sleep_start_timestamp_gmt: Option<i64>,
    sleep_end_timestamp_gmt: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SleepScoresDto {
    overall_score: Option<i64>,
    overall_score_qualifier_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SleepNeedDto {
    actual: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SleepResponse {
    daily_sleep_dto: DailySleepDto,
    sleep_scores: Option<SleepScoresDto>,
    sleep_need: Option<SleepNeedDto>,
}

fn parse_sleep(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: SleepResponse = serde_json::from_value(raw.clone())?;
    let d = r.daily_sleep_dto;
    let total_seconds = d.sleep_time_seconds.unwrap_or(0) as f64;
    let pct = |part: Option<i64>| -> Option<f64> {
        if total_seconds > 0.0 {
            part.map(|s| (s as f64 / total_seconds) * 100.0)
        } else {
            None
        }
    };

    Ok(DailyHealthFields {
        sleep_duration_hours: d.sleep_time_seconds.map(|s| s as f64 / 3600.0),
        sleep_deep_hours: d.deep_sleep_seconds.map(|s| s as f64 / 3600.0),
        sleep_light_hours: d.light_sleep_seconds.map(|s| s as f64 / 3600.0),
        sleep_rem_hours: d.rem_sleep_seconds.map(|s| s as f64 / 3600.0),
        sleep_awake_hours: d.awake_sleep_seconds.map(|s| s as f64 / 3600.0),
        sleep_deep_pct: pct(d.deep_sleep_seconds),
        sleep_light_pct: pct(d.light_sleep_seconds),
        sleep_rem_pct: pct(d.rem_sleep_seconds),
        sleep_awake_pct: pct(d.awake_sleep_seconds),
        avg_spo2: d.average_sp_o2_value,
        sleep_respiration: d.average_respiration_value,
        lowest_respiration: d.lowest_respiration_value,
        highest_respiration: d.highest_respiration_value,
        sleep_bedtime: d.sleep_start_timestamp_gmt.map(|t| t.to_string()),
        sleep_wake_time: d.sleep_end_timestamp_gmt.map(|t| t.to_string()),
        sleep_score: r.sleep_scores.as_ref().and_then(|s| s.overall_score),
        sleep_score_qualifier: r
            .sleep_scores
            .and_then(|s| s.overall_score_qualifier_key),
        sleep_need_minutes: r.sleep_need.and_then(|n| n.actual),
        ..Default::default()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrainingReadinessResponse {
    score: Option<i64>,
    level: Option<String>,
    feedback_long: Option<String>,
}

fn parse_training_readiness(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: TrainingReadinessResponse = serde_json::from_value(raw.clone())?;
    Ok(DailyHealthFields {
        training_readiness_score: r.score,
        training_readiness_level: r.level,
        training_readiness_feedback: r.feedback_long,
        ..Default::default()
    })
}

/// Mirrors `HRVSummary` in `original_source/src/garmy/metrics/hrv.py`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HrvSummaryDto {
    weekly_avg: Option<f64>,
    last_night_avg: Option<f64>,
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HrvResponse {
    hrv_summary: HrvSummaryDto,
}

fn parse_hrv(raw: &serde_json::Value) -> SyncResult<DailyHealthFields> {
    let r: HrvResponse = serde_json::from_value(raw.clone())?;
    Ok(DailyHealthFields {
        hrv_weekly_avg: r.hrv_summary.weekly_avg,
        hrv_last_night_avg: r.hrv_summary.last_night_avg,
        hrv_status: r.hrv_summary.status,
        ..Default::default()
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartRateResponse {
    resting_heart_rate: Option<i64>,
    min_heart_rate: Option<i64>,
    max_heart_rate: Option<i64>,
    #[serde(default)]
    heart_rate_values_array: Vec<Vec<serde_json::Value>>,
}

fn parse_heart_rate(
    user_id: i64,
    date: NaiveDate,
    raw: &serde_json::Value,
) -> SyncResult<MetricExtraction> {
    let r: HeartRateResponse = serde_json::from_value(raw.clone())?;
    let fields = DailyHealthFields {
        resting_heart_rate: r.resting_heart_rate,
        min_heart_rate: r.min_heart_rate,
        max_heart_rate: r.max_heart_rate,
        ..Default::default()
    };
    let series = parse_value_series(user_id, date, "heart_rate", &r.heart_rate_values_array);
    Ok(MetricExtraction::FieldsWithSeries(fields, series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StressResponse {
    avg_stress_level: Option<f64>,
    max_stress_level: Option<f64>,
    #[serde(default)]
    stress_values_array: Vec<Vec<serde_json::Value>>,
}

fn parse_stress(
    user_id: i64,
    date: NaiveDate,
    raw: &serde_json::Value,
) -> SyncResult<MetricExtraction> {
    let r: StressResponse = serde_json::from_value(raw.clone())?;
    let fields = DailyHealthFields {
        avg_stress: r.avg_stress_level,
        max_stress: r.max_stress_level,
        ..Default::default()
    };
    let series = parse_value_series(user_id, date, "stress", &r.stress_values_array);
    Ok(MetricExtraction::FieldsWithSeries(fields, series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyBatteryResponse {
    body_battery_high: Option<i64>,
    body_battery_low: Option<i64>,
    #[serde(default)]
    body_battery_values_array: Vec<Vec<serde_json::Value>>,
}

fn parse_body_battery(
    user_id: i64,
    date: NaiveDate,
    raw: &serde_json::Value,
) -> SyncResult<MetricExtraction> {
    let r: BodyBatteryResponse = serde_json::from_value(raw.clone())?;
    let fields = DailyHealthFields {
        body_battery_high: r.body_battery_high,
        body_battery_low: r.body_battery_low,
        ..Default::default()
    };
    let series = parse_body_battery_series(user_id, date, &r.body_battery_values_array);
    Ok(MetricExtraction::FieldsWithSeries(fields, series))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RespirationResponse {
    avg_waking_respiration_value: Option<f64>,
    avg_sleep_respiration_value: Option<f64>,
    lowest_respiration_value: Option<f64>,
    highest_respiration_value: Option<f64>,
    #[serde(default)]
    respiration_values_array: Vec<Vec<serde_json::Value>>,
}

fn parse_respiration(
    user_id: i64,
    date: NaiveDate,
    raw: &serde_json::Value,
) -> SyncResult<MetricExtraction> {
    let r: RespirationResponse = serde_json::from_value(raw.clone())?;
    let avg = match (r.avg_waking_respiration_value, r.avg_sleep_respiration_value) {
        (Some(w), Some(s)) => Some((w + s) / 2.0),
        (Some(w), None) => Some(w),
        (None, Some(s)) => Some(s),
        (None, None) => None,
    };
    let fields = DailyHealthFields {
        avg_respiration: avg,
        waking_respiration: r.avg_waking_respiration_value,
        sleep_respiration: r.avg_sleep_respiration_value,
        lowest_respiration: r.lowest_respiration_value,
        highest_respiration: r.highest_respiration_value,
        ..Default::default()
    };
    let series = parse_value_series(user_id, date, "respiration", &r.respiration_values_array);
    Ok(MetricExtraction::FieldsWithSeries(fields, series))
}

/// Parses a `[[timestampGmt, value], ...]` wire array (spec.md §8 scenario
/// S2). Entries whose value is `null` are dropped rather than failing the
/// parse.
fn parse_value_series(
    user_id: i64,
    date: NaiveDate,
    metric_kind: &str,
    rows: &[Vec<serde_json::Value>],
) -> Vec<TimeSeriesPoint> {
    rows.iter()
        .filter_map(|row| {
            let timestamp_ms = row.first()?.as_i64()?;
            let value = row.get(1)?.as_f64()?;
            Some(TimeSeriesPoint {
                user_id,
                date,
                metric_kind: metric_kind.to_string(),
                timestamp_ms,
                value,
                metadata: None,
            })
        })
        .collect()
}

/// Body Battery rows are `[timestamp, status, level, version]`
/// (`original_source/src/garmy/metrics/body_battery.py`); status rides
/// along as metadata, level is the stored value.
fn parse_body_battery_series(
    user_id: i64,
    date: NaiveDate,
    rows: &[Vec<serde_json::Value>],
) -> Vec<TimeSeriesPoint> {
    rows.iter()
        .filter_map(|row| {
            let timestamp_ms = row.first()?.as_i64()?;
            let level = row.get(2)?.as_f64()?;
            let status = row.get(1).cloned();
            Some(TimeSeriesPoint {
                user_id,
                date,
                metric_kind: "body_battery".to_string(),
                timestamp_ms,
                value: level,
                metadata: status.map(|s| serde_json::json!({ "status": s })),
            })
        })
        .collect()
}
