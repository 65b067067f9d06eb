// ABOUTME: End-to-end sync engine test: one ranged sync against a mock API host, then an idempotent rerun
// ABOUTME: Grounded on spec.md §4.10 TESTABLE PROPERTIES and the auth harness in src/activities/iterator.rs tests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{Duration, NaiveDate, Utc};
use garmin_sync::api::Api;
use garmin_sync::auth::{LoginFlow, TokenManager, TokenStore};
use garmin_sync::http::{HttpClient, RetryPolicy};
use garmin_sync::models::{MetricKind, OAuth1Token, OAuth2Token, SyncState};
use garmin_sync::reporter::NullReporter;
use garmin_sync::{Config, Store, SyncEngine};
use std::sync::Arc;
use std::time::Duration as StdDuration;

async fn authenticated_api(base_url: String) -> Api {
    let http = HttpClient::new_with_cookie_store(
        StdDuration::from_secs(5),
        "garmin-sync-test/1.0",
        RetryPolicy {
            max_retries: 1,
            backoff_factor: 0.001,
        },
    )
    .unwrap();
    let tempdir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(tempdir.path().to_path_buf());
    let exchanger = Arc::new(LoginFlow::new(
        http.clone(),
        "garmin.com".to_string(),
        "key".to_string(),
        "secret".to_string(),
    ));
    let manager = TokenManager::new(store, exchanger);
    let now = Utc::now().timestamp();
    manager
        .set_tokens(
            OAuth1Token {
                oauth_token: "t".into(),
                oauth_token_secret: "s".into(),
                mfa_token: None,
                mfa_expiration: None,
                domain: "garmin.com".into(),
            },
            OAuth2Token {
                access_token: "a".into(),
                refresh_token: "r".into(),
                token_type: "Bearer".into(),
                scope: "CONNECT_READ".into(),
                jti: "jti".into(),
                expires_in: 3600,
                expires_at: now + 3600,
                refresh_token_expires_in: 86400,
                refresh_token_expires_at: now + 86400,
            },
        )
        .await
        .unwrap();
    Api::new_with_base_url(http, manager, base_url)
}

fn test_config() -> Config {
    Config {
        profile_path: "/tmp/garmin-sync-test".into(),
        db_path: "/tmp/garmin-sync-test/health.db".into(),
        request_timeout: StdDuration::from_secs(5),
        auth_timeout: StdDuration::from_secs(5),
        retries: 1,
        backoff_factor: 0.001,
        max_workers: 1,
        oauth_consumer_key: "key".into(),
        oauth_consumer_secret: "secret".into(),
        rate_limit_delay: StdDuration::from_millis(1),
        max_sync_span: Duration::days(365),
        activities_batch_size: 50,
        log_level: garmin_sync::config::LogLevel::Error,
    }
}

#[tokio::test]
async fn sync_range_is_idempotent_on_rerun() {
    let mut server = mockito::Server::new_async().await;
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let _daily_summary = server
        .mock("GET", mockito::Matcher::Regex(r"^/usersummary-service/usersummary/daily/2026-01-01.*".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "totalSteps": 8_000,
                "totalDistanceMeters": 6_000.0,
                "totalKilocalories": 2_200,
                "activeKilocalories": 600,
                "bmrKilocalories": 1_600,
                "restingHeartRate": 52,
                "minHeartRate": 46,
                "maxHeartRate": 150,
                "averageStressLevel": 22.0,
                "maxStressLevel": 60.0
            })
            .to_string(),
        )
        .expect_at_least(1)
        .create_async()
        .await;

    let _activities = server
        .mock("GET", mockito::Matcher::Regex(r"^/activitylist-service/activities/search/activities.*".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!([
                {
                    "activityId": 1,
                    "activityName": "Morning Run",
                    "activityType": {"typeKey": "running"},
                    "startTimeGmt": "2026-01-01 06:00:00",
                    "duration": 1800.0,
                    "distance": 5_000.0
                }
            ])
            .to_string(),
        )
        .expect_at_least(1)
        .create_async()
        .await;

    let _splits = server
        .mock("GET", mockito::Matcher::Regex(r"^/activity-service/activity/1/splits$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "lapDtos": [
                    {"distance": 5_000.0, "calories": 300.0, "intensityType": "ACTIVE"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let _body_composition = server
        .mock("GET", mockito::Matcher::Regex(r"^/weight-service/weight/range/.*".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "dateWeightList": [
                    {"calendarDate": "2026-01-01", "weight": 70_000, "bmi": 21.5, "sourceType": "INDEX_SCALE"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = authenticated_api(server.url()).await;
    let store = Store::connect_in_memory().await.unwrap();
    store.validate_schema().await.unwrap();
    let engine = SyncEngine::new(api, store.clone(), test_config());
    let reporter = NullReporter;
    let kinds = [MetricKind::DailySummary, MetricKind::Activities, MetricKind::BodyComposition];

    let first = engine.sync_range(1, date, date, &kinds, &reporter).await.unwrap();
    assert_eq!(first.total_tasks, 3);
    assert_eq!(first.completed, 3);
    assert_eq!(first.failed, 0);

    for kind in [MetricKind::DailySummary, MetricKind::Activities] {
        let status = store.get_sync_status(1, date, kind.as_str()).await.unwrap().unwrap();
        assert_eq!(status.state, SyncState::Completed);
    }
    let body_comp_status = store
        .get_sync_status(1, date, MetricKind::BodyComposition.as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(body_comp_status.state, SyncState::Completed);

    let activity = store.get_activity(1, "1").await.unwrap().unwrap();
    assert!(activity.details_synced);
    assert_eq!(activity.distance_meters, Some(5_000.0));

    let weight_entries = store.get_body_composition(1, date, date).await.unwrap();
    assert_eq!(weight_entries.len(), 1);
    assert_eq!(weight_entries[0].weight_grams, Some(70_000));

    // Rerun over the same range: every ledger row is already COMPLETED, so
    // every task is skipped without another network call being required.
    let second = engine.sync_range(1, date, date, &kinds, &reporter).await.unwrap();
    assert_eq!(second.total_tasks, 3);
    assert_eq!(second.completed, 0);
    assert_eq!(second.skipped, 3);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn inverted_range_is_rejected_before_any_io() {
    let server = mockito::Server::new_async().await;
    let api = authenticated_api(server.url()).await;
    let store = Store::connect_in_memory().await.unwrap();
    let engine = SyncEngine::new(api, store, test_config());
    let reporter = NullReporter;

    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let result = engine
        .sync_range(1, start, end, &[MetricKind::DailySummary], &reporter)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn span_exceeding_max_sync_span_is_rejected() {
    let server = mockito::Server::new_async().await;
    let api = authenticated_api(server.url()).await;
    let store = Store::connect_in_memory().await.unwrap();
    let mut config = test_config();
    config.max_sync_span = Duration::days(1);
    let engine = SyncEngine::new(api, store, config);
    let reporter = NullReporter;

    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let result = engine
        .sync_range(1, start, end, &[MetricKind::DailySummary], &reporter)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn failed_metric_is_retried_on_rerun_but_completed_rows_are_not() {
    let mut server = mockito::Server::new_async().await;
    let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    let fail_then_succeed = server
        .mock("GET", mockito::Matcher::Regex(r"^/sleep-service/sleep/dailySleepData.*".into()))
        .with_status(500)
        .expect(2)
        .create_async()
        .await;

    let api = authenticated_api(server.url()).await;
    let store = Store::connect_in_memory().await.unwrap();
    let engine = SyncEngine::new(api, store.clone(), test_config());
    let reporter = NullReporter;
    let kinds = [MetricKind::Sleep];

    let first = engine.sync_range(1, date, date, &kinds, &reporter).await.unwrap();
    assert_eq!(first.failed, 1);
    let status = store.get_sync_status(1, date, "sleep").await.unwrap().unwrap();
    assert_eq!(status.state, SyncState::Failed);
    assert!(status.error_message.is_some());

    // Rerun retries the FAILED row rather than skipping it.
    let second = engine.sync_range(1, date, date, &kinds, &reporter).await.unwrap();
    assert_eq!(second.failed, 1);

    fail_then_succeed.assert_async().await;
}
