// ABOUTME: Forward-cursor pagination over the newest-first activities list
// ABOUTME: Grounded on teacher crates/pierre-providers/src/activity_iterator.rs VecDeque buffer + fetch-on-exhaustion pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::api::Api;
use crate::errors::SyncResult;
use crate::extract::parse_activities_page;
use crate::metrics::activities_page_endpoint;
use crate::models::Activity;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::debug;

/// Default activities pagination batch size (spec.md §4.8).
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Cursor over the activities list, newest-first.
///
/// Per SPEC_FULL.md's "no stateful implicit iterator" redesign flag this is
/// an explicit struct with an async `get_activities_for_date` method rather
/// than a `futures::Stream` impl: callers drive it directly instead of
/// polling, which keeps the newest-to-oldest date-walk in the sync engine
/// visible as ordinary control flow.
pub struct ActivitiesCursor {
    api: Api,
    user_id: i64,
    batch_size: usize,
    buffer: VecDeque<Activity>,
    batch_offset: usize,
    has_more: bool,
    /// Read-only view of `buffer.front()`, kept for parity with spec.md's
    /// state shape; `get_activities_for_date` operates on `buffer` directly.
    current: Option<Activity>,
    current_date: Option<NaiveDate>,
    initialized: bool,
}

impl ActivitiesCursor {
    #[must_use]
    pub fn new(api: Api, user_id: i64, batch_size: usize) -> Self {
        Self {
            api,
            user_id,
            batch_size,
            buffer: VecDeque::new(),
            batch_offset: 0,
            has_more: true,
            current: None,
            current_date: None,
            initialized: false,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Activity> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current_date
    }

    /// Fetch the first batch and position the cursor at the newest activity.
    ///
    /// # Errors
    ///
    /// Returns an error if the first page fetch fails.
    pub async fn initialize(&mut self) -> SyncResult<()> {
        self.fetch_next_batch().await?;
        self.sync_current();
        self.initialized = true;
        Ok(())
    }

    /// Clear all cursor state and re-initialize. Mandatory between
    /// independent sync sessions (spec.md §4.8) — a stale cursor silently
    /// skips dates that ran under a previous session's date range.
    ///
    /// # Errors
    ///
    /// Returns an error if the re-fetched first page fails.
    pub async fn reset(&mut self) -> SyncResult<()> {
        self.buffer.clear();
        self.batch_offset = 0;
        self.has_more = true;
        self.current = None;
        self.current_date = None;
        self.initialized = false;
        self.initialize().await
    }

    async fn fetch_next_batch(&mut self) -> SyncResult<()> {
        let endpoint = activities_page_endpoint(self.batch_offset, self.batch_size);
        debug!(offset = self.batch_offset, limit = self.batch_size, "fetching activities page");
        let raw: serde_json::Value = self.api.connectapi(&format!("/{endpoint}"), &[]).await?;
        let page = parse_activities_page(self.user_id, &raw)?;
        let fetched = page.len();
        self.batch_offset += fetched;
        self.has_more = fetched == self.batch_size;
        self.buffer.extend(page);
        Ok(())
    }

    async fn ensure_buffer(&mut self) -> SyncResult<()> {
        while self.buffer.is_empty() && self.has_more {
            self.fetch_next_batch().await?;
        }
        Ok(())
    }

    fn sync_current(&mut self) {
        self.current = self.buffer.front().cloned();
        self.current_date = self.current.as_ref().map(|a| a.activity_date);
    }

    /// Consume from the buffer while `current_date > date` (skip, newer),
    /// collect while `current_date == date`, stop when `current_date < date`
    /// (remaining activities are older and stay buffered for a later,
    /// earlier-dated call). Implies the caller walks dates newest-to-oldest.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching a subsequent page fails.
    pub async fn get_activities_for_date(&mut self, date: NaiveDate) -> SyncResult<Vec<Activity>> {
        if !self.initialized {
            self.initialize().await?;
        }
        let mut matched = Vec::new();
        loop {
            self.ensure_buffer().await?;
            let Some(front) = self.buffer.front() else {
                break;
            };
            match front.activity_date.cmp(&date) {
                Ordering::Greater => {
                    self.buffer.pop_front();
                }
                Ordering::Equal => {
                    matched.push(self.buffer.pop_front().expect("front just matched"));
                }
                Ordering::Less => break,
            }
        }
        self.sync_current();
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{LoginFlow, TokenManager, TokenStore};
    use crate::http::HttpClient;
    use crate::models::{OAuth1Token, OAuth2Token};
    use std::sync::Arc;

    async fn cursor_against(server: &mockito::ServerGuard, batch_size: usize) -> ActivitiesCursor {
        let http = HttpClient::new_with_cookie_store(
            std::time::Duration::from_secs(5),
            "test-agent",
            crate::http::RetryPolicy::default(),
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
        let now = chrono::Utc::now().timestamp();
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
                    scope: "conn".into(),
                    jti: "jti".into(),
                    token_type: "Bearer".into(),
                    access_token: "a".into(),
                    refresh_token: "r".into(),
                    expires_in: 3600,
                    expires_at: now + 3600,
                    refresh_token_expires_in: 86400,
                    refresh_token_expires_at: now + 86400,
                },
            )
            .await
            .unwrap();
        let api = Api::new_with_base_url(http, manager, server.url());
        ActivitiesCursor::new(api, 1, batch_size)
    }

    fn activity_json(id: i64, date: &str) -> serde_json::Value {
        serde_json::json!({
            "activityId": id,
            "activityName": format!("activity {id}"),
            "startTimeGmt": format!("{date} 08:00:00"),
            "duration": 1200.0
        })
    }

    #[tokio::test]
    async fn collects_only_matching_date_and_leaves_older_buffered() {
        let mut server = mockito::Server::new_async().await;
        let page = serde_json::json!([
            activity_json(3, "2026-01-03"),
            activity_json(2, "2026-01-02"),
            activity_json(1, "2026-01-01"),
        ]);
        let _m = server
            .mock("GET", mockito::Matcher::Regex(r"^/activitylist-service.*".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page.to_string())
            .create_async()
            .await;

        let mut cursor = cursor_against(&server, 50).await;
        let jan3 = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let matched = cursor.get_activities_for_date(jan3).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].activity_id, "3");
        assert_eq!(cursor.current_date(), Some(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()));
    }
}
