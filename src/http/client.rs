// ABOUTME: Retrying HTTP client wrapping reqwest with exponential backoff on retryable status codes
// ABOUTME: Grounded on teacher src/providers/utils.rs::api_request_with_retry backoff loop
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::warn;

/// HTTP status codes considered transient and worth retrying (spec.md §4.3).
const RETRYABLE_STATUS_CODES: &[u16] = &[408, 429, 500, 502, 503, 504];

/// Retry/backoff policy applied by [`HttpClient`] to every request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 1.0,
        }
    }
}

impl RetryPolicy {
    fn is_retryable(status: StatusCode) -> bool {
        RETRYABLE_STATUS_CODES.contains(&status.as_u16())
    }

    /// `backoff_factor * 2^attempt` seconds, per spec.md §4.3.
    fn backoff_duration(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(self.backoff_factor * 2f64.powi(attempt as i32))
    }
}

/// Thin wrapper over a pooled [`reqwest::Client`] that retries transient
/// failures with exponential backoff. Two instances are normally held by
/// callers: one tuned for the main API host, one for the SSO/auth host,
/// each with its own timeout (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Build a client with the given timeout, user agent, and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying TLS backend fails to initialize.
    pub fn new(timeout: Duration, user_agent: &str, retry: RetryPolicy) -> SyncResult<Self> {
        Self::build(timeout, user_agent, retry, false)
    }

    /// Like [`HttpClient::new`], but with an in-memory cookie jar enabled.
    /// The SSO login flow (C4) needs this to carry interim session cookies
    /// across the CSRF-fetch, credential-POST, and ticket-redemption steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying TLS backend fails to initialize.
    pub fn new_with_cookie_store(
        timeout: Duration,
        user_agent: &str,
        retry: RetryPolicy,
    ) -> SyncResult<Self> {
        Self::build(timeout, user_agent, retry, true)
    }

    fn build(
        timeout: Duration,
        user_agent: &str,
        retry: RetryPolicy,
        cookie_store: bool,
    ) -> SyncResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent.to_string())
            .cookie_store(cookie_store)
            .build()
            .map_err(SyncError::from)?;
        Ok(Self { inner, retry })
    }

    /// Issue a request, retrying on [`RETRYABLE_STATUS_CODES`] up to
    /// `retry.max_retries` times with exponential backoff. Non-retryable
    /// error statuses return immediately as [`SyncError::Api`].
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        build: impl Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> SyncResult<reqwest::Response> {
        let mut attempt = 0u32;
        loop {
            let request = build(self.inner.request(method.clone(), url));
            let response = request.send().await.map_err(SyncError::from)?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if RetryPolicy::is_retryable(status) && attempt < self.retry.max_retries {
                let backoff = self.retry.backoff_duration(attempt);
                attempt += 1;
                warn!(
                    %url,
                    status = status.as_u16(),
                    attempt,
                    max_retries = self.retry.max_retries,
                    backoff_secs = backoff.as_secs_f64(),
                    "retryable HTTP status, backing off"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::api(status.as_u16(), body));
        }
    }

    /// Convenience wrapper for a GET request with bearer auth.
    pub async fn get_bearer(&self, url: &str, access_token: &str) -> SyncResult<reqwest::Response> {
        self.execute(Method::GET, url, |b| b.bearer_auth(access_token))
            .await
    }

    /// Plain unauthenticated GET, used by the login flow's CSRF-token fetch.
    pub async fn get(&self, url: &str) -> SyncResult<reqwest::Response> {
        self.execute(Method::GET, url, |b| b).await
    }

    /// Form-encoded POST, used by the login flow's credential submission and
    /// OAuth1 ticket redemption steps.
    pub async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> SyncResult<reqwest::Response> {
        self.execute(Method::POST, url, |b| b.form(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeds_after_retryable_failures() {
        let mut server = mockito::Server::new_async().await;
        let fail_mock = server
            .mock("GET", "/health")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;
        let ok_mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("{\"ok\":true}")
            .create_async()
            .await;

        let client = HttpClient::new(
            Duration::from_secs(5),
            "garmin-sync-test/1.0",
            RetryPolicy {
                max_retries: 3,
                backoff_factor: 0.001,
            },
        )
        .unwrap();

        let url = format!("{}/health", server.url());
        let response = client.get_bearer(&url, "token").await.unwrap();
        assert!(response.status().is_success());
        fail_mock.assert_async().await;
        ok_mock.assert_async().await;
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_api_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = HttpClient::new(
            Duration::from_secs(5),
            "garmin-sync-test/1.0",
            RetryPolicy {
                max_retries: 2,
                backoff_factor: 0.001,
            },
        )
        .unwrap();

        let url = format!("{}/health", server.url());
        let err = client.get_bearer(&url, "token").await.unwrap_err();
        match err {
            SyncError::Api { status, .. } => assert_eq!(status, 503),
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_retryable_status_returns_immediately() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(
            Duration::from_secs(5),
            "garmin-sync-test/1.0",
            RetryPolicy::default(),
        )
        .unwrap();

        let url = format!("{}/health", server.url());
        let err = client.get_bearer(&url, "token").await.unwrap_err();
        match err {
            SyncError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }
}
