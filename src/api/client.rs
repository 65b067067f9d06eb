// ABOUTME: Authenticated API client over the main Garmin Connect host
// ABOUTME: Grounded on teacher src/providers/garmin_provider.rs::api_request token-injection pattern
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::auth::TokenManager;
use crate::errors::SyncResult;
use crate::http::HttpClient;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Value type composing an [`HttpClient`] (transport) with a [`TokenManager`]
/// (token source), per SPEC_FULL.md's "no self-referential composed managers"
/// redesign flag. Cloning an `Api` is cheap: both fields are internally
/// `Arc`-backed.
#[derive(Clone)]
pub struct Api {
    http: HttpClient,
    token_manager: TokenManager,
    base_url: String,
}

impl Api {
    /// Build an `Api` targeting the real `connectapi.{domain}` host.
    #[must_use]
    pub fn new(http: HttpClient, token_manager: TokenManager, domain: String) -> Self {
        Self {
            http,
            token_manager,
            base_url: format!("https://connectapi.{domain}"),
        }
    }

    /// Build an `Api` targeting an explicit base URL (scheme + host), for
    /// tests driving a `mockito` server instead of the real Garmin host.
    #[must_use]
    pub fn new_with_base_url(http: HttpClient, token_manager: TokenManager, base_url: String) -> Self {
        Self {
            http,
            token_manager,
            base_url,
        }
    }

    fn connect_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = url::Url::parse(&format!("{}{}", self.base_url, path))
            .expect("connect_url is always a valid base + path");
        for (key, value) in query {
            url.query_pairs_mut().append_pair(key, value);
        }
        url.to_string()
    }

    /// GET an endpoint on the main API host, refreshing the access token
    /// first if needed, and deserialize the JSON body (spec.md §4.5).
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::SyncError::Auth`] if not authenticated and
    /// unable to refresh, or [`crate::errors::SyncError::Api`] for transport
    /// or decode failures.
    pub async fn connectapi<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> SyncResult<T> {
        let auth_header = self.token_manager.auth_header().await?;
        let url = self.connect_url(path, query);
        debug!(%url, "fetching connectapi endpoint");
        let response = self
            .http
            .execute(reqwest::Method::GET, &url, |b| {
                b.header(reqwest::header::AUTHORIZATION, auth_header.clone())
            })
            .await?;
        response.json().await.map_err(crate::errors::SyncError::from)
    }
}
