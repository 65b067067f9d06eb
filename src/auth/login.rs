// ABOUTME: SSO credential + MFA login flow, and the OAuth1->OAuth2 exchange used for both login and refresh
// ABOUTME: No direct teacher analog; grounded in spec.md §4.4 step sequence and original_source garmy/auth/client.py orchestration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::auth::token_manager::OAuth1Exchanger;
use crate::errors::{SyncError, SyncResult};
use crate::http::HttpClient;
use crate::models::{OAuth1Token, OAuth2Token};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SSO_LOGIN_PATH: &str = "/sso/signin";
const TICKET_EXCHANGE_PATH: &str = "/oauth-service/oauth/preauthorized";
const OAUTH2_EXCHANGE_PATH: &str = "/oauth-service/oauth/exchange/user/2.0";

/// Opaque state carried between `login()` returning `NeedsMfa` and the
/// caller's later `resume_login()` call. Serializable so a CLI can persist
/// it across a process boundary if the MFA prompt happens out-of-band
/// (spec.md §4.4 "Resume-after-MFA").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientState {
    csrf_token: String,
    signin_params: String,
    email: String,
}

/// Sum type replacing the original's overloaded return value (tuple vs.
/// `("needs_mfa", dict)` vs. raised exception). See SPEC_FULL.md REDESIGN
/// FLAGS: "sum-type `LoginOutcome`".
#[derive(Debug)]
pub enum LoginOutcome {
    Success { oauth1: OAuth1Token, oauth2: OAuth2Token },
    NeedsMfa(ClientState),
    Failed(String),
}

/// Orchestrates the SSO login flow against a Garmin-style domain: fetch the
/// login page, extract a CSRF token, submit credentials, follow either the
/// ticket redirect or the MFA branch, redeem the ticket for OAuth1, then
/// exchange OAuth1 for OAuth2.
pub struct LoginFlow {
    http: HttpClient,
    domain: String,
    consumer_key: String,
    consumer_secret: String,
}

impl LoginFlow {
    #[must_use]
    pub fn new(http: HttpClient, domain: String, consumer_key: String, consumer_secret: String) -> Self {
        Self {
            http,
            domain,
            consumer_key,
            consumer_secret,
        }
    }

    fn sso_url(&self, path: &str) -> String {
        format!("https://sso.{}{}", self.domain, path)
    }

    fn connect_url(&self, path: &str) -> String {
        format!("https://connectapi.{}{}", self.domain, path)
    }

    async fn fetch_csrf_token(&self) -> SyncResult<String> {
        let response = self.http.get(&self.sso_url(SSO_LOGIN_PATH)).await?;
        let body = response.text().await.map_err(SyncError::from)?;
        extract_csrf_token(&body)
    }

    /// Step 1-3 of spec.md §4.4: fetch CSRF, POST credentials, branch on
    /// whether Garmin demands an MFA code.
    pub async fn login(&self, email: &str, password: &str) -> SyncResult<LoginOutcome> {
        let csrf_token = self.fetch_csrf_token().await?;

        let response = self
            .http
            .post_form(
                &self.sso_url(SSO_LOGIN_PATH),
                &[
                    ("username", email),
                    ("password", password),
                    ("_csrf", csrf_token.as_str()),
                ],
            )
            .await?;
        let body = response.text().await.map_err(SyncError::from)?;

        if body_requires_mfa(&body) {
            return Ok(LoginOutcome::NeedsMfa(ClientState {
                csrf_token,
                signin_params: body,
                email: email.to_string(),
            }));
        }

        match extract_service_ticket(&body) {
            Some(ticket) => self.complete_with_ticket(&ticket).await,
            None => Ok(LoginOutcome::Failed(
                "SSO login did not return a service ticket".into(),
            )),
        }
    }

    /// Step 3's MFA branch of spec.md §4.4, picking up at the preserved
    /// [`ClientState`] rather than re-fetching the CSRF token.
    pub async fn resume_login(&self, mfa_code: &str, state: ClientState) -> SyncResult<LoginOutcome> {
        let response = self
            .http
            .post_form(
                &self.sso_url(SSO_LOGIN_PATH),
                &[
                    ("username", state.email.as_str()),
                    ("mfa-code", mfa_code),
                    ("_csrf", state.csrf_token.as_str()),
                ],
            )
            .await?;
        let body = response.text().await.map_err(SyncError::from)?;

        match extract_service_ticket(&body) {
            Some(ticket) => self.complete_with_ticket(&ticket).await,
            None => Ok(LoginOutcome::Failed("MFA verification failed".into())),
        }
    }

    /// Steps 4-5 of spec.md §4.4: redeem the ticket for OAuth1 using the
    /// mobile-app consumer key/secret, then exchange OAuth1 for OAuth2.
    async fn complete_with_ticket(&self, ticket: &str) -> SyncResult<LoginOutcome> {
        let response = self
            .http
            .post_form(
                &self.connect_url(TICKET_EXCHANGE_PATH),
                &[
                    ("ticket", ticket),
                    ("consumer_key", self.consumer_key.as_str()),
                    ("consumer_secret", self.consumer_secret.as_str()),
                ],
            )
            .await?;
        let oauth1: OAuth1Token = response.json().await.map_err(SyncError::from)?;
        let oauth2 = self.exchange_for_oauth2(&oauth1).await?;
        Ok(LoginOutcome::Success { oauth1, oauth2 })
    }
}

#[async_trait]
impl OAuth1Exchanger for LoginFlow {
    /// Shared by both fresh login (step 5) and `TokenManager::refresh` --
    /// Garmin has no refresh-token grant, only re-exchange of the long-lived
    /// OAuth1 pair (spec.md §4.2).
    async fn exchange_for_oauth2(&self, oauth1: &OAuth1Token) -> SyncResult<OAuth2Token> {
        let response = self
            .http
            .post_form(
                &self.connect_url(OAUTH2_EXCHANGE_PATH),
                &[
                    ("oauth_token", oauth1.oauth_token.as_str()),
                    ("oauth_token_secret", oauth1.oauth_token_secret.as_str()),
                ],
            )
            .await?;
        response.json().await.map_err(SyncError::from)
    }
}

fn extract_csrf_token(html: &str) -> SyncResult<String> {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        regex::Regex::new(r#"name="_csrf"\s+value="([^"]+)""#).expect("valid csrf regex")
    });
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| SyncError::login("CSRF token not found in SSO login page"))
}

fn body_requires_mfa(body: &str) -> bool {
    body.contains("needs_mfa") || body.contains("mfa-code")
}

fn extract_service_ticket(body: &str) -> Option<String> {
    static PATTERN: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = PATTERN.get_or_init(|| {
        regex::Regex::new(r#"embed\?ticket=([^"&]+)"#).expect("valid ticket regex")
    });
    re.captures(body).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csrf_token_from_form() {
        let html = r#"<form><input type="hidden" name="_csrf" value="abc123"/></form>"#;
        assert_eq!(extract_csrf_token(html).unwrap(), "abc123");
    }

    #[test]
    fn missing_csrf_token_is_a_login_error() {
        let html = "<html><body>no form here</body></html>";
        assert!(extract_csrf_token(html).is_err());
    }

    #[test]
    fn detects_mfa_challenge() {
        assert!(body_requires_mfa("please submit mfa-code to continue"));
        assert!(!body_requires_mfa("response.redirect(\"embed?ticket=XYZ\")"));
    }

    #[test]
    fn extracts_service_ticket() {
        let body = r#"response.redirect("https://connect.garmin.com/modern/embed?ticket=ST-12345-abc")"#;
        assert_eq!(extract_service_ticket(body).unwrap(), "ST-12345-abc");
    }
}
