// ABOUTME: OAuth1 and OAuth2 token models with expiry predicates
// ABOUTME: Grounded on teacher src/models/oauth.rs::UserOAuthToken::{is_expired,needs_refresh}
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Long-lived OAuth1 token pair, refreshed only via re-login (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth1Token {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    #[serde(default)]
    pub mfa_token: Option<String>,
    #[serde(default)]
    pub mfa_expiration: Option<DateTime<Utc>>,
    pub domain: String,
}

/// Short-lived OAuth2 access/refresh token pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth2Token {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub scope: String,
    pub jti: String,
    pub expires_in: i64,
    pub expires_at: i64,
    pub refresh_token_expires_in: i64,
    pub refresh_token_expires_at: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuth2Token {
    /// `expired == now >= expires_at` (spec.md §3 invariant, verbatim).
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    /// `refresh_expired == now >= refresh_token_expires_at`.
    #[must_use]
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.refresh_token_expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(expires_at: i64, refresh_expires_at: i64) -> OAuth2Token {
        OAuth2Token {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            token_type: "Bearer".into(),
            scope: "CONNECT_READ".into(),
            jti: "jti-1".into(),
            expires_in: 3600,
            expires_at,
            refresh_token_expires_in: 86400,
            refresh_token_expires_at: refresh_expires_at,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let token = sample(now.timestamp(), now.timestamp() + 86400);
        assert!(token.expired(now));
        assert!(!token.refresh_expired(now));
    }

    #[test]
    fn round_trips_through_json() {
        let token = sample(1_700_000_000, 1_700_100_000);
        let json = serde_json::to_string(&token).unwrap();
        let parsed: OAuth2Token = serde_json::from_str(&json).unwrap();
        assert_eq!(token, parsed);
    }

    #[test]
    fn oauth1_round_trips_through_json() {
        let token = OAuth1Token {
            oauth_token: "t".into(),
            oauth_token_secret: "s".into(),
            mfa_token: None,
            mfa_expiration: None,
            domain: "garmin.com".into(),
        };
        let json = serde_json::to_string(&token).unwrap();
        let parsed: OAuth1Token = serde_json::from_str(&json).unwrap();
        assert_eq!(token, parsed);
    }
}
