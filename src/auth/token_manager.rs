// ABOUTME: In-memory token facade: expiry/refresh predicates and auth header construction
// ABOUTME: Grounded on teacher src/models/oauth.rs::UserOAuthToken::{is_expired,needs_refresh}
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::{OAuth1Token, OAuth2Token};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::token_store::TokenStore;

/// Exchanges a long-lived OAuth1 token pair for a fresh OAuth2 access/refresh
/// pair. Garmin has no refresh-token grant endpoint: refresh means redoing
/// step 5 of the login flow (spec.md §4.4, §4.2 "Refresh obtained by
/// exchanging OAuth1 again"). Implemented by [`crate::auth::login::LoginFlow`];
/// expressed as a trait here so `TokenManager` does not depend on the login
/// module's HTTP plumbing directly.
#[async_trait]
pub trait OAuth1Exchanger: Send + Sync {
    async fn exchange_for_oauth2(&self, oauth1: &OAuth1Token) -> SyncResult<OAuth2Token>;
}

/// Pure in-memory facade over `(oauth1?, oauth2?)`, backed by a [`TokenStore`]
/// for persistence. Holds no lock across `.await` points: every method that
/// touches the network clones what it needs out of the guard first.
#[derive(Clone)]
pub struct TokenManager {
    store: TokenStore,
    state: Arc<RwLock<Option<(OAuth1Token, OAuth2Token)>>>,
    exchanger: Arc<dyn OAuth1Exchanger>,
}

impl TokenManager {
    pub fn new(store: TokenStore, exchanger: Arc<dyn OAuth1Exchanger>) -> Self {
        Self {
            store,
            state: Arc::new(RwLock::new(None)),
            exchanger,
        }
    }

    /// Load any persisted tokens into memory. Called once at startup.
    pub async fn load(&self) -> SyncResult<()> {
        let loaded = self.store.load().await?;
        *self.state.write().await = loaded;
        Ok(())
    }

    /// Install a freshly obtained token pair (post-login) and persist it.
    pub async fn set_tokens(&self, oauth1: OAuth1Token, oauth2: OAuth2Token) -> SyncResult<()> {
        self.store.save(&oauth1, &oauth2).await?;
        *self.state.write().await = Some((oauth1, oauth2));
        Ok(())
    }

    /// `is_authenticated() == both present && !oauth2.expired`.
    pub async fn is_authenticated(&self) -> bool {
        let guard = self.state.read().await;
        guard
            .as_ref()
            .is_some_and(|(_, oauth2)| !oauth2.expired(Utc::now()))
    }

    /// `needs_refresh() == both present && oauth2.expired && !oauth2.refresh_expired`.
    pub async fn needs_refresh(&self) -> bool {
        let guard = self.state.read().await;
        guard.as_ref().is_some_and(|(_, oauth2)| {
            let now = Utc::now();
            oauth2.expired(now) && !oauth2.refresh_expired(now)
        })
    }

    /// Refresh is an ordered phase: exchange OAuth1 for a fresh OAuth2 pair
    /// and persist it. Refresh is a single in-flight operation per process;
    /// the write lock naturally serializes concurrent callers (spec.md §4.3,
    /// §5 — a future parallel variant would need this as its coalescing
    /// point).
    pub async fn refresh(&self) -> SyncResult<()> {
        let mut guard = self.state.write().await;
        let (oauth1, _) = guard
            .as_ref()
            .ok_or_else(|| SyncError::auth("no tokens to refresh"))?;
        let oauth1 = oauth1.clone();
        let oauth2 = self.exchanger.exchange_for_oauth2(&oauth1).await?;
        self.store.save(&oauth1, &oauth2).await?;
        info!("refreshed OAuth2 access token");
        *guard = Some((oauth1, oauth2));
        Ok(())
    }

    /// Refresh if needed, then return the `Authorization` header value.
    /// Raises `NotAuthenticated` if no tokens are present or the refresh
    /// token itself has expired (caller must re-login).
    pub async fn auth_header(&self) -> SyncResult<String> {
        if self.needs_refresh().await {
            self.refresh().await?;
        }
        let guard = self.state.read().await;
        let (_, oauth2) = guard
            .as_ref()
            .ok_or_else(|| SyncError::auth("not authenticated"))?;
        if oauth2.expired(Utc::now()) {
            return Err(SyncError::auth(
                "access token expired and refresh token also expired; re-login required",
            ));
        }
        Ok(format!("{} {}", oauth2.token_type, oauth2.access_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingExchanger {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OAuth1Exchanger for CountingExchanger {
        async fn exchange_for_oauth2(&self, oauth1: &OAuth1Token) -> SyncResult<OAuth2Token> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(OAuth2Token {
                access_token: format!("refreshed-for-{}", oauth1.oauth_token),
                refresh_token: "r2".into(),
                token_type: "Bearer".into(),
                scope: "CONNECT_READ".into(),
                jti: "jti2".into(),
                expires_in: 3600,
                expires_at: Utc::now().timestamp() + 3600,
                refresh_token_expires_in: 86400,
                refresh_token_expires_at: Utc::now().timestamp() + 86400,
            })
        }
    }

    fn expired_pair(refresh_expired: bool) -> (OAuth1Token, OAuth2Token) {
        let now = Utc::now().timestamp();
        (
            OAuth1Token {
                oauth_token: "t1".into(),
                oauth_token_secret: "s1".into(),
                mfa_token: None,
                mfa_expiration: None,
                domain: "garmin.com".into(),
            },
            OAuth2Token {
                access_token: "stale".into(),
                refresh_token: "r1".into(),
                token_type: "Bearer".into(),
                scope: "CONNECT_READ".into(),
                jti: "jti1".into(),
                expires_in: 3600,
                expires_at: now - 10,
                refresh_token_expires_in: 86400,
                refresh_token_expires_at: if refresh_expired { now - 5 } else { now + 86400 },
            },
        )
    }

    #[tokio::test]
    async fn not_authenticated_without_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        let exchanger = Arc::new(CountingExchanger {
            calls: AtomicUsize::new(0),
        });
        let manager = TokenManager::new(store, exchanger);
        assert!(!manager.is_authenticated().await);
        assert!(manager.auth_header().await.is_err());
    }

    #[tokio::test]
    async fn refreshes_expired_access_token_when_refresh_token_is_live() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        let exchanger = Arc::new(CountingExchanger {
            calls: AtomicUsize::new(0),
        });
        let manager = TokenManager::new(store, exchanger.clone());
        let (oauth1, oauth2) = expired_pair(false);
        manager.set_tokens(oauth1, oauth2).await.unwrap();

        assert!(manager.needs_refresh().await);
        let header = manager.auth_header().await.unwrap();
        assert!(header.contains("refreshed-for-t1"));
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 1);
        assert!(manager.is_authenticated().await);
    }

    #[tokio::test]
    async fn refresh_token_also_expired_requires_relogin() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        let exchanger = Arc::new(CountingExchanger {
            calls: AtomicUsize::new(0),
        });
        let manager = TokenManager::new(store, exchanger.clone());
        let (oauth1, oauth2) = expired_pair(true);
        manager.set_tokens(oauth1, oauth2).await.unwrap();

        assert!(!manager.needs_refresh().await);
        assert!(manager.auth_header().await.is_err());
        assert_eq!(exchanger.calls.load(Ordering::SeqCst), 0);
    }
}
