// ABOUTME: Atomic on-disk persistence of OAuth1/OAuth2 token files under the profile directory
// ABOUTME: No direct teacher analog (teacher stores tokens encrypted in SQLite); write-then-rename is novel here
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use crate::errors::{SyncError, SyncResult};
use crate::models::{OAuth1Token, OAuth2Token};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const OAUTH1_FILENAME: &str = "oauth1_token.json";
const OAUTH2_FILENAME: &str = "oauth2_token.json";

/// Reads and writes token files under `{profile_path}/`.
///
/// Writes are atomic: the new content is written to a sibling `.tmp` file
/// and renamed into place, so a crash mid-write never leaves a corrupt or
/// half-written token file behind (spec.md §6, filesystem error handling).
#[derive(Debug, Clone)]
pub struct TokenStore {
    profile_path: PathBuf,
}

impl TokenStore {
    #[must_use]
    pub fn new(profile_path: PathBuf) -> Self {
        Self { profile_path }
    }

    fn oauth1_path(&self) -> PathBuf {
        self.profile_path.join(OAUTH1_FILENAME)
    }

    fn oauth2_path(&self) -> PathBuf {
        self.profile_path.join(OAUTH2_FILENAME)
    }

    /// Load both tokens from disk. Returns `Ok(None)` if either file is
    /// absent (no stored session yet); missing files are not an error.
    pub async fn load(&self) -> SyncResult<Option<(OAuth1Token, OAuth2Token)>> {
        let oauth1 = match read_json(&self.oauth1_path()).await? {
            Some(t) => t,
            None => return Ok(None),
        };
        let oauth2 = match read_json(&self.oauth2_path()).await? {
            Some(t) => t,
            None => return Ok(None),
        };
        Ok(Some((oauth1, oauth2)))
    }

    /// Persist both tokens atomically, overwriting any existing files.
    pub async fn save(&self, oauth1: &OAuth1Token, oauth2: &OAuth2Token) -> SyncResult<()> {
        fs::create_dir_all(&self.profile_path)
            .await
            .map_err(map_io_error)?;
        write_json_atomic(&self.oauth1_path(), oauth1).await?;
        write_json_atomic(&self.oauth2_path(), oauth2).await?;
        debug!(path = %self.profile_path.display(), "persisted token pair");
        Ok(())
    }

    /// Remove both token files, if present. Used by the `reset` CLI path.
    pub async fn clear(&self) -> SyncResult<()> {
        for path in [self.oauth1_path(), self.oauth2_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(map_io_error(e)),
            }
        }
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> SyncResult<Option<T>> {
    match fs::read(path).await {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| SyncError::auth(format!("corrupt token file {}: {e}", path.display())))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(map_io_error(e)),
    }
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> SyncResult<()> {
    let tmp_path = path.with_extension("tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp_path, &bytes).await.map_err(map_io_error)?;
    fs::rename(&tmp_path, path).await.map_err(map_io_error)?;
    Ok(())
}

fn map_io_error(e: std::io::Error) -> SyncError {
    if crate::errors::io_error_is_critical(&e) {
        warn!(error = %e, "filesystem error persisting tokens");
        SyncError::filesystem_critical(e.to_string())
    } else {
        SyncError::auth(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_tokens() -> (OAuth1Token, OAuth2Token) {
        (
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
                expires_at: Utc::now().timestamp() + 3600,
                refresh_token_expires_in: 86400,
                refresh_token_expires_at: Utc::now().timestamp() + 86400,
            },
        )
    }

    #[tokio::test]
    async fn missing_store_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        let (oauth1, oauth2) = sample_tokens();
        store.save(&oauth1, &oauth2).await.unwrap();
        let (loaded1, loaded2) = store.load().await.unwrap().unwrap();
        assert_eq!(loaded1, oauth1);
        assert_eq!(loaded2, oauth2);
    }

    #[tokio::test]
    async fn clear_removes_files_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().to_path_buf());
        let (oauth1, oauth2) = sample_tokens();
        store.save(&oauth1, &oauth2).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }
}
