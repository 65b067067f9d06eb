// ABOUTME: Centralized error taxonomy for the sync engine
// ABOUTME: AuthError/LoginError/APIError/SchemaValidation/StoreError/FilesystemCritical
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use thiserror::Error;

/// Result alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error taxonomy for the synchronization core.
///
/// Per-task errors inside the sync loop are caught and recorded in the
/// status ledger rather than propagated through this type; `SyncError`
/// is reserved for failures that abort a whole `sync_range` run (auth,
/// schema precondition, filesystem-critical token I/O) or that a caller
/// needs to branch on directly (login).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Any authentication failure not narrowable to `Login`.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Bad credentials, bad MFA code, or a missing service ticket during login.
    #[error("login error: {0}")]
    Login(String),

    /// Underlying HTTP failure after retries were exhausted.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code of the final failed attempt, 0 if the request never got a response.
        status: u16,
        /// Response body or transport error text.
        body: String,
    },

    /// Engine precondition violated before any I/O began (e.g. date range too large).
    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    /// Persistence error from the local store.
    #[error("store error: {0}")]
    Store(String),

    /// ENOSPC/EROFS/permission error loading or saving token files. Always surfaced.
    #[error("filesystem critical error: {0}")]
    FilesystemCritical(String),
}

impl SyncError {
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    #[must_use]
    pub fn login(message: impl Into<String>) -> Self {
        Self::Login(message.into())
    }

    #[must_use]
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn schema_validation(message: impl Into<String>) -> Self {
        Self::SchemaValidation(message.into())
    }

    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    #[must_use]
    pub fn filesystem_critical(message: impl Into<String>) -> Self {
        Self::FilesystemCritical(message.into())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        Self::Api {
            status: error.status().map(|s| s.as_u16()).unwrap_or(0),
            body: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(error: serde_json::Error) -> Self {
        Self::Api {
            status: 0,
            body: format!("JSON decode error: {error}"),
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(error: sqlx::Error) -> Self {
        Self::Store(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for SyncError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        Self::Store(error.to_string())
    }
}

impl From<chrono::ParseError> for SyncError {
    fn from(error: chrono::ParseError) -> Self {
        Self::Api {
            status: 0,
            body: format!("date parse error: {error}"),
        }
    }
}

/// Classify a `std::io::Error` the way §4.1 requires: `ENOSPC`/`EROFS` and
/// permission errors are fatal; everything else is recoverable by the caller
/// (corrupt/missing token files are treated as absent).
#[must_use]
pub fn io_error_is_critical(error: &std::io::Error) -> bool {
    if error.kind() == std::io::ErrorKind::PermissionDenied {
        return true;
    }
    // ENOSPC (28) and EROFS (30) on Linux; checked via raw_os_error rather than
    // ErrorKind::{StorageFull,ReadOnlyFilesystem} since those variants are not
    // stable on every toolchain this crate targets.
    matches!(error.raw_os_error(), Some(28) | Some(30))
}
