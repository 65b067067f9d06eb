// ABOUTME: Immutable runtime configuration assembled once from environment variables
// ABOUTME: No global mutable singleton — Config is constructed at startup and passed by value
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "GARMIN_SYNC";

/// Strongly typed log level, parsed from `GARMIN_SYNC_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }

    #[must_use]
    pub const fn as_filter(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Immutable configuration for a sync run, read once from the environment at
/// process start and threaded into `Api`/`SyncEngine` constructors.
///
/// Replaces the "global mutable config singleton" pattern the original
/// Python source used (see SPEC_FULL.md REDESIGN FLAGS).
#[derive(Debug, Clone)]
pub struct Config {
    /// Profile directory holding token files and the database (`GARMIN_SYNC_PROFILE_PATH`).
    pub profile_path: PathBuf,
    /// Explicit database path override (`GARMIN_SYNC_DB_PATH`), defaults to `{profile_path}/health.db`.
    pub db_path: PathBuf,
    /// Per-request timeout for the main API host (`GARMIN_SYNC_REQUEST_TIMEOUT`, seconds).
    pub request_timeout: Duration,
    /// Per-request timeout for the SSO/auth host (`GARMIN_SYNC_AUTH_TIMEOUT`, seconds).
    pub auth_timeout: Duration,
    /// HTTP retry attempts (`GARMIN_SYNC_RETRIES`).
    pub retries: u32,
    /// Exponential backoff base factor in seconds.
    pub backoff_factor: f64,
    /// Reserved for a future parallel sync variant (`GARMIN_SYNC_MAX_WORKERS`).
    pub max_workers: usize,
    /// OAuth1 consumer key override (`GARMIN_SYNC_OAUTH_CONSUMER_KEY`).
    pub oauth_consumer_key: String,
    /// OAuth1 consumer secret override (`GARMIN_SYNC_OAUTH_CONSUMER_SECRET`).
    pub oauth_consumer_secret: String,
    /// Delay between detail/body-composition fetches, per spec.md §4.10/§5.
    pub rate_limit_delay: Duration,
    /// Maximum span of a single `sync_range` call, per spec.md §4.10.
    pub max_sync_span: chrono::Duration,
    /// Activities pagination batch size, per spec.md §4.8.
    pub activities_batch_size: usize,
    /// Log level.
    pub log_level: LogLevel,
}

impl Config {
    /// Built-in mobile-app OAuth1 consumer credentials used when no
    /// environment override is present. These are not per-user secrets.
    const DEFAULT_OAUTH_CONSUMER_KEY: &'static str = "garmin-connect-mobile-app";
    const DEFAULT_OAUTH_CONSUMER_SECRET: &'static str = "garmin-connect-mobile-secret";

    /// Assemble configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined and no
    /// explicit profile path override was provided.
    pub fn from_env() -> anyhow::Result<Self> {
        let profile_path = match env::var(format!("{ENV_PREFIX}_PROFILE_PATH")) {
            Ok(v) => PathBuf::from(v),
            Err(_) => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?
                .join(".garmin-sync"),
        };

        let db_path = env::var(format!("{ENV_PREFIX}_DB_PATH"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| profile_path.join("health.db"));

        let request_timeout =
            Duration::from_secs(env_u64(&format!("{ENV_PREFIX}_REQUEST_TIMEOUT"), 10));
        let auth_timeout = Duration::from_secs(env_u64(&format!("{ENV_PREFIX}_AUTH_TIMEOUT"), 15));
        let retries = u32::try_from(env_u64(&format!("{ENV_PREFIX}_RETRIES"), 3)).unwrap_or(3);
        let max_workers =
            usize::try_from(env_u64(&format!("{ENV_PREFIX}_MAX_WORKERS"), 1)).unwrap_or(1);

        let oauth_consumer_key = env::var(format!("{ENV_PREFIX}_OAUTH_CONSUMER_KEY"))
            .unwrap_or_else(|_| Self::DEFAULT_OAUTH_CONSUMER_KEY.to_string());
        let oauth_consumer_secret = env::var(format!("{ENV_PREFIX}_OAUTH_CONSUMER_SECRET"))
            .unwrap_or_else(|_| Self::DEFAULT_OAUTH_CONSUMER_SECRET.to_string());

        let log_level = env::var(format!("{ENV_PREFIX}_LOG_LEVEL"))
            .map(|v| LogLevel::from_str_or_default(&v))
            .unwrap_or_default();

        Ok(Self {
            profile_path,
            db_path,
            request_timeout,
            auth_timeout,
            retries,
            backoff_factor: 1.0,
            max_workers,
            oauth_consumer_key,
            oauth_consumer_secret,
            rate_limit_delay: Duration::from_millis(500),
            max_sync_span: chrono::Duration::days(365 * 10),
            activities_batch_size: 50,
            log_level,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Install the process-wide `tracing` subscriber. Call once at binary start.
pub fn init_logging(level: LogLevel) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
