// ABOUTME: CLI entry point: sync/status/reset/login/mfa subcommands driving the sync engine
// ABOUTME: Full interactive CLI is out of scope (spec.md §1); this is the thin driveable surface named in spec.md §6
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use garmin_sync::api::Api;
use garmin_sync::auth::{LoginFlow, TokenManager, TokenStore};
use garmin_sync::config::{init_logging, Config};
use garmin_sync::http::{HttpClient, RetryPolicy};
use garmin_sync::models::MetricKind;
use garmin_sync::reporter::{NullReporter, ProgressReporter, TracingReporter};
use garmin_sync::{SyncEngine, SyncError, SyncResult, Store};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "garmin-sync", about = "Sync wearable health data into a local store")]
struct Cli {
    /// Vendor domain to authenticate against (e.g. `garmin.com`).
    #[arg(long, global = true, default_value = "garmin.com")]
    domain: String,

    /// Account to operate on. Stable per-profile identifier, not the vendor's own user id.
    #[arg(long, global = true, default_value_t = 1)]
    user_id: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate and persist the resulting token pair.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Complete a login that returned `NeedsMfa`, given the code from the authenticator.
    Mfa {
        #[arg(long)]
        code: String,
    },
    /// Sync a date range (or the last N days) into the local store.
    Sync {
        #[arg(long, conflicts_with_all = ["date_range"])]
        last_days: Option<i64>,
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        date_range: Option<Vec<String>>,
        /// Comma-separated metric kinds; defaults to every kind.
        #[arg(long, value_delimiter = ',')]
        metrics: Option<Vec<String>>,
        /// Progress reporter implementation: `tracing` (default) or `null`.
        #[arg(long, default_value = "tracing")]
        progress: String,
    },
    /// Print the ledger's pending/failed counts for a date range.
    Status {
        #[arg(long, num_args = 2, value_names = ["START", "END"])]
        date_range: Vec<String>,
    },
    /// Reset FAILED ledger rows back to PENDING so the next sync retries them.
    Reset {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_level);

    let cli = Cli::parse();
    match run(cli, config).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> SyncResult<ExitCode> {
    let token_store = TokenStore::new(config.profile_path.clone());
    let auth_http = HttpClient::new_with_cookie_store(
        config.auth_timeout,
        "GCM-iOS-5.7.2.1",
        RetryPolicy {
            max_retries: config.retries,
            backoff_factor: config.backoff_factor,
        },
    )?;
    let login_flow = Arc::new(LoginFlow::new(
        auth_http,
        cli.domain.clone(),
        config.oauth_consumer_key.clone(),
        config.oauth_consumer_secret.clone(),
    ));
    let token_manager = TokenManager::new(token_store, login_flow.clone());
    token_manager.load().await?;

    match cli.command {
        Command::Login { email, password } => {
            match login_flow.login(&email, &password).await? {
                garmin_sync::auth::LoginOutcome::Success { oauth1, oauth2 } => {
                    token_manager.set_tokens(oauth1, oauth2).await?;
                    println!("login succeeded");
                    Ok(ExitCode::SUCCESS)
                }
                garmin_sync::auth::LoginOutcome::NeedsMfa(_) => {
                    println!("MFA required; run `garmin-sync mfa --code <CODE>`");
                    Ok(ExitCode::from(2))
                }
                garmin_sync::auth::LoginOutcome::Failed(reason) => {
                    eprintln!("login failed: {reason}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Mfa { code: _ } => {
            eprintln!(
                "MFA resume requires the ClientState captured from the prior `login` call; \
                 persisting that across process invocations is an integration detail left to the caller."
            );
            Ok(ExitCode::FAILURE)
        }
        Command::Sync { last_days, date_range, metrics, progress } => {
            let (start, end) = resolve_date_range(last_days, date_range)?;
            let kinds = resolve_metric_kinds(metrics)?;
            let reporter = resolve_reporter(&progress)?;

            let api_http = HttpClient::new(
                config.request_timeout,
                "GCM-iOS-5.7.2.1",
                RetryPolicy {
                    max_retries: config.retries,
                    backoff_factor: config.backoff_factor,
                },
            )?;
            let api = Api::new(api_http, token_manager, cli.domain.clone());
            let store = Store::connect(&config.db_path).await?;
            store.validate_schema().await?;

            let engine = SyncEngine::new(api, store, config);
            let summary = engine.sync_range(cli.user_id, start, end, &kinds, reporter.as_ref()).await?;

            println!(
                "completed={} skipped={} failed={} total_tasks={}",
                summary.completed, summary.skipped, summary.failed, summary.total_tasks
            );
            if summary.failed > 0 {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::Status { date_range } => {
            let [start, end] = parse_two_dates(&date_range)?;
            let store = Store::connect(&config.db_path).await?;
            let mut pending_total = 0usize;
            let mut date = start;
            while date <= end {
                pending_total += store.get_pending_metrics(cli.user_id, date).await?.len();
                date += ChronoDuration::days(1);
            }
            println!("pending_or_failed={pending_total}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Reset { force } => {
            if !force {
                eprintln!("refusing to reset without --force");
                return Ok(ExitCode::FAILURE);
            }
            let store = Store::connect(&config.db_path).await?;
            let reset = store.reset_failed_to_pending(cli.user_id).await?;
            println!("reset {reset} failed rows to pending");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_date_range(
    last_days: Option<i64>,
    date_range: Option<Vec<String>>,
) -> SyncResult<(NaiveDate, NaiveDate)> {
    if let Some(days) = last_days {
        let end = Utc::now().date_naive();
        let start = end - ChronoDuration::days(days.max(0));
        return Ok((start, end));
    }
    if let Some(range) = date_range {
        let [start, end] = parse_two_dates(&range)?;
        return Ok((start, end));
    }
    Err(SyncError::schema_validation(
        "one of --last-days or --date-range is required",
    ))
}

fn parse_two_dates(range: &[String]) -> SyncResult<[NaiveDate; 2]> {
    let [start_raw, end_raw] = range else {
        return Err(SyncError::schema_validation("--date-range expects exactly START and END"));
    };
    let start = NaiveDate::parse_from_str(start_raw, "%Y-%m-%d")?;
    let end = NaiveDate::parse_from_str(end_raw, "%Y-%m-%d")?;
    Ok([start, end])
}

fn resolve_reporter(name: &str) -> SyncResult<Box<dyn ProgressReporter>> {
    match name {
        "tracing" => Ok(Box::new(TracingReporter)),
        "null" => Ok(Box::new(NullReporter)),
        other => Err(SyncError::schema_validation(format!(
            "unknown --progress mode: {other} (expected `tracing` or `null`)"
        ))),
    }
}

fn resolve_metric_kinds(metrics: Option<Vec<String>>) -> SyncResult<Vec<MetricKind>> {
    match metrics {
        Some(names) => names
            .iter()
            .map(|name| MetricKind::from_str(name).map_err(SyncError::schema_validation))
            .collect(),
        None => Ok(MetricKind::all().to_vec()),
    }
}
