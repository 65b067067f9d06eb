// ABOUTME: garmin-sync: OAuth token lifecycle, rate-limited HTTP client, and idempotent sync into local SQLite
// ABOUTME: Module layout mirrors the teacher's crate: auth/http/api transport, pure extract, declarative metrics, sync orchestration
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

pub mod activities;
pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod extract;
pub mod http;
pub mod metrics;
pub mod models;
pub mod reporter;
pub mod store;
pub mod sync;

pub use config::Config;
pub use errors::{SyncError, SyncResult};
pub use store::Store;
pub use sync::{SyncEngine, SyncSummary};
