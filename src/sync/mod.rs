// ABOUTME: Sync engine: entry point, phase orchestration, and per-activity detail sync
// ABOUTME: Grounded in spec.md §4.10/§4.11; no single teacher analog for the orchestration shape
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod backfill;
mod detail;
mod engine;

pub use backfill::{backfill_activity_details, backfill_activity_distance_from_splits, backfill_activity_splits};
pub use detail::sync_activity_details;
pub use engine::{SyncEngine, SyncSummary};
