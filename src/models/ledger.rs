// ABOUTME: Sync status ledger row and state enum
// ABOUTME: No direct teacher analog; grounded in spec.md §3 SyncStatusLedger and §4.9 idempotency rules
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of attempting one `(user_id, date, metric_kind)` unit of work.
///
/// A rerun skips rows already `Completed`, but re-attempts `Failed` or
/// `Skipped` rows (spec.md §4.9 invariant 3, preserved as-is rather than
/// "fixed" into a retry-count scheme — see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncState {
    Pending,
    Completed,
    Skipped,
    Failed,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Skipped => "SKIPPED",
            Self::Failed => "FAILED",
        }
    }

    /// Whether a sync run should skip this unit of work on a rerun.
    #[must_use]
    pub const fn should_skip_rerun(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::str::FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "SKIPPED" => Ok(Self::Skipped),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown sync state: {other}")),
        }
    }
}

/// One row per `(user_id, sync_date, metric_kind)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStatusRow {
    pub user_id: i64,
    pub sync_date: chrono::NaiveDate,
    pub metric_kind: String,
    pub state: SyncState,
    pub synced_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_skips_rerun() {
        assert!(SyncState::Completed.should_skip_rerun());
        assert!(!SyncState::Failed.should_skip_rerun());
        assert!(!SyncState::Skipped.should_skip_rerun());
        assert!(!SyncState::Pending.should_skip_rerun());
    }

    #[test]
    fn round_trips_through_str() {
        for state in [
            SyncState::Pending,
            SyncState::Completed,
            SyncState::Skipped,
            SyncState::Failed,
        ] {
            let parsed: SyncState = state.as_str().parse().unwrap();
            assert_eq!(parsed, state);
        }
    }
}
