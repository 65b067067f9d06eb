// ABOUTME: Progress reporter capability set for sync-engine callbacks
// ABOUTME: No teacher analog for the trait shape; plain trait (no async_trait) since callbacks are synchronous
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

use chrono::NaiveDate;

/// Behavioral interface the sync engine reports progress through.
///
/// A capability set rather than a single fat callback (spec.md §4.12):
/// implementations that only care about failures can override `task_failed`
/// and leave the rest as no-ops. All methods take `&self` — reporters that
/// need mutable state (a progress bar's counter) should use interior
/// mutability, matching how the teacher's `FitnessProvider` trait keeps
/// `&self` receivers for what are logically stateful operations.
pub trait ProgressReporter: Send + Sync {
    fn start_sync(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    fn task_complete(&self, name: &str, date: NaiveDate) {
        let _ = (name, date);
    }

    fn task_skipped(&self, name: &str, date: NaiveDate) {
        let _ = (name, date);
    }

    fn task_failed(&self, name: &str, date: NaiveDate, error: &str) {
        let _ = (name, date, error);
    }

    fn info(&self, message: &str) {
        let _ = message;
    }

    fn warning(&self, message: &str) {
        let _ = message;
    }

    fn error(&self, message: &str) {
        let _ = message;
    }

    fn end_sync(&self) {}
}

/// Reporter that does nothing; the engine must function correctly against it
/// (spec.md §4.12).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {}

/// Reporter that forwards every callback to `tracing`, used by the CLI
/// binary in place of a progress bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn start_sync(&self, total_tasks: usize) {
        tracing::info!(total_tasks, "sync started");
    }

    fn task_complete(&self, name: &str, date: NaiveDate) {
        tracing::debug!(%name, %date, "task complete");
    }

    fn task_skipped(&self, name: &str, date: NaiveDate) {
        tracing::debug!(%name, %date, "task skipped");
    }

    fn task_failed(&self, name: &str, date: NaiveDate, error: &str) {
        tracing::warn!(%name, %date, %error, "task failed");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn end_sync(&self) {
        tracing::info!("sync finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_reporter_accepts_every_callback() {
        let reporter = NullReporter;
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        reporter.start_sync(10);
        reporter.task_complete("steps", date);
        reporter.task_skipped("steps", date);
        reporter.task_failed("steps", date, "boom");
        reporter.info("hi");
        reporter.warning("careful");
        reporter.error("bad");
        reporter.end_sync();
    }
}
