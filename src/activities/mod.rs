// ABOUTME: Forward-cursor pagination over the activities list
// ABOUTME: Grounded on teacher crates/pierre-providers/src/activity_iterator.rs
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod iterator;

pub use iterator::{ActivitiesCursor, DEFAULT_BATCH_SIZE};
