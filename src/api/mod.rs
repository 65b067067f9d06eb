// ABOUTME: Authenticated HTTP access to the main Garmin Connect API host
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod client;

pub use client::Api;
