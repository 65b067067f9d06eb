// ABOUTME: HTTP transport layer with retry/backoff, shared by the auth and API clients
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod client;

pub use client::{HttpClient, RetryPolicy};
