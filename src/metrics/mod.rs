// ABOUTME: Metric accessor dispatch layer: endpoint templates keyed by metric kind
// ABOUTME: Grounded on teacher src/providers/registry.rs declarative provider table
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2026 garmin-sync contributors

mod registry;

pub use registry::{
    activities_page_endpoint, body_composition_range_endpoint, MetricDescriptor, MetricRegistry,
};
