//! Metrics and monitoring for the triage service
//!
//! This module provides Prometheus metrics collection for patient flow and
//! store performance, and text encoding for the `/metrics` endpoint.

pub mod collector;

pub use collector::{
    CheckInSource, MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics,
    ServiceMetrics,
};

use anyhow::Result;
use prometheus::{Encoder, TextEncoder};

/// Encode every registered metric in the Prometheus text format
pub fn encode_metrics(collector: &MetricsCollector) -> Result<String> {
    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    encoder
        .encode_to_string(&metric_families)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
}

/// Content type served alongside [`encode_metrics`]
pub fn metrics_content_type() -> String {
    TextEncoder::new().format_type().to_string()
}
