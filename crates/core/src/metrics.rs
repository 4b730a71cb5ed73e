//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline (conversions by operation and outcome, durations)
//! - Converter (tool runs by result)
//! - Staging (cleanup failures)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Conversions total by operation and outcome.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rasterbridge_conversions_total", "Total conversion requests"),
        &["operation", "outcome"], // outcome: "succeeded", "rejected", "failed"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rasterbridge_conversion_duration_seconds",
            "Duration of a full pipeline run",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Converter Metrics
// =============================================================================

/// Converter tool runs by result.
pub static TOOL_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rasterbridge_tool_runs_total", "Total converter tool runs"),
        &["result"], // "success", "failure", "timeout", "cancelled", "error"
    )
    .unwrap()
});

// =============================================================================
// Staging Metrics
// =============================================================================

/// Staging namespaces that could not be removed.
pub static STAGING_CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rasterbridge_staging_cleanup_failures_total",
        "Staging namespaces that failed to be removed",
    )
    .unwrap()
});

/// Returns all core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(TOOL_RUNS.clone()),
        Box::new(STAGING_CLEANUP_FAILURES.clone()),
    ]
}
