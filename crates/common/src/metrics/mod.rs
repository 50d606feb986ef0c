//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all ArticleHub metrics
pub const METRICS_PREFIX: &str = "articlehub";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 250ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.100,  // 100ms
    0.250,  // 250ms - P99 target
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Article metrics
    describe_counter!(
        format!("{}_article_mutations_total", METRICS_PREFIX),
        Unit::Count,
        "Articles created, updated, or deleted"
    );

    describe_counter!(
        format!("{}_comment_mutations_total", METRICS_PREFIX),
        Unit::Count,
        "Comments created, updated, or deleted"
    );

    describe_counter!(
        format!("{}_csv_exports_total", METRICS_PREFIX),
        Unit::Count,
        "Total CSV exports served"
    );

    describe_counter!(
        format!("{}_csv_exported_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Total article rows written to CSV exports"
    );

    // Authorization metrics
    describe_counter!(
        format!("{}_permission_denied_total", METRICS_PREFIX),
        Unit::Count,
        "Mutations rejected by the ownership guard"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record article mutations (`created`, `updated`, `deleted`)
pub fn record_article_mutation(action: &'static str) {
    counter!(
        format!("{}_article_mutations_total", METRICS_PREFIX),
        "action" => action
    )
    .increment(1);
}

/// Helper to record comment mutations (`created`, `updated`, `deleted`)
pub fn record_comment_mutation(action: &'static str) {
    counter!(
        format!("{}_comment_mutations_total", METRICS_PREFIX),
        "action" => action
    )
    .increment(1);
}

/// Helper to record a CSV export
pub fn record_csv_export(rows: usize) {
    counter!(format!("{}_csv_exports_total", METRICS_PREFIX)).increment(1);
    counter!(format!("{}_csv_exported_rows_total", METRICS_PREFIX)).increment(rows as u64);
}

/// Helper to record an ownership rejection
pub fn record_permission_denied(resource: &'static str) {
    counter!(
        format!("{}_permission_denied_total", METRICS_PREFIX),
        "resource" => resource
    )
    .increment(1);
}
