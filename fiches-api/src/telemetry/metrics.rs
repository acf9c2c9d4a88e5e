//! Prometheus Metrics Definitions
//!
//! Defines the FICHES metrics and exposes a /metrics endpoint for
//! Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<FichesMetrics>> = Lazy::new(FichesMetrics::new);

/// Container for all FICHES metrics.
#[derive(Clone)]
pub struct FichesMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Notification mails - labels: template, outcome (sent/failed)
    pub mail_sends_total: CounterVec,

    /// Event propagations - labels: outcome (success/failure)
    pub sheet_syncs_total: CounterVec,

    /// Sheet documents written by the backfill - labels: outcome (updated/missing_event)
    pub backfill_sheets_total: CounterVec,
}

impl FichesMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "fiches_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_requests_total: {}", e)))?,

            http_request_duration_seconds: register_histogram_vec!(
                "fiches_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register http_request_duration_seconds: {}", e)))?,

            mail_sends_total: register_counter_vec!(
                "fiches_mail_sends_total",
                "Notification mails handed to the provider",
                &["template", "outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register mail_sends_total: {}", e)))?,

            sheet_syncs_total: register_counter_vec!(
                "fiches_sheet_syncs_total",
                "Event to sheet field propagations",
                &["outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register sheet_syncs_total: {}", e)))?,

            backfill_sheets_total: register_counter_vec!(
                "fiches_backfill_sheets_total",
                "Sheets handled by the event date backfill",
                &["outcome"]
            )
            .map_err(|e| ApiError::internal_error(format!("Failed to register backfill_sheets_total: {}", e)))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record one mail hand-off.
    pub fn record_mail_send(&self, template: &str, success: bool) {
        let outcome = if success { "sent" } else { "failed" };
        self.mail_sends_total
            .with_label_values(&[template, outcome])
            .inc();
    }

    /// Record one event propagation.
    pub fn record_sheet_sync(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.sheet_syncs_total.with_label_values(&[outcome]).inc();
    }

    /// Record the per-sheet outcome counts of a backfill run.
    pub fn record_backfill(&self, updated: usize, missing_event: usize) {
        self.backfill_sheets_total
            .with_label_values(&["updated"])
            .inc_by(updated as f64);
        self.backfill_sheets_total
            .with_label_values(&["missing_event"])
            .inc_by(missing_event as f64);
    }
}

/// Run `f` against the global metrics, skipping silently if registration failed.
pub fn with_metrics(f: impl FnOnce(&FichesMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
