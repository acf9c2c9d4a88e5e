//! FICHES Telemetry - Observability Infrastructure
//!
//! Structured JSON logging through tracing-subscriber and Prometheus metrics
//! for the trigger endpoints.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, FichesMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
