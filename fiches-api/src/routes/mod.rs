//! REST API Routes Module
//!
//! Assembles the trigger, backfill, health and metrics routes into one
//! Axum router with CORS, request tracing and metrics applied.

pub mod backfill;
pub mod health;
pub mod triggers;

use axum::{
    http::{request::Parts, HeaderValue},
    middleware,
    routing::{any, get},
    Router,
};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Build the complete application router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route(
            "/addEventStartAndEndDates",
            any(backfill::add_event_start_and_end_dates),
        )
        .merge(triggers::create_router())
        .nest("/health", health::create_router())
        .with_state(state)
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(observability_middleware))
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer.
///
/// With no configured origin every origin is accepted by echoing it back.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing any origin");
        return cors.allow_origin(AllowOrigin::mirror_request());
    }

    tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
    let config = config.clone();
    cors.allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, _parts: &Parts| {
            origin
                .to_str()
                .map(|origin| config.is_origin_allowed(origin))
                .unwrap_or(false)
        },
    ))
}
