//! Health Endpoints
//!
//! `/health/ping` and `/health/live` answer as long as the process serves
//! requests. `/health/ready` also needs the document store: every trigger
//! and the backfill read from it.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use fiches_storage::DocumentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

/// Body of `/health/ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readiness {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

/// GET /health/ping
pub async fn ping() -> &'static str {
    "pong"
}

/// GET /health/live
pub async fn live() -> &'static str {
    "alive"
}

/// GET /health/ready
pub async fn ready(
    State(store): State<Arc<dyn DocumentStore>>,
) -> (StatusCode, Json<Readiness>) {
    let started = Instant::now();
    match store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Readiness {
                ready: true,
                store_latency_ms: Some(started.elapsed().as_millis() as u64),
                store_error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(
                error.kind = e.kind(),
                error.message = %e,
                "Document store not reachable"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    ready: false,
                    store_latency_ms: None,
                    store_error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiches_storage::MockStore;

    #[tokio::test]
    async fn test_ready_with_reachable_store() {
        let store: Arc<dyn DocumentStore> = Arc::new(MockStore::new());
        let (status, Json(body)) = ready(State(store)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.ready);
        assert!(body.store_latency_ms.is_some());
        assert!(body.store_error.is_none());
    }

    #[tokio::test]
    async fn test_ready_with_unreachable_store() {
        let store = MockStore::new();
        store.set_unhealthy(true);
        let store: Arc<dyn DocumentStore> = Arc::new(store);
        let (status, Json(body)) = ready(State(store)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!body.ready);
        assert!(body.store_error.is_some());

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ready"], false);
        assert!(json.get("storeLatencyMs").is_none());
    }
}
