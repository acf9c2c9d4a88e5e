//! Backfill Route
//!
//! `/addEventStartAndEndDates` answers any method. The job runs inside the
//! request; the response only tells whether it completed.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fiches_core::FichesError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::jobs::BackfillJob;

/// Body of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillResponse {
    pub results: String,
}

/// Body of a failed run. `error` holds the failure serialized as a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillFailure {
    pub error: String,
}

impl BackfillFailure {
    pub fn from_error(error: &FichesError) -> Self {
        Self {
            error: json!({
                "name": error.kind(),
                "message": error.to_string(),
            })
            .to_string(),
        }
    }
}

/// ANY /addEventStartAndEndDates
pub async fn add_event_start_and_end_dates(State(job): State<Arc<BackfillJob>>) -> Response {
    match job.add_event_start_and_end_dates().await {
        Ok(_) => (
            StatusCode::OK,
            Json(BackfillResponse {
                results: "OK".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(
                error.kind = e.kind(),
                error.message = %e,
                "Event date backfill failed"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(BackfillFailure::from_error(&e)),
            )
                .into_response()
        }
    }
}
