//! Document Trigger Routes
//!
//! Entry points called when a sheet is created or updated, or an event is
//! updated. Domain failures never surface: the services log them and the
//! response carries `null` instead of a report.

use axum::{extract::State, routing::post, Json, Router};
use fiches_core::{Event, Sheet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::services::{FieldSyncPropagator, NotificationDispatcher, NotificationReport};
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// A document as it is after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedPayload<T> {
    pub value: T,
}

/// A document before and after an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload<T> {
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification: Option<NotificationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSyncResponse {
    pub updated_sheets: Option<usize>,
}

fn require_id(id: &str, field: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::missing_field(field));
    }
    Ok(())
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /triggers/sheets/created
pub async fn sheet_created(
    State(dispatcher): State<Arc<NotificationDispatcher>>,
    Json(payload): Json<CreatedPayload<Sheet>>,
) -> ApiResult<Json<NotificationResponse>> {
    require_id(&payload.value.id, "value.id")?;
    let notification = dispatcher.process_sheet_created(&payload.value).await;
    Ok(Json(NotificationResponse { notification }))
}

/// POST /triggers/sheets/updated
pub async fn sheet_updated(
    State(dispatcher): State<Arc<NotificationDispatcher>>,
    Json(payload): Json<ChangePayload<Sheet>>,
) -> ApiResult<Json<NotificationResponse>> {
    require_id(&payload.after.id, "after.id")?;
    let notification = dispatcher
        .process_sheet_updated(&payload.before, &payload.after)
        .await;
    Ok(Json(NotificationResponse { notification }))
}

/// POST /triggers/events/updated
pub async fn event_updated(
    State(propagator): State<Arc<FieldSyncPropagator>>,
    Json(payload): Json<ChangePayload<Event>>,
) -> ApiResult<Json<SheetSyncResponse>> {
    require_id(&payload.after.id, "after.id")?;
    let updated_sheets = propagator.update_sheets_from_event(&payload.after).await;
    Ok(Json(SheetSyncResponse { updated_sheets }))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/triggers/sheets/created", post(sheet_created))
        .route("/triggers/sheets/updated", post(sheet_updated))
        .route("/triggers/events/updated", post(event_updated))
}
