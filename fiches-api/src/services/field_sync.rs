//! Field-Sync Propagator
//!
//! Copies an event's shared fields onto every sheet that references it.

use std::sync::Arc;

use fiches_core::{Collection, Event, FichesResult};
use fiches_storage::{DocumentStore, FieldUpdate, Query};
use futures::future::try_join_all;

use crate::constants::RELATED_EVENTS_FIELD;
use crate::telemetry::metrics::with_metrics;

/// Keeps sheets' denormalized event fields in line with their events.
pub struct FieldSyncPropagator {
    store: Arc<dyn DocumentStore>,
}

impl FieldSyncPropagator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the event's sync fields onto every sheet listing it in
    /// `relatedEventsIds`.
    ///
    /// Returns the number of sheets updated, or `None` if the query or any
    /// update failed. Updates that succeeded before a failure are kept.
    pub async fn update_sheets_from_event(&self, event: &Event) -> Option<usize> {
        match self.try_update(event).await {
            Ok(count) => {
                with_metrics(|metrics| metrics.record_sheet_sync(true));
                tracing::info!(event_id = %event.id, sheets = count, "Event fields propagated");
                Some(count)
            }
            Err(e) => {
                with_metrics(|metrics| metrics.record_sheet_sync(false));
                tracing::error!(
                    error.kind = e.kind(),
                    error.message = %e,
                    event_id = %event.id,
                    "Event field propagation failed"
                );
                None
            }
        }
    }

    async fn try_update(&self, event: &Event) -> FichesResult<usize> {
        let sheets = self
            .store
            .query(
                Collection::Sheets,
                &Query::array_contains(RELATED_EVENTS_FIELD, event.id.as_str()),
            )
            .await?;

        let update = FieldUpdate::from(event.sheet_sync_fields());
        let updates = sheets.iter().map(|sheet| {
            self.store
                .update(Collection::Sheets, &sheet.id, &update)
        });
        try_join_all(updates).await?;

        Ok(sheets.len())
    }
}

// ============================================================================
// TESTS
// ============================================================================
