//! Shared application state for Axum routers.

use std::sync::Arc;

use fiches_mail::Mailer;
use fiches_storage::DocumentStore;

use crate::jobs::BackfillJob;
use crate::services::{FieldSyncPropagator, NotificationDispatcher};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub propagator: Arc<FieldSyncPropagator>,
    pub backfill: Arc<BackfillJob>,
}

impl AppState {
    /// Wire every component onto the same store.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn Mailer>,
        sheet_base_url: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher: Arc::new(NotificationDispatcher::new(
                Arc::clone(&store),
                mailer,
                sheet_base_url,
            )),
            propagator: Arc::new(FieldSyncPropagator::new(Arc::clone(&store))),
            backfill: Arc::new(BackfillJob::new(Arc::clone(&store))),
            store,
        }
    }
}

crate::impl_from_ref!(Arc<dyn DocumentStore>, store);
crate::impl_from_ref!(Arc<NotificationDispatcher>, dispatcher);
crate::impl_from_ref!(Arc<FieldSyncPropagator>, propagator);
crate::impl_from_ref!(Arc<BackfillJob>, backfill);
