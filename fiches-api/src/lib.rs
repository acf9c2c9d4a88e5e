//! FICHES API - Sheet Workflow Triggers
//!
//! HTTP service reacting to changes of the sheet workflow documents:
//! - notification mails on sheet creation and status changes
//! - propagation of event fields onto related sheets
//! - a backfill job for the sheets' denormalized event dates
//!
//! Every component receives its document store and mailer at construction,
//! so tests run against `fiches_storage::MockStore` and a recording mailer.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod jobs;
pub mod macros;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, Environment};
pub use db::{DbConfig, PgDocumentStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use jobs::{BackfillJob, BackfillReport, EventDates, EventLookup};
pub use routes::create_api_router;
pub use services::{FieldSyncPropagator, NotificationDispatcher, NotificationReport};
pub use state::AppState;
