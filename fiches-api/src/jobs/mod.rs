//! Batch Jobs for the FICHES API
//!
//! - `backfill`: fills in the denormalized event dates of every sheet
//!
//! Jobs are triggered over HTTP (see `routes::backfill`) and run to
//! completion within the request.

pub mod backfill;

pub use backfill::{BackfillJob, BackfillReport, EventDates, EventLookup};
