//! FICHES Storage - Document Store Trait and Mock Implementation
//!
//! Defines the document-store capability the triggers are written against:
//! whole-collection reads, single-filter queries and partial field updates.
//! The PostgreSQL implementation lives in fiches-api.

pub mod document;
pub mod mock;
pub mod store;

pub use document::{Document, FieldUpdate, Filter, Query};
pub use mock::{MockStore, StoreCall};
pub use store::DocumentStore;

pub use fiches_core::Collection;
