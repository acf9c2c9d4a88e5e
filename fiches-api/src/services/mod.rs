//! Services Module
//!
//! Trigger logic that reacts to document changes. Each service receives its
//! document store (and mailer) at construction and swallows its own
//! failures after logging them.

pub mod field_sync;
pub mod notification_dispatcher;

pub use field_sync::FieldSyncPropagator;
pub use notification_dispatcher::{
    creation_notice, update_notice, Notice, NotificationDispatcher, NotificationReport,
    TransitionRule, UPDATE_RULES,
};
