//! FICHES Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for sheets, events and users
//! - A recording mailer with failure injection
//! - Fixtures and store seeding helpers for common scenarios

// Re-export mock storage from its source crate
pub use fiches_storage::MockStore;

pub use fiches_core::{
    Collection, Event, FichesError, FichesResult, MailError, MailTemplate, Sheet, SheetCircuit,
    SheetStatus, TeacherUser,
};
pub use fiches_mail::{MailRequest, Mailer};

use ::async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ============================================================================
// RECORDING MAILER
// ============================================================================

/// Mailer that keeps every request it receives.
///
/// Requests addressed to an email registered with [`RecordingMailer::fail_for`]
/// are recorded and then refused with a `MailError::Rejected`.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<MailRequest>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every request addressed to `email`.
    pub fn fail_for(&self, email: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(email.into());
    }

    /// All requests received, in arrival order.
    pub fn sent(&self) -> Vec<MailRequest> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recipients of every request, flattened and sorted.
    pub fn recipients(&self) -> Vec<String> {
        let mut all: Vec<String> = self.sent().into_iter().flat_map(|r| r.to).collect();
        all.sort();
        all
    }

    /// Distinct template ids used so far.
    pub fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sent().into_iter().map(|r| r.template_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_mail(&self, request: &MailRequest) -> FichesResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if request.to.iter().any(|to| failing.contains(to)) {
            return Err(MailError::Rejected {
                template_id: request.template_id.clone(),
                status: 500,
                body: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating sheet workflow records.

    use super::*;
    use proptest::prelude::*;

    /// Generate a timestamp within 2020-2030.
    pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a sheet status, including values the triggers don't know.
    pub fn arb_sheet_status() -> impl Strategy<Value = SheetStatus> {
        prop_oneof![
            Just(SheetStatus::Transcripted),
            Just(SheetStatus::Mapped),
            Just(SheetStatus::SheetDone),
            "[A-Z_]{1,12}".prop_map(SheetStatus::from),
        ]
    }

    /// Generate an optional sheet status.
    pub fn arb_opt_sheet_status() -> impl Strategy<Value = Option<SheetStatus>> {
        proptest::option::of(arb_sheet_status())
    }

    /// Generate a sheet circuit, including values the triggers don't know.
    pub fn arb_sheet_circuit() -> impl Strategy<Value = SheetCircuit> {
        prop_oneof![
            Just(SheetCircuit::Long),
            Just(SheetCircuit::Short),
            "[A-Z]{1,8}".prop_map(SheetCircuit::from),
        ]
    }

    /// Generate a list of user ids drawn from `u0`..`u9`.
    pub fn arb_user_ids() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec((0u8..10).prop_map(|n| format!("u{}", n)), 0..4)
    }

    /// Generate a sheet with the given id.
    pub fn arb_sheet(id: String) -> impl Strategy<Value = Sheet> {
        (
            any::<bool>(),
            proptest::option::of(arb_sheet_circuit()),
            arb_opt_sheet_status(),
            arb_user_ids(),
            arb_user_ids(),
            arb_user_ids(),
        )
            .prop_map(
                move |(finished, circuit, status, transcripter, sheet_maker, teacher)| Sheet {
                    id: id.clone(),
                    finished,
                    circuit,
                    status,
                    course: Some("Anatomie".to_string()),
                    chapter: Some("Coeur".to_string()),
                    transcripter,
                    sheet_maker,
                    teacher,
                },
            )
    }

    /// Generate attached file entries, either names or `{name}` objects.
    pub fn arb_related_files() -> impl Strategy<Value = Value> {
        prop_oneof![
            prop::collection::vec("[a-z]{1,8}\\.pdf".prop_map(Value::from), 0..3),
            prop::collection::vec("[a-z]{1,8}\\.pdf".prop_map(|name| json!({ "name": name })), 0..3),
        ]
        .prop_map(Value::from)
    }

    /// Generate an event with the given id. Optional fields are sometimes
    /// absent, dates carry arbitrary offsets.
    pub fn arb_event(id: String) -> impl Strategy<Value = Event> {
        (
            proptest::option::of("[a-zA-Z ]{1,16}"),
            proptest::option::of("[a-zA-Z ]{1,16}"),
            proptest::option::of((arb_timestamp(), -11i32..12)),
            proptest::option::of(arb_timestamp()),
            proptest::option::of(arb_related_files()),
            arb_user_ids(),
            arb_user_ids(),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(
                move |(
                    course,
                    chapter,
                    start_date,
                    end_date,
                    related_files,
                    teacher,
                    sheet_maker,
                    online_course,
                )| {
                    let start_date = start_date.and_then(|(ts, hours)| {
                        chrono::FixedOffset::east_opt(hours * 3600)
                            .map(|offset| Value::from(ts.with_timezone(&offset).to_rfc3339()))
                    });
                    let optional = [
                        ("course", course.map(Value::from)),
                        ("chapter", chapter.map(Value::from)),
                        ("startDate", start_date),
                        ("endDate", end_date.map(|ts| json!(ts))),
                        ("relatedFiles", related_files),
                        ("onlineCourse", online_course.map(Value::from)),
                    ];
                    optional.into_iter().fold(
                        Event::new(id.clone())
                            .with("teacher", teacher)
                            .with("sheetMaker", sheet_maker),
                        |event, (field, value)| match value {
                            Some(value) => event.with(field, value),
                            None => event,
                        },
                    )
                },
            )
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records and store seeding helpers.

    use super::*;

    /// Fixed timestamp for deterministic assertions.
    pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Email used for a user id in seeded stores.
    pub fn email_for(uid: &str) -> String {
        format!("{}@diploma-sante.fr", uid)
    }

    /// A teacher-side user with a derived email.
    pub fn user(uid: &str) -> TeacherUser {
        TeacherUser {
            uid: uid.to_string(),
            email: email_for(uid),
            first_name: Some(format!("First {}", uid)),
            last_name: None,
        }
    }

    /// A finished sheet on the given circuit with no role assignments.
    pub fn finished_sheet(id: &str, circuit: SheetCircuit) -> Sheet {
        Sheet {
            id: id.to_string(),
            finished: true,
            circuit: Some(circuit),
            course: Some("Anatomie".to_string()),
            chapter: Some("Coeur".to_string()),
            ..Sheet::default()
        }
    }

    /// A sheet with the given status and teacher/sheet maker assignments.
    pub fn sheet_with_status(
        id: &str,
        status: Option<SheetStatus>,
        teacher: &[&str],
        sheet_maker: &[&str],
    ) -> Sheet {
        Sheet {
            id: id.to_string(),
            status,
            course: Some("Anatomie".to_string()),
            chapter: Some("Coeur".to_string()),
            teacher: teacher.iter().map(|s| s.to_string()).collect(),
            sheet_maker: sheet_maker.iter().map(|s| s.to_string()).collect(),
            ..Sheet::default()
        }
    }

    /// Raw sheet document related to the given events, without event dates.
    pub fn related_sheet(id: &str, event_ids: &[&str]) -> Value {
        json!({
            "id": id,
            "finished": true,
            "circuit": "LONG",
            "relatedEventsIds": event_ids,
        })
    }

    /// Raw sheet document that already carries both event dates.
    pub fn dated_sheet(id: &str, event_ids: &[&str], start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
        let mut sheet = related_sheet(id, event_ids);
        sheet["eventStartDate"] = json!(start);
        sheet["eventEndDate"] = json!(end);
        sheet
    }

    /// An event with course data and a fixed date range. `courseLink` is
    /// absent.
    pub fn event(id: &str) -> Event {
        Event::new(id)
            .with("course", "Physiologie")
            .with("chapter", "Reins")
            .with("university", "Paris Cité")
            .with("startDate", json!(at(2024, 3, 1, 9)))
            .with("endDate", json!(at(2024, 3, 1, 11)))
            .with("relatedFiles", json!(["slides.pdf"]))
            .with("recorder", json!(["u1"]))
            .with("transcripter", json!(["u2"]))
            .with("teacher", json!(["u3"]))
            .with("sheetMaker", json!(["u4"]))
            .with("onlineCourse", false)
    }

    /// Store users keyed by uid.
    pub fn seed_users(store: &MockStore, uids: &[&str]) -> FichesResult<()> {
        for uid in uids {
            store.insert_record(Collection::Users, *uid, &user(uid))?;
        }
        Ok(())
    }

    /// Store a raw sheet document under its `id` field.
    pub fn seed_sheet(store: &MockStore, sheet: &Value) {
        let id = sheet["id"].as_str().unwrap_or_default().to_string();
        store.insert(Collection::Sheets, id, sheet.clone());
    }

    pub fn seed_event(store: &MockStore, event: &Event) -> FichesResult<()> {
        store.insert_record(Collection::Events, event.id.clone(), event)
    }
}

// ============================================================================
// TESTS
// ============================================================================
