//! Event Date Backfill
//!
//! Fills `eventStartDate` / `eventEndDate` on every sheet that lacks one of
//! them, from the sheet's first related event. The job runs in three
//! strictly ordered stages, each a full join before the next starts:
//!
//! 1. read every sheet
//! 2. look up the first related event of each sheet missing a date
//! 3. write both dates onto the sheets whose event was found
//!
//! Documents are read as raw JSON and only the fields above are looked at,
//! so an irregular unrelated field never stops the run. Any failure aborts
//! the job; writes already applied are kept.

use std::sync::Arc;

use fiches_core::{Collection, FichesError, FichesResult, ValidationError};
use fiches_storage::{Document, DocumentStore, FieldUpdate, Query};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    EVENT_END_DATE_FIELD, EVENT_END_FIELD, EVENT_ID_FIELD, EVENT_START_DATE_FIELD,
    EVENT_START_FIELD, RELATED_EVENTS_FIELD,
};
use crate::telemetry::metrics::with_metrics;

/// Dates of a related event, exactly as stored on the event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDates {
    pub start: Value,
    pub end: Value,
}

impl EventDates {
    fn from_event(event: &Document) -> Self {
        let raw = |field| event.field(field).cloned().unwrap_or(Value::Null);
        Self {
            start: raw(EVENT_START_FIELD),
            end: raw(EVENT_END_FIELD),
        }
    }
}

/// Result of the event lookup for one sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum EventLookup {
    /// The sheet already has both dates; nothing was queried.
    Skipped,
    Found(EventDates),
    /// No event carries the sheet's first related event id.
    Missing,
}

/// Counters of one backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    pub scanned: usize,
    pub looked_up: usize,
    pub updated: usize,
    pub missing_event: usize,
}

/// Whether a date field holds a value. Absent, `null`, empty strings,
/// `false` and `0` count as missing.
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn has_event_dates(sheet: &Document) -> bool {
    is_filled(sheet.field(EVENT_START_DATE_FIELD)) && is_filled(sheet.field(EVENT_END_DATE_FIELD))
}

/// First entry of `relatedEventsIds`, taken as is.
fn first_related_event_id(sheet: &Document) -> Option<&Value> {
    sheet
        .field(RELATED_EVENTS_FIELD)
        .and_then(|ids| ids.get(0))
        .filter(|id| !id.is_null())
}

/// The event date backfill.
pub struct BackfillJob {
    store: Arc<dyn DocumentStore>,
}

impl BackfillJob {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Run the backfill over the whole `sheets` collection.
    pub async fn add_event_start_and_end_dates(&self) -> FichesResult<BackfillReport> {
        let sheets = self.store.get_all(Collection::Sheets).await?;

        let lookups = try_join_all(sheets.into_iter().map(|sheet| async move {
            let lookup = self.lookup_event(&sheet).await?;
            Ok::<_, FichesError>((sheet, lookup))
        }))
        .await?;

        let mut report = BackfillReport {
            scanned: lookups.len(),
            ..BackfillReport::default()
        };
        for (_, lookup) in &lookups {
            match lookup {
                EventLookup::Skipped => {}
                EventLookup::Found(_) => report.looked_up += 1,
                EventLookup::Missing => {
                    report.looked_up += 1;
                    report.missing_event += 1;
                }
            }
        }

        let writes = lookups.iter().filter_map(|(sheet, lookup)| match lookup {
            EventLookup::Found(dates) => Some(self.write_dates(&sheet.id, dates)),
            _ => None,
        });
        report.updated = try_join_all(writes).await?.len();

        with_metrics(|metrics| metrics.record_backfill(report.updated, report.missing_event));
        tracing::info!(
            scanned = report.scanned,
            looked_up = report.looked_up,
            updated = report.updated,
            missing_event = report.missing_event,
            "Event date backfill complete"
        );
        Ok(report)
    }

    async fn lookup_event(&self, sheet: &Document) -> FichesResult<EventLookup> {
        if has_event_dates(sheet) {
            return Ok(EventLookup::Skipped);
        }

        let event_id = first_related_event_id(sheet).ok_or_else(|| {
            ValidationError::MissingRelatedEvent {
                sheet_id: sheet.id.clone(),
            }
        })?;

        let found = self
            .store
            .query(
                Collection::Events,
                &Query::equals(EVENT_ID_FIELD, event_id.clone()).limit(1),
            )
            .await?;

        match found.first() {
            Some(event) => Ok(EventLookup::Found(EventDates::from_event(event))),
            None => {
                tracing::debug!(sheet_id = %sheet.id, %event_id, "Related event not found");
                Ok(EventLookup::Missing)
            }
        }
    }

    async fn write_dates(&self, sheet_id: &str, dates: &EventDates) -> FichesResult<()> {
        let update = FieldUpdate::new()
            .set(EVENT_START_DATE_FIELD, dates.start.clone())
            .set(EVENT_END_DATE_FIELD, dates.end.clone());
        self.store
            .update(Collection::Sheets, sheet_id, &update)
            .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use fiches_storage::MockStore;
    use fiches_test_utils::fixtures::{at, dated_sheet, event, related_sheet, seed_event, seed_sheet};
    use serde_json::json;

    fn job(store: &MockStore) -> BackfillJob {
        BackfillJob::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_fills_missing_dates_from_first_event() {
        let store = MockStore::new();
        seed_event(&store, &event("e1")).unwrap();
        seed_event(&store, &event("e2").with("startDate", json!(at(2025, 1, 1, 8)))).unwrap();
        seed_sheet(&store, &related_sheet("s1", &["e1", "e2"]));

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(
            report,
            BackfillReport { scanned: 1, looked_up: 1, updated: 1, missing_event: 0 }
        );

        let s1 = store.get(Collection::Sheets, "s1").unwrap();
        assert_eq!(s1["eventStartDate"], json!(at(2024, 3, 1, 9)));
        assert_eq!(s1["eventEndDate"], json!(at(2024, 3, 1, 11)));
    }

    #[tokio::test]
    async fn test_event_dates_are_copied_verbatim() {
        let store = MockStore::new();
        let stored_start = json!({"_seconds": 1709280000, "_nanoseconds": 0});
        seed_event(
            &store,
            &event("e1")
                .with("startDate", stored_start.clone())
                .with("endDate", "2024-03-01T11:00:00+01:00"),
        )
        .unwrap();
        seed_sheet(&store, &related_sheet("s1", &["e1"]));

        job(&store).add_event_start_and_end_dates().await.unwrap();
        let s1 = store.get(Collection::Sheets, "s1").unwrap();
        assert_eq!(s1["eventStartDate"], stored_start);
        assert_eq!(s1["eventEndDate"], json!("2024-03-01T11:00:00+01:00"));
    }

    #[tokio::test]
    async fn test_sheet_with_both_dates_is_untouched() {
        let store = MockStore::new();
        seed_event(&store, &event("e1")).unwrap();
        seed_sheet(&store, &dated_sheet("s1", &["e1"], at(2020, 1, 1, 0), at(2020, 1, 1, 1)));
        let before = store.get(Collection::Sheets, "s1");

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(report.looked_up, 0);
        assert_eq!(report.updated, 0);
        assert!(store.queries(Collection::Events).is_empty());
        assert_eq!(store.get(Collection::Sheets, "s1"), before);
    }

    #[tokio::test]
    async fn test_one_missing_date_triggers_lookup() {
        let store = MockStore::new();
        seed_event(&store, &event("e1")).unwrap();
        let mut sheet = related_sheet("s1", &["e1"]);
        sheet["eventStartDate"] = json!(at(2020, 1, 1, 0));
        sheet["eventEndDate"] = json!("");
        seed_sheet(&store, &sheet);

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(report.updated, 1);
        let queries = store.queries(Collection::Events);
        assert_eq!(queries, vec![Query::equals("id", "e1").limit(1)]);
    }

    #[tokio::test]
    async fn test_irregular_unrelated_fields_do_not_stop_the_run() {
        let store = MockStore::new();
        seed_event(&store, &event("e1").with("relatedFiles", json!([{"name": "a.pdf"}]))).unwrap();
        seed_sheet(
            &store,
            &json!({"id": "s1", "relatedEventsIds": ["e1"], "teacher": null, "finished": null}),
        );
        let mut done = dated_sheet("s2", &["e1"], at(2020, 1, 1, 0), at(2020, 1, 1, 1));
        done["relatedFiles"] = json!([{"name": "a.pdf"}]);
        done["circuit"] = json!(3);
        seed_sheet(&store, &done);
        seed_sheet(&store, &related_sheet("s3", &["e1"]));

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(
            report,
            BackfillReport { scanned: 3, looked_up: 2, updated: 2, missing_event: 0 }
        );
        for id in ["s1", "s3"] {
            let sheet = store.get(Collection::Sheets, id).unwrap();
            assert_eq!(sheet["eventStartDate"], json!(at(2024, 3, 1, 9)), "{}", id);
        }
        let s2 = store.get(Collection::Sheets, "s2").unwrap();
        assert_eq!(s2["eventStartDate"], json!(at(2020, 1, 1, 0)));
    }

    #[tokio::test]
    async fn test_event_without_dates_writes_nulls() {
        let store = MockStore::new();
        seed_event(&store, &fiches_core::Event::new("e1").with("course", "Anatomie")).unwrap();
        seed_sheet(&store, &related_sheet("s1", &["e1"]));

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(report.updated, 1);
        let s1 = store.get(Collection::Sheets, "s1").unwrap();
        assert_eq!(s1["eventStartDate"], Value::Null);
        assert_eq!(s1["eventEndDate"], Value::Null);
    }

    #[tokio::test]
    async fn test_absent_event_leaves_sheet_unmodified() {
        let store = MockStore::new();
        seed_sheet(&store, &related_sheet("s1", &["gone"]));
        let before = store.get(Collection::Sheets, "s1");

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(report.missing_event, 1);
        assert_eq!(report.updated, 0);
        assert!(store.updates(Collection::Sheets).is_empty());
        assert_eq!(store.get(Collection::Sheets, "s1"), before);
    }

    #[tokio::test]
    async fn test_sheet_without_related_event_fails_the_job() {
        for sheet in [
            related_sheet("s2", &[]),
            json!({"id": "s2"}),
            json!({"id": "s2", "relatedEventsIds": null}),
            json!({"id": "s2", "relatedEventsIds": [null]}),
        ] {
            let store = MockStore::new();
            seed_event(&store, &event("e1")).unwrap();
            seed_sheet(&store, &related_sheet("s1", &["e1"]));
            seed_sheet(&store, &sheet);

            let err = job(&store).add_event_start_and_end_dates().await.unwrap_err();
            assert_eq!(
                err,
                FichesError::Validation(ValidationError::MissingRelatedEvent {
                    sheet_id: "s2".to_string()
                }),
                "{}",
                sheet
            );
            assert!(store.updates(Collection::Sheets).is_empty());
        }
    }

    #[tokio::test]
    async fn test_store_failures_propagate() {
        let store = MockStore::new();
        store.fail_reads(Collection::Sheets);
        assert!(job(&store).add_event_start_and_end_dates().await.is_err());

        let store = MockStore::new();
        seed_event(&store, &event("e1")).unwrap();
        seed_sheet(&store, &related_sheet("s1", &["e1"]));
        store.fail_updates_for(Collection::Sheets, "s1");
        assert!(job(&store).add_event_start_and_end_dates().await.is_err());
    }

    #[tokio::test]
    async fn test_mixed_collection() {
        let store = MockStore::new();
        seed_event(&store, &event("e1")).unwrap();
        seed_sheet(&store, &related_sheet("a", &["e1"]));
        seed_sheet(&store, &related_sheet("b", &["missing"]));
        seed_sheet(&store, &dated_sheet("c", &[], at(2020, 1, 1, 0), at(2020, 1, 1, 1)));

        let report = job(&store).add_event_start_and_end_dates().await.unwrap();
        assert_eq!(
            report,
            BackfillReport { scanned: 3, looked_up: 2, updated: 1, missing_event: 1 }
        );
        let updated: Vec<String> = store
            .updates(Collection::Sheets)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(updated, vec!["a".to_string()]);
    }

    #[test]
    fn test_is_filled() {
        assert!(!is_filled(None));
        assert!(!is_filled(Some(&Value::Null)));
        assert!(!is_filled(Some(&json!(""))));
        assert!(!is_filled(Some(&json!(0))));
        assert!(is_filled(Some(&json!("2024-03-01T09:00:00Z"))));
        assert!(is_filled(Some(&json!({"_seconds": 1}))));
    }
}
