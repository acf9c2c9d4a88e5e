//! Router tests for the sheet and event triggers.

mod support;

use axum::http::{Method, StatusCode};
use fiches_test_utils::fixtures::{email_for, event, related_sheet, seed_sheet, seed_users};
use fiches_test_utils::{Collection, MockStore, RecordingMailer};
use serde_json::json;
use support::{app, json_request, send};

#[tokio::test]
async fn test_long_circuit_creation_scenario() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_users(&store, &["u1", "u2"]).unwrap();

    let body = json!({
        "value": {
            "id": "s1",
            "finished": true,
            "circuit": "LONG",
            "course": "Anatomie",
            "chapter": "Coeur",
            "transcripter": ["u1", "u2"]
        }
    });
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/created", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["notification"]["templateId"], "transcription_creation_email");
    assert_eq!(response.body["notification"]["sent"], 2);

    assert_eq!(mailer.recipients(), vec![email_for("u1"), email_for("u2")]);
    for request in mailer.sent() {
        assert_eq!(request.template_id, "transcription_creation_email");
        assert_eq!(
            request.data,
            json!({
                "course": "Anatomie",
                "chapter": "Coeur",
                "buttonUrl": "https://fiches.diploma-sante.fr/sheets/s1"
            })
        );
    }
}

#[tokio::test]
async fn test_unfinished_creation_returns_null_notification() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    let body = json!({"value": {"id": "s1", "finished": false, "circuit": "SHORT", "sheetMaker": ["u1"]}});

    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/created", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"notification": null}));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_transcripted_update_mails_teachers() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_users(&store, &["t1", "m1"]).unwrap();

    let body = json!({
        "before": {"id": "s1", "status": "RECORDED", "teacher": ["t1"], "sheetMaker": ["m1"]},
        "after": {"id": "s1", "status": "TRANSCRIPTED", "teacher": ["t1"], "sheetMaker": ["m1"]}
    });
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(mailer.template_ids(), vec!["map_creation_email"]);
    assert_eq!(mailer.recipients(), vec![email_for("t1")]);
}

#[tokio::test]
async fn test_null_role_fields_are_accepted() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_users(&store, &["t1"]).unwrap();

    let body = json!({
        "before": {"id": "s1", "status": "RECORDED", "teacher": null, "sheetMaker": null, "transcripter": null},
        "after": {
            "id": "s1",
            "status": "TRANSCRIPTED",
            "finished": null,
            "teacher": ["t1"],
            "sheetMaker": null,
            "transcripter": null,
            "relatedFiles": [{"name": "a.pdf"}]
        }
    });
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["notification"]["sent"], 1);
    assert_eq!(mailer.recipients(), vec![email_for("t1")]);
}

#[tokio::test]
async fn test_creation_with_null_roles_sends_nothing() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    let body = json!({
        "value": {"id": "s1", "finished": true, "circuit": "LONG", "transcripter": null, "teacher": null}
    });

    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/created", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["notification"]["requested"], 0);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_store_failure_is_not_surfaced() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    store.fail_reads(Collection::Users);

    let body = json!({
        "before": {"id": "s1", "status": "MAPPED"},
        "after": {"id": "s1", "status": "SHEET_DONE", "teacher": ["t1"]}
    });
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"notification": null}));
}

#[tokio::test]
async fn test_missing_sheet_id_is_rejected() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    let body = json!({"value": {"finished": true, "circuit": "LONG"}});

    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/created", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/sheets/updated", &json!({"after": {"id": "s1"}})),
    )
    .await;

    assert!(response.status.is_client_error());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_event_update_scenario() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_sheet(&store, &related_sheet("s1", &["e1"]));
    seed_sheet(&store, &related_sheet("s2", &["e1", "e7"]));
    seed_sheet(&store, &related_sheet("s3", &["e7"]));

    let e1 = event("e1");
    let body = json!({"before": {"id": "e1"}, "after": e1});
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/events/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"updatedSheets": 2}));

    let expected = e1.sheet_sync_fields();
    for id in ["s1", "s2"] {
        let sheet = store.get(Collection::Sheets, id).unwrap();
        for (field, value) in &expected {
            assert_eq!(&sheet[field.as_str()], value, "{}.{}", id, field);
        }
    }
    let untouched = store.get(Collection::Sheets, "s3").unwrap();
    assert_eq!(untouched["course"], json!(null));
}

#[tokio::test]
async fn test_event_update_copies_raw_values() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_sheet(&store, &related_sheet("s1", &["e1"]));

    let after = json!({
        "id": "e1",
        "course": "Anatomie",
        "startDate": "2024-03-04T09:00:00+01:00",
        "endDate": {"_seconds": 1709546400, "_nanoseconds": 0},
        "relatedFiles": [{"name": "slides.pdf", "url": "https://files/slides.pdf"}],
        "teacher": null,
        "onlineCourse": "yes",
        "location": "Amphi B"
    });
    let body = json!({"before": {"id": "e1"}, "after": after});
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/events/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"updatedSheets": 1}));

    let sheet = store.get(Collection::Sheets, "s1").unwrap();
    for field in ["course", "startDate", "endDate", "relatedFiles", "teacher", "onlineCourse"] {
        assert_eq!(sheet[field], after[field], "{}", field);
    }
    assert_eq!(sheet["courseLink"], json!(null));
    assert_eq!(sheet["university"], json!(null));
    assert!(sheet.get("location").is_none());
}

#[tokio::test]
async fn test_event_update_failure_returns_null() {
    let store = MockStore::new();
    let mailer = RecordingMailer::new();
    seed_sheet(&store, &related_sheet("s1", &["e1"]));
    store.fail_updates_for(Collection::Sheets, "s1");

    let body = json!({"before": {"id": "e1"}, "after": {"id": "e1", "course": "X"}});
    let response = send(
        app(&store, &mailer),
        json_request(Method::POST, "/triggers/events/updated", &body),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"updatedSheets": null}));
}
