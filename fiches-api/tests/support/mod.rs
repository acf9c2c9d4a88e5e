//! Shared helpers for router tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use fiches_api::{create_api_router, ApiConfig, AppState};
use fiches_test_utils::{MockStore, RecordingMailer};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SHEET_BASE_URL: &str = "https://fiches.diploma-sante.fr/sheets/";

/// Router over the given store and mailer with default configuration.
pub fn app(store: &MockStore, mailer: &RecordingMailer) -> Router {
    app_with_config(store, mailer, &ApiConfig::default())
}

pub fn app_with_config(store: &MockStore, mailer: &RecordingMailer, config: &ApiConfig) -> Router {
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(mailer.clone()),
        SHEET_BASE_URL,
    );
    create_api_router(state, config)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Send one request and parse the body as JSON (`Value::Null` when it is not JSON).
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
