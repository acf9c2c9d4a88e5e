//! FICHES API Server Entry Point
//!
//! Bootstraps configuration, the PostgreSQL document store and the mail
//! client, then starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use fiches_api::constants::{DEFAULT_BIND_HOST, DEFAULT_PORT};
use fiches_api::server::{ctrl_c, serve_until};
use fiches_api::telemetry::{init_tracing, TelemetryConfig};
use fiches_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, DbConfig, PgDocumentStore};
use fiches_mail::HttpMailer;

#[tokio::main]
async fn main() -> ApiResult<()> {
    init_tracing(&TelemetryConfig::default())?;

    let config = ApiConfig::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        mail = ?config.mail,
        "Configuration loaded"
    );

    let db_config = DbConfig::from_env();
    let store = PgDocumentStore::from_config(&db_config)?;
    store.ensure_schema().await?;

    let mailer = HttpMailer::new(&config.mail)?;
    let state = AppState::new(Arc::new(store), Arc::new(mailer), config.sheet_base_url.clone());
    let app = create_api_router(state, &config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting FICHES API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    serve_until(listener, app, ctrl_c()).await
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("FICHES_API_BIND").unwrap_or_else(|_| DEFAULT_BIND_HOST.to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("FICHES_API_PORT").ok())
        .unwrap_or_else(|| DEFAULT_PORT.to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
