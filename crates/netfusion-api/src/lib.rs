//! netfusion-api: HTTP surface for SNMP discovery and the endpoint vault.

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use netfusion_discover::SnmpScanner;
use netfusion_vault::Vault;

pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
    pub scanner: Arc<SnmpScanner>,
    /// Cancelled on server shutdown; in-flight scans derive child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(vault: Vault, scanner: SnmpScanner) -> Self {
        Self {
            vault: Arc::new(vault),
            scanner: Arc::new(scanner),
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/snmp/scan", post(handlers::snmp::scan))
        .route("/api/snmp/import", post(handlers::snmp::import))
        .route(
            "/api/endpoints",
            get(handlers::endpoints::list).post(handlers::endpoints::create),
        )
        .route(
            "/api/endpoints/{id}",
            patch(handlers::endpoints::update).delete(handlers::endpoints::delete),
        )
        .route("/api/endpoints/{id}/toggle", patch(handlers::endpoints::toggle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
