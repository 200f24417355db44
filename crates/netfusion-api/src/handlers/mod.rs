//! Route handlers.

pub mod endpoints;
pub mod snmp;

use axum::Json;
use serde_json::{json, Value};

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "netfusion-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
