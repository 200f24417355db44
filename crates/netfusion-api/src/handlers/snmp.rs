//! SNMP scan and import handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use netfusion_core::{ScanReport, ScanRequest};
use netfusion_discover::import::{import_selected, ImportRequest, ImportSummary};

use crate::error::ApiError;
use crate::AppState;

/// `POST /api/snmp/scan`. Blocks until every host has answered or timed out.
pub async fn scan(
    State(state): State<AppState>,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<ScanReport>, ApiError> {
    let Json(mut request) = payload?;

    let floor = state.scanner.config().min_timeout_ms;
    if request.timeout_ms < floor {
        tracing::debug!(requested = request.timeout_ms, floor, "Raising scan timeout to floor");
        request.timeout_ms = floor;
    }

    // A dropped request drops this future, which aborts the probes too.
    let cancel = state.shutdown.child_token();
    let report = state.scanner.scan(&request, &cancel).await?;
    Ok(Json(report))
}

/// `POST /api/snmp/import`. Per-host outcomes; one failure never aborts the batch.
pub async fn import(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<Json<ImportSummary>, ApiError> {
    let Json(request) = payload?;
    let vault = state.vault.clone();
    let summary = tokio::task::spawn_blocking(move || import_selected(&vault, &request)).await?;
    Ok(Json(summary))
}
