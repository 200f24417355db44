//! Endpoint vault handlers. Vault I/O is blocking and runs off the reactor.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use netfusion_core::{EndpointId, EndpointPatch, EndpointView, NewEndpoint};
use netfusion_vault::Vault;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EndpointList {
    pub endpoints: Vec<EndpointView>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

async fn with_vault<T, F>(vault: &Arc<Vault>, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Vault) -> netfusion_vault::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let vault = vault.clone();
    Ok(tokio::task::spawn_blocking(move || op(&vault)).await??)
}

/// Ids that do not parse cannot exist.
fn parse_id(raw: &str) -> Result<EndpointId, ApiError> {
    raw.parse().map_err(|_| ApiError::UnknownId(raw.to_string()))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<EndpointList>, ApiError> {
    let endpoints = with_vault(&state.vault, |vault| vault.list()).await?;
    Ok(Json(EndpointList { endpoints }))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewEndpoint>, JsonRejection>,
) -> Result<(StatusCode, Json<EndpointView>), ApiError> {
    let Json(input) = payload?;
    let view = with_vault(&state.vault, move |vault| vault.create(input)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EndpointPatch>, JsonRejection>,
) -> Result<Json<EndpointView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    let view = with_vault(&state.vault, move |vault| vault.update(id, patch)).await?;
    Ok(Json(view))
}

pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<EndpointView>, ApiError> {
    let id = parse_id(&id)?;
    let Json(ToggleRequest { enabled }) = payload?;
    let view = with_vault(&state.vault, move |vault| vault.set_enabled(id, enabled)).await?;
    Ok(Json(view))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    with_vault(&state.vault, move |vault| vault.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
