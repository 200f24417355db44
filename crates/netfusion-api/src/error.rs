//! HTTP error mapping.
//!
//! Every error renders as `{"detail": ...}`. Validation failures carry the
//! list of field issues; everything else carries a message string.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use netfusion_discover::DiscoverError;
use netfusion_vault::VaultError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Invalid request body: {0}")]
    Body(String),

    #[error("Endpoint not found: {0}")]
    UnknownId(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Discover(e) => match e {
                DiscoverError::InvalidCidr { .. }
                | DiscoverError::InvalidOid { .. }
                | DiscoverError::TooManyOids { .. } => StatusCode::BAD_REQUEST,
                DiscoverError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                DiscoverError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
                DiscoverError::Vault(v) => vault_status(v),
                DiscoverError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Vault(v) => vault_status(v),
            Self::Body(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownId(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn vault_status(e: &VaultError) -> StatusCode {
    match e {
        VaultError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        VaultError::NotFound(_) => StatusCode::NOT_FOUND,
        VaultError::Io(_) | VaultError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let issues = match &self {
            Self::Vault(e) => e.issues(),
            Self::Discover(DiscoverError::Vault(e)) => e.issues(),
            _ => &[],
        };
        let body = if issues.is_empty() {
            json!({ "detail": self.to_string() })
        } else {
            json!({ "detail": issues })
        };

        (status, Json(body)).into_response()
    }
}
