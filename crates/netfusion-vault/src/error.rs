//! Error types for the netfusion-vault crate.

use netfusion_core::EndpointId;
use serde::Serialize;
use thiserror::Error;

/// One rejected field and why.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<FieldIssue>),

    #[error("Endpoint not found: {0}")]
    NotFound(EndpointId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    /// Field-level issues, empty for non-validation errors.
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Validation(issues) => issues,
            _ => &[],
        }
    }
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, VaultError>;
