//! Error types for the netfusion-discover crate.
//!
//! Per-host probe failures never appear here: timeouts, transport errors
//! and unparseable replies are folded into "no response" by the scanner.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Invalid CIDR {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("Invalid OID {oid:?}")]
    InvalidOid { oid: String },

    #[error("Too many OIDs requested: {count} (limit {limit})")]
    TooManyOids { count: usize, limit: usize },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan exceeded its {limit_ms}ms deadline")]
    DeadlineExceeded { limit_ms: u64 },

    #[error("Vault error: {0}")]
    Vault(#[from] netfusion_vault::VaultError),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for DiscoverError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
