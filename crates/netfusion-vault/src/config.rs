//! Configuration for the endpoint vault.

use serde::Deserialize;

/// Loaded from `netfusion.toml` `[vault]` section or
/// `NETFUSION_VAULT__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Directory holding one JSON file per endpoint.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data/endpoints".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
