//! Configuration for the netfusion-api HTTP server.

use serde::Deserialize;

/// Loaded from the `[api]` section or `NETFUSION_API__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Socket address the server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind() {
        assert_eq!(ApiConfig::default().bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: ApiConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
    }
}
