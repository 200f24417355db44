//! Configuration for the netfusion-discover SNMP scanner.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use netfusion_core::scan::default_oids;

use crate::error::Result;

/// Top-level discover configuration.
///
/// Loaded from `netfusion.toml` `[discover]` section or
/// `NETFUSION_DISCOVER__` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// Ceiling on hosts probed per scan; larger blocks are truncated.
    #[serde(default = "default_max_hosts")]
    pub max_hosts: usize,

    /// Maximum probes in flight at once.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Per-host timeout when a request does not specify one.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Floor applied to caller-supplied timeouts at the API boundary.
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,

    /// Destination UDP port for SNMP GETs.
    #[serde(default = "default_snmp_port")]
    pub snmp_port: u16,

    #[serde(default = "default_community")]
    pub default_community: String,

    /// Hard ceiling on a whole scan. A scan that overruns yields no report.
    #[serde(default)]
    pub scan_deadline_ms: Option<u64>,

    /// OIDs requested when a scan does not list its own.
    #[serde(default = "default_oids")]
    pub oids: Vec<String>,

    /// Upper bound on OIDs a single request may ask for.
    #[serde(default = "default_max_oids")]
    pub max_oids: usize,
}

fn default_max_hosts() -> usize {
    256
}

fn default_max_in_flight() -> usize {
    256
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_min_timeout_ms() -> u64 {
    200
}

fn default_snmp_port() -> u16 {
    161
}

fn default_community() -> String {
    "public".to_string()
}

fn default_max_oids() -> usize {
    16
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            max_hosts: default_max_hosts(),
            max_in_flight: default_max_in_flight(),
            default_timeout_ms: default_timeout_ms(),
            min_timeout_ms: default_min_timeout_ms(),
            snmp_port: default_snmp_port(),
            default_community: default_community(),
            scan_deadline_ms: None,
            oids: default_oids(),
            max_oids: default_max_oids(),
        }
    }
}

impl DiscoverConfig {
    pub fn load(file_prefix: &str) -> Result<Self> {
        load_section(file_prefix, "discover")
    }
}

/// Load one section of `{file_prefix}.toml`, overlaid by `NETFUSION_{SECTION}__{KEY}`
/// environment variables. A missing section yields the type's defaults.
pub fn load_section<T: DeserializeOwned + Default>(file_prefix: &str, section: &str) -> Result<T> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NETFUSION")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<T>(section) {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}
