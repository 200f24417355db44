//! SNMP scan request and report types.
//!
//! These are ephemeral: a report lives for one scan call and is handed back
//! by the caller if it later wants to import hosts from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// SNMPv2-MIB::sysName.0
pub const SYS_NAME_OID: &str = "1.3.6.1.2.1.1.5.0";
/// SNMPv2-MIB::sysDescr.0
pub const SYS_DESCR_OID: &str = "1.3.6.1.2.1.1.1.0";

/// OIDs requested when a scan does not name its own.
pub fn default_oids() -> Vec<String> {
    vec![SYS_NAME_OID.to_string(), SYS_DESCR_OID.to_string()]
}

/// A request to sweep a CIDR block with SNMP v2c GETs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Target block, e.g. `192.168.1.0/24`.
    pub cidr: String,

    #[serde(default = "default_community")]
    pub community: String,

    /// Per-host reply timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Per-request host cap. Never raises the configured ceiling.
    #[serde(default)]
    pub max_hosts: Option<usize>,

    /// OIDs to GET from each host. Defaults to sysName and sysDescr.
    #[serde(default)]
    pub oids: Option<Vec<String>>,
}

impl ScanRequest {
    pub fn new(cidr: impl Into<String>) -> Self {
        Self {
            cidr: cidr.into(),
            community: default_community(),
            timeout_ms: default_timeout_ms(),
            max_hosts: None,
            oids: None,
        }
    }
}

fn default_community() -> String {
    "public".to_string()
}

fn default_timeout_ms() -> u64 {
    500
}

/// Outcome for one probed address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    pub ip: String,
    #[serde(default = "default_responded")]
    pub responded: bool,
    /// OID (dotted string) to rendered value.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

fn default_responded() -> bool {
    true
}

impl ScanResult {
    pub fn no_response(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            responded: false,
            values: BTreeMap::new(),
        }
    }

    /// The non-empty sysName value, if the host reported one.
    pub fn sys_name(&self) -> Option<&str> {
        self.values
            .get(SYS_NAME_OID)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn sys_descr(&self) -> Option<&str> {
        self.values.get(SYS_DESCR_OID).map(String::as_str)
    }
}

/// Aggregate of one complete pass over a CIDR block. Only responders appear.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanReport {
    pub count: usize,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn find(&self, ip: &str) -> Option<&ScanResult> {
        self.results.iter().find(|r| r.ip == ip)
    }
}
