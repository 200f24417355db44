//! Import selected scan responders into the endpoint vault.
//!
//! Each selected IP becomes a `generic` endpoint with token auth, named after
//! the device's sysName when it reported one. Imports are independent: one
//! failure is recorded and the rest still go through.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use netfusion_core::{EndpointView, NewEndpoint, ScanReport, ScanResult};
use netfusion_vault::{FieldIssue, Vault};

pub const IMPORT_NOTE: &str = "Imported from SNMP scan";

fn default_community() -> String {
    "public".to_string()
}

/// A scan report plus the IPs the operator picked from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(default)]
    pub report: ScanReport,
    #[serde(default)]
    pub selected: Vec<String>,
    #[serde(default = "default_community")]
    pub community: String,
    /// `1` or `2c`; defaults to `2c`.
    #[serde(default)]
    pub snmp_version: Option<String>,
}

impl ImportRequest {
    pub fn new(report: ScanReport, selected: Vec<String>) -> Self {
        Self {
            report,
            selected,
            community: default_community(),
            snmp_version: None,
        }
    }
}

/// Result of importing one IP.
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub ip: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
}

impl ImportOutcome {
    fn imported(ip: &str, endpoint: EndpointView) -> Self {
        Self {
            ip: ip.to_string(),
            ok: true,
            endpoint: Some(endpoint),
            error: None,
            issues: Vec::new(),
        }
    }

    fn failed(ip: &str, error: String, issues: Vec<FieldIssue>) -> Self {
        Self {
            ip: ip.to_string(),
            ok: false,
            endpoint: None,
            error: Some(error),
            issues,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub results: Vec<ImportOutcome>,
}

impl ImportSummary {
    /// Some imports succeeded and some did not.
    pub fn is_partial_failure(&self) -> bool {
        self.imported > 0 && self.failed > 0
    }
}

/// Build the vault payload for one scan responder.
pub fn endpoint_from_result(result: &ScanResult, community: &str, snmp_version: &str) -> NewEndpoint {
    let name = result.sys_name().unwrap_or(&result.ip).to_string();
    NewEndpoint {
        name,
        kind: "generic".to_string(),
        address: result.ip.clone(),
        auth_type: "token".to_string(),
        api_key: Some(String::new()),
        snmp_version: Some(snmp_version.to_string()),
        snmp_community: Some(community.to_string()),
        notes: Some(IMPORT_NOTE.to_string()),
        enabled: Some(true),
        ..NewEndpoint::default()
    }
}

/// Import every selected IP, in selection order. Duplicate selections are
/// imported once. Blocking: runs vault writes on the calling thread.
pub fn import_selected(vault: &Vault, request: &ImportRequest) -> ImportSummary {
    let version = request.snmp_version.as_deref().unwrap_or("2c");
    let mut seen = HashSet::new();
    let mut summary = ImportSummary::default();

    for ip in &request.selected {
        if !seen.insert(ip.as_str()) {
            continue;
        }

        let outcome = match request.report.find(ip) {
            None => ImportOutcome::failed(ip, "IP not present in scan report".to_string(), Vec::new()),
            Some(result) => {
                let payload = endpoint_from_result(result, &request.community, version);
                match vault.create(payload) {
                    Ok(view) => ImportOutcome::imported(ip, view),
                    Err(e) => {
                        tracing::warn!(%ip, error = %e, "SNMP import failed");
                        ImportOutcome::failed(ip, e.to_string(), e.issues().to_vec())
                    }
                }
            }
        };

        if outcome.ok {
            summary.imported += 1;
        } else {
            summary.failed += 1;
        }
        summary.results.push(outcome);
    }

    tracing::info!(
        selected = request.selected.len(),
        imported = summary.imported,
        failed = summary.failed,
        "SNMP import complete"
    );

    summary
}
