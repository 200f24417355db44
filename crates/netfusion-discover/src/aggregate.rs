//! Scan result aggregation.

use std::net::IpAddr;

use netfusion_core::{ScanReport, ScanResult};

use crate::probe::ProbeOutcome;

/// Per-outcome tallies, logged when a scan completes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub probed: usize,
    pub responded: usize,
    pub timed_out: usize,
    pub transport_errors: usize,
    pub malformed: usize,
    pub agent_errors: usize,
}

/// Collects probe outcomes in completion order and builds the final report.
///
/// Only responders are kept; every other outcome just bumps a counter.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    responders: Vec<(IpAddr, ScanResult)>,
    stats: ScanStats,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ip: IpAddr, outcome: ProbeOutcome) {
        self.stats.probed += 1;
        match outcome {
            ProbeOutcome::Responded(values) => {
                tracing::debug!(%ip, oids = values.len(), "Host responded");
                self.stats.responded += 1;
                self.responders.push((
                    ip,
                    ScanResult {
                        ip: ip.to_string(),
                        responded: true,
                        values,
                    },
                ));
            }
            ProbeOutcome::Timeout => self.stats.timed_out += 1,
            ProbeOutcome::Transport(reason) => {
                tracing::debug!(%ip, %reason, "Probe transport failure");
                self.stats.transport_errors += 1;
            }
            ProbeOutcome::Malformed(reason) => {
                tracing::debug!(%ip, %reason, "Discarding malformed SNMP reply");
                self.stats.malformed += 1;
            }
            ProbeOutcome::AgentError(status) => {
                tracing::debug!(%ip, error_status = status, "Agent returned an error status");
                self.stats.agent_errors += 1;
            }
        }
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Build the report, responders ordered by address.
    pub fn finish(mut self) -> ScanReport {
        self.responders.sort_by(|a, b| a.0.cmp(&b.0));
        let results: Vec<ScanResult> = self.responders.into_iter().map(|(_, r)| r).collect();
        ScanReport {
            count: results.len(),
            results,
        }
    }
}
