//! SNMP sweep engine: probe pool plus aggregation.
//!
//! A scan expands its CIDR, then spawns one probe task per host onto a
//! `JoinSet`. A semaphore caps how many probes are in flight; finished
//! probes are reaped while the dispatcher waits for a free slot. The report
//! is built only once every probe has completed.
//!
//! Cancellation (via the caller's token) or the optional scan deadline drops
//! the `JoinSet`, which aborts every in-flight probe. Either way the caller
//! gets an error and no partial report.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use netfusion_core::{ScanReport, ScanRequest};

use crate::aggregate::ReportBuilder;
use crate::cidr;
use crate::config::DiscoverConfig;
use crate::error::{DiscoverError, Result};
use crate::probe::{self, ProbeOutcome, ProbeSpec};
use crate::snmp::Oid;

/// A validated scan, ready to run.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub hosts: Vec<IpAddr>,
    pub spec: ProbeSpec,
}

/// Concurrent SNMP v2c subnet scanner. Holds no state between scans.
#[derive(Debug, Clone)]
pub struct SnmpScanner {
    config: DiscoverConfig,
}

impl SnmpScanner {
    pub fn new(config: DiscoverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoverConfig {
        &self.config
    }

    /// Validate a request and resolve it against the configured limits.
    pub fn plan(&self, request: &ScanRequest) -> Result<ScanPlan> {
        let max_hosts = request
            .max_hosts
            .map_or(self.config.max_hosts, |n| n.min(self.config.max_hosts));
        let hosts = cidr::expand(&request.cidr, max_hosts)?;

        let requested = match &request.oids {
            Some(oids) if !oids.is_empty() => oids.as_slice(),
            _ => self.config.oids.as_slice(),
        };
        if requested.len() > self.config.max_oids {
            return Err(DiscoverError::TooManyOids {
                count: requested.len(),
                limit: self.config.max_oids,
            });
        }
        let oids = requested
            .iter()
            .map(|raw| {
                raw.parse::<Oid>()
                    .map_err(|_| DiscoverError::InvalidOid { oid: raw.clone() })
            })
            .collect::<Result<Vec<_>>>()?;

        let community = if request.community.is_empty() {
            self.config.default_community.clone()
        } else {
            request.community.clone()
        };

        Ok(ScanPlan {
            hosts,
            spec: ProbeSpec {
                port: self.config.snmp_port,
                community,
                oids,
                // Zero would make every probe time out before it is sent.
                timeout: Duration::from_millis(request.timeout_ms.max(1)),
            },
        })
    }

    /// Run a complete scan. Returns only after every probe has finished.
    ///
    /// Hosts that time out, refuse, or answer garbage are left out of the
    /// report; they are never errors. Cancelling `cancel` (or overrunning
    /// `scan_deadline_ms`) aborts all probes and returns an error instead of
    /// a partial report.
    pub async fn scan(&self, request: &ScanRequest, cancel: &CancellationToken) -> Result<ScanReport> {
        let plan = self.plan(request)?;
        let started = Instant::now();
        let host_count = plan.hosts.len();

        tracing::info!(
            cidr = %request.cidr,
            hosts = host_count,
            timeout_ms = plan.spec.timeout.as_millis() as u64,
            max_in_flight = self.config.max_in_flight,
            "Starting SNMP scan"
        );

        let pass = run_pass(plan, self.config.max_in_flight);
        let deadline = self.config.scan_deadline_ms;

        let builder = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(cidr = %request.cidr, "SNMP scan cancelled, discarding partial results");
                return Err(DiscoverError::Cancelled);
            }
            _ = expire(deadline) => {
                let limit_ms = deadline.unwrap_or_default();
                tracing::warn!(cidr = %request.cidr, limit_ms, "SNMP scan hit its deadline");
                return Err(DiscoverError::DeadlineExceeded { limit_ms });
            }
            builder = pass => builder,
        };

        let stats = builder.stats().clone();
        let report = builder.finish();

        tracing::info!(
            cidr = %request.cidr,
            hosts = host_count,
            responded = stats.responded,
            timed_out = stats.timed_out,
            transport_errors = stats.transport_errors,
            malformed = stats.malformed + stats.agent_errors,
            duration_ms = started.elapsed().as_millis() as u64,
            "SNMP scan complete"
        );

        Ok(report)
    }
}

/// Dispatch one probe per host under the in-flight cap, then drain.
async fn run_pass(plan: ScanPlan, max_in_flight: usize) -> ReportBuilder {
    let gate = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let spec = Arc::new(plan.spec);
    let mut probes = JoinSet::new();
    let mut builder = ReportBuilder::new();

    for ip in plan.hosts {
        let permit = loop {
            tokio::select! {
                permit = gate.clone().acquire_owned() => break permit,
                Some(joined) = probes.join_next(), if !probes.is_empty() => {
                    collect(&mut builder, joined);
                }
            }
        };
        // The gate is never closed, so this only guards against future misuse.
        let Ok(permit) = permit else { break };

        let spec = spec.clone();
        probes.spawn(async move {
            let outcome = probe::probe_host(ip, &spec).await;
            drop(permit);
            (ip, outcome)
        });
    }

    while let Some(joined) = probes.join_next().await {
        collect(&mut builder, joined);
    }

    builder
}

fn collect(builder: &mut ReportBuilder, joined: std::result::Result<(IpAddr, ProbeOutcome), JoinError>) {
    match joined {
        Ok((ip, outcome)) => builder.record(ip, outcome),
        Err(e) => tracing::error!(error = %e, "Probe task failed"),
    }
}

async fn expire(limit_ms: Option<u64>) {
    match limit_ms {
        Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        None => std::future::pending().await,
    }
}
