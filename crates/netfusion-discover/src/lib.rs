//! netfusion-discover: SNMP v2c subnet scanner for NetFusion.
//!
//! Expands a CIDR block, probes every host with a bounded pool of
//! concurrent SNMP GETs, and aggregates the responders into a report.
//! Selected responders can then be imported into the endpoint vault.

pub mod aggregate;
pub mod cidr;
pub mod config;
pub mod error;
pub mod import;
pub mod probe;
pub mod scanner;
pub mod snmp;

pub use config::DiscoverConfig;
pub use error::{DiscoverError, Result};
pub use import::{import_selected, ImportOutcome, ImportRequest, ImportSummary};
pub use scanner::SnmpScanner;
