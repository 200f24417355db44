//! netfusion-core: Shared types for the NetFusion platform.
//!
//! This crate provides the foundational types used across all NetFusion components:
//! - Endpoint records (monitoring targets and their credentials)
//! - Create / patch inputs as submitted by operators
//! - SNMP scan requests, per-host results, and aggregate reports

pub mod endpoint;
pub mod scan;

pub use endpoint::{
    AuthType, Endpoint, EndpointId, EndpointKind, EndpointPatch, EndpointView, NewEndpoint,
    SnmpVersion,
};
pub use scan::{ScanReport, ScanRequest, ScanResult, SYS_DESCR_OID, SYS_NAME_OID};
