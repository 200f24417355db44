//! Endpoint domain types.
//!
//! An endpoint is a credentialed monitoring target (UniFi controller, Auvik
//! tenant, or a generic/SNMP device). Stored records carry secrets; every
//! read path goes through [`EndpointView`], which never does.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identity ──────────────────────────────────────────────────────

/// Opaque, immutable identifier assigned when an endpoint is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EndpointId(pub Uuid);

impl EndpointId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EndpointId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ── Enumerations ──────────────────────────────────────────────────

/// The platform an endpoint belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Unifi,
    Auvik,
    Generic,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 3] = [Self::Unifi, Self::Auvik, Self::Generic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unifi => "unifi",
            Self::Auvik => "auvik",
            Self::Generic => "generic",
        }
    }

    /// Parse the wire name of a kind. Matching is exact (lowercase).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the endpoint authenticates. Selects which credential fields matter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[serde(rename = "userpass")]
    UserPass,
    #[serde(rename = "apikey")]
    ApiKey,
    Token,
}

impl AuthType {
    pub const ALL: [AuthType; 3] = [Self::UserPass, Self::ApiKey, Self::Token];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserPass => "userpass",
            Self::ApiKey => "apikey",
            Self::Token => "token",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// `username` / `password` are only meaningful for this auth type.
    pub fn uses_password(&self) -> bool {
        matches!(self, Self::UserPass)
    }

    /// `api_key` carries the credential for API-key and token auth.
    pub fn uses_api_key(&self) -> bool {
        matches!(self, Self::ApiKey | Self::Token)
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SNMP protocol versions accepted for SNMP-capable endpoints (v3 is unsupported).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SnmpVersion {
    #[serde(rename = "1")]
    V1,
    #[serde(rename = "2c")]
    V2c,
}

impl SnmpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V2c => "2c",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "1" | "v1" => Some(Self::V1),
            "2c" | "v2c" => Some(Self::V2c),
            _ => None,
        }
    }
}

// ── Stored record ─────────────────────────────────────────────────

/// A persisted endpoint, secrets included. Never serialize this to a client.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Endpoint {
    pub id: EndpointId,
    pub name: String,
    pub kind: EndpointKind,
    pub address: String,
    pub auth_type: AuthType,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub snmp_version: Option<SnmpVersion>,
    pub snmp_community: Option<String>,
    pub site: Option<String>,
    pub notes: Option<String>,
    pub enabled: bool,
    pub created_ts: DateTime<Utc>,
    pub updated_ts: DateTime<Utc>,
}

impl Endpoint {
    /// The credential actually used for this endpoint's auth type, if any.
    pub fn active_secret(&self) -> Option<&str> {
        if self.auth_type.uses_password() {
            self.password.as_deref()
        } else {
            self.api_key.as_deref()
        }
    }

    /// Redacted, client-safe view of this record.
    pub fn view(&self) -> EndpointView {
        EndpointView {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            address: self.address.clone(),
            auth_type: self.auth_type,
            username: self.username.clone(),
            snmp_version: self.snmp_version,
            site: self.site.clone(),
            notes: self.notes.clone(),
            enabled: self.enabled,
            has_password: is_set(&self.password),
            has_api_key: is_set(&self.api_key),
            has_snmp_community: is_set(&self.snmp_community),
            created_ts: self.created_ts,
            updated_ts: self.updated_ts,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("address", &self.address)
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("api_key", &redacted(&self.api_key))
            .field("snmp_version", &self.snmp_version)
            .field("snmp_community", &redacted(&self.snmp_community))
            .field("site", &self.site)
            .field("notes", &self.notes)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn is_set(secret: &Option<String>) -> bool {
    secret.as_deref().is_some_and(|s| !s.is_empty())
}

fn redacted(secret: &Option<String>) -> Option<&'static str> {
    is_set(secret).then_some("***")
}

/// Client-facing endpoint representation. Secrets are reduced to `has_*` flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointView {
    pub id: EndpointId,
    pub name: String,
    pub kind: EndpointKind,
    pub address: String,
    pub auth_type: AuthType,
    pub username: Option<String>,
    pub snmp_version: Option<SnmpVersion>,
    pub site: Option<String>,
    pub notes: Option<String>,
    pub enabled: bool,
    pub has_password: bool,
    pub has_api_key: bool,
    pub has_snmp_community: bool,
    pub created_ts: DateTime<Utc>,
    pub updated_ts: DateTime<Utc>,
}

// ── Inputs ────────────────────────────────────────────────────────

/// Fields submitted to create an endpoint.
///
/// Enumerations arrive as raw strings so that an unknown `kind` or
/// `auth_type` is reported as a field-level validation issue rather than a
/// deserialization failure.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewEndpoint {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub auth_type: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub snmp_version: Option<String>,
    #[serde(default)]
    pub snmp_community: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl fmt::Debug for NewEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEndpoint")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("address", &self.address)
            .field("auth_type", &self.auth_type)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A partial update. `None` leaves a field untouched.
///
/// For `password`, `api_key` and `snmp_community` an empty string is treated
/// the same as `None`: a stored secret is never blanked by a patch.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EndpointPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub snmp_version: Option<String>,
    #[serde(default)]
    pub snmp_community: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl fmt::Debug for EndpointPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointPatch")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("address", &self.address)
            .field("auth_type", &self.auth_type)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Endpoint {
        let now = Utc::now();
        Endpoint {
            id: EndpointId::new(),
            name: "core-sw".to_string(),
            kind: EndpointKind::Unifi,
            address: "https://10.0.0.2".to_string(),
            auth_type: AuthType::UserPass,
            username: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
            api_key: None,
            snmp_version: Some(SnmpVersion::V2c),
            snmp_community: Some("private".to_string()),
            site: None,
            notes: None,
            enabled: true,
            created_ts: now,
            updated_ts: now,
        }
    }

    #[test]
    fn view_never_carries_secrets() {
        let view = sample().view();
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(!json.contains("private"));
        assert!(view.has_password);
        assert!(!view.has_api_key);
        assert!(view.has_snmp_community);
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(AuthType::from_name("userpass"), Some(AuthType::UserPass));
        assert_eq!(AuthType::from_name("UserPass"), None);
        assert_eq!(EndpointKind::from_name("auvik"), Some(EndpointKind::Auvik));
        assert_eq!(SnmpVersion::from_name("v2c"), Some(SnmpVersion::V2c));
        assert_eq!(SnmpVersion::from_name("3"), None);
        assert_eq!(
            serde_json::to_string(&AuthType::ApiKey).unwrap(),
            "\"apikey\""
        );
        assert_eq!(serde_json::to_string(&SnmpVersion::V2c).unwrap(), "\"2c\"");
    }

    #[test]
    fn active_secret_follows_auth_type() {
        let mut ep = sample();
        assert_eq!(ep.active_secret(), Some("hunter2"));
        ep.auth_type = AuthType::Token;
        ep.api_key = Some("tok".to_string());
        assert_eq!(ep.active_secret(), Some("tok"));
    }

    #[test]
    fn endpoint_id_parses_its_display_form() {
        let id = EndpointId::new();
        assert_eq!(id.to_string().parse::<EndpointId>().unwrap(), id);
        assert!("not-an-id".parse::<EndpointId>().is_err());
    }
}
