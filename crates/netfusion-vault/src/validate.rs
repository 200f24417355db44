//! Endpoint validation and patch merging.
//!
//! Both create and update funnel through [`Draft`]: create builds one from
//! the submitted fields, update builds one from the stored record and
//! overlays the patch. A draft is validated as a whole, so an update is
//! checked under exactly the same rules as a create.

use chrono::{DateTime, Utc};
use netfusion_core::{
    AuthType, Endpoint, EndpointId, EndpointKind, EndpointPatch, NewEndpoint, SnmpVersion,
};

use crate::error::FieldIssue;

/// Unvalidated endpoint fields, enumerations still in wire form.
#[derive(Clone, Default)]
pub(crate) struct Draft {
    pub name: String,
    pub kind: String,
    pub address: String,
    pub auth_type: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub snmp_version: Option<String>,
    pub snmp_community: Option<String>,
    pub site: Option<String>,
    pub notes: Option<String>,
    pub enabled: bool,
}

impl From<NewEndpoint> for Draft {
    fn from(input: NewEndpoint) -> Self {
        Self {
            name: input.name,
            kind: input.kind,
            address: input.address,
            auth_type: input.auth_type,
            username: input.username,
            password: input.password,
            api_key: input.api_key,
            snmp_version: input.snmp_version,
            snmp_community: input.snmp_community,
            site: input.site,
            notes: input.notes,
            enabled: input.enabled.unwrap_or(true),
        }
    }
}

impl From<&Endpoint> for Draft {
    fn from(ep: &Endpoint) -> Self {
        Self {
            name: ep.name.clone(),
            kind: ep.kind.as_str().to_string(),
            address: ep.address.clone(),
            auth_type: ep.auth_type.as_str().to_string(),
            username: ep.username.clone(),
            password: ep.password.clone(),
            api_key: ep.api_key.clone(),
            snmp_version: ep.snmp_version.map(|v| v.as_str().to_string()),
            snmp_community: ep.snmp_community.clone(),
            site: ep.site.clone(),
            notes: ep.notes.clone(),
            enabled: ep.enabled,
        }
    }
}

impl Draft {
    /// Overlay a partial update. Secrets are only replaced by non-empty values.
    pub fn apply(&mut self, patch: EndpointPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(auth_type) = patch.auth_type {
            self.auth_type = auth_type;
        }
        if let Some(username) = patch.username {
            self.username = Some(username);
        }
        if let Some(version) = patch.snmp_version {
            self.snmp_version = Some(version);
        }
        if let Some(site) = patch.site {
            self.site = Some(site);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        replace_secret(&mut self.password, patch.password);
        replace_secret(&mut self.api_key, patch.api_key);
        replace_secret(&mut self.snmp_community, patch.snmp_community);
    }

    /// Check every rule, collecting all issues rather than stopping at the first.
    pub fn validate(self) -> Result<Valid, Vec<FieldIssue>> {
        let mut issues = Vec::new();

        let name = self.name.trim().to_string();
        if name.is_empty() {
            issues.push(FieldIssue::new("name", "name is required"));
        }

        let address = self.address.trim().to_string();
        if address.is_empty() {
            issues.push(FieldIssue::new("address", "address is required"));
        }

        let kind = EndpointKind::from_name(self.kind.trim());
        if kind.is_none() {
            issues.push(FieldIssue::new(
                "kind",
                format!(
                    "invalid kind {:?}: expected one of unifi, auvik, generic",
                    self.kind
                ),
            ));
        }

        let auth_type = AuthType::from_name(self.auth_type.trim());
        if auth_type.is_none() {
            issues.push(FieldIssue::new(
                "auth_type",
                format!(
                    "invalid auth_type {:?}: expected one of userpass, apikey, token",
                    self.auth_type
                ),
            ));
        }

        let username = non_blank(self.username);
        let password = non_empty(self.password);
        let api_key = non_empty(self.api_key);

        match auth_type {
            Some(AuthType::UserPass) if username.is_none() => {
                issues.push(FieldIssue::new(
                    "username",
                    "username is required for userpass auth",
                ));
            }
            Some(AuthType::ApiKey) if api_key.is_none() => {
                issues.push(FieldIssue::new(
                    "api_key",
                    "api_key is required for apikey auth",
                ));
            }
            _ => {}
        }

        let snmp_version = match non_blank(self.snmp_version) {
            None => None,
            Some(raw) => {
                let parsed = SnmpVersion::from_name(&raw);
                if parsed.is_none() {
                    issues.push(FieldIssue::new(
                        "snmp_version",
                        format!("unsupported snmp_version {raw:?}: expected 1 or 2c"),
                    ));
                }
                parsed
            }
        };

        match (kind, auth_type) {
            (Some(kind), Some(auth_type)) if issues.is_empty() => Ok(Valid {
                name,
                kind,
                address,
                auth_type,
                username,
                password,
                api_key,
                snmp_version,
                snmp_community: non_empty(self.snmp_community),
                site: non_blank(self.site),
                notes: non_blank(self.notes),
                enabled: self.enabled,
            }),
            _ => Err(issues),
        }
    }
}

/// A draft that passed every rule.
pub(crate) struct Valid {
    name: String,
    kind: EndpointKind,
    address: String,
    auth_type: AuthType,
    username: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
    snmp_version: Option<SnmpVersion>,
    snmp_community: Option<String>,
    site: Option<String>,
    notes: Option<String>,
    enabled: bool,
}

impl Valid {
    pub fn into_endpoint(
        self,
        id: EndpointId,
        created_ts: DateTime<Utc>,
        updated_ts: DateTime<Utc>,
    ) -> Endpoint {
        Endpoint {
            id,
            name: self.name,
            kind: self.kind,
            address: self.address,
            auth_type: self.auth_type,
            username: self.username,
            password: self.password,
            api_key: self.api_key,
            snmp_version: self.snmp_version,
            snmp_community: self.snmp_community,
            site: self.site,
            notes: self.notes,
            enabled: self.enabled,
            created_ts,
            updated_ts,
        }
    }
}

fn replace_secret(slot: &mut Option<String>, incoming: Option<String>) {
    if let Some(value) = incoming.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
