//! netfusion-vault: Durable store of credentialed monitoring endpoints.
//!
//! The vault owns validation and secret handling. Secrets (`password`,
//! `api_key`, `snmp_community`) are accepted on create and update but every
//! read operation returns an [`EndpointView`] that only says whether each
//! secret is set. Writes against one record are serialized; writes against
//! different records proceed independently.

pub mod config;
pub mod error;
pub mod store;
mod validate;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use netfusion_core::{Endpoint, EndpointId, EndpointPatch, EndpointView, NewEndpoint};

pub use config::VaultConfig;
pub use error::{FieldIssue, Result, VaultError};
pub use store::{EndpointStore, FileEndpointStore, MemoryEndpointStore};

use validate::Draft;

/// The endpoint vault.
pub struct Vault {
    store: Box<dyn EndpointStore>,
    record_locks: Mutex<HashMap<EndpointId, Arc<Mutex<()>>>>,
}

impl Vault {
    pub fn new(store: impl EndpointStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            record_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open a file-backed vault at the configured directory.
    pub fn open(config: &VaultConfig) -> Result<Self> {
        Ok(Self::new(FileEndpointStore::new(&config.data_dir)?))
    }

    /// Direct access to the backing store, secrets included.
    pub fn store(&self) -> &dyn EndpointStore {
        self.store.as_ref()
    }

    /// Validate and persist a new endpoint under a fresh id.
    pub fn create(&self, input: NewEndpoint) -> Result<EndpointView> {
        let valid = Draft::from(input)
            .validate()
            .map_err(VaultError::Validation)?;

        let id = EndpointId::new();
        let now = Utc::now();
        let endpoint = valid.into_endpoint(id, now, now);

        let lock = self.record_lock(id);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        self.store.save(&endpoint)?;

        tracing::info!(
            endpoint_id = %id,
            name = %endpoint.name,
            kind = %endpoint.kind,
            auth_type = %endpoint.auth_type,
            "Endpoint created"
        );

        Ok(endpoint.view())
    }

    /// All endpoints, newest first, secrets redacted.
    pub fn list(&self) -> Result<Vec<EndpointView>> {
        let mut records = self.store.list()?;
        records.sort_by(|a, b| b.created_ts.cmp(&a.created_ts));
        Ok(records.iter().map(Endpoint::view).collect())
    }

    pub fn get(&self, id: EndpointId) -> Result<EndpointView> {
        self.load(id).map(|ep| ep.view())
    }

    /// The full stored record, secrets included, for internal consumers
    /// that authenticate against the endpoint. Never hand this to a client.
    pub fn load(&self, id: EndpointId) -> Result<Endpoint> {
        self.store.get(id)?.ok_or(VaultError::NotFound(id))
    }

    /// Apply a partial update and re-validate the merged record.
    ///
    /// Nothing is written unless the merged record is valid. Omitted or
    /// empty secrets keep their stored values.
    pub fn update(&self, id: EndpointId, patch: EndpointPatch) -> Result<EndpointView> {
        self.with_record_lock(id, || self.apply_patch(id, patch))
    }

    fn apply_patch(&self, id: EndpointId, patch: EndpointPatch) -> Result<EndpointView> {
        let current = self.load(id)?;
        let mut draft = Draft::from(&current);
        draft.apply(patch);
        let valid = draft.validate().map_err(VaultError::Validation)?;

        let updated = valid.into_endpoint(id, current.created_ts, Utc::now());
        self.store.save(&updated)?;

        tracing::info!(endpoint_id = %id, name = %updated.name, "Endpoint updated");

        Ok(updated.view())
    }

    /// Toggle the `enabled` flag without touching anything else.
    pub fn set_enabled(&self, id: EndpointId, enabled: bool) -> Result<EndpointView> {
        self.with_record_lock(id, || {
            let mut endpoint = self.load(id)?;
            endpoint.enabled = enabled;
            endpoint.updated_ts = Utc::now();
            self.store.save(&endpoint)?;

            tracing::info!(endpoint_id = %id, enabled, "Endpoint toggled");

            Ok(endpoint.view())
        })
    }

    /// Remove a record. Deleting an unknown (or already deleted) id is `NotFound`.
    pub fn delete(&self, id: EndpointId) -> Result<()> {
        let lock = self.record_lock(id);
        let removed = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            self.store.remove(id)?
        };

        self.record_locks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);

        if !removed {
            return Err(VaultError::NotFound(id));
        }

        tracing::info!(endpoint_id = %id, "Endpoint deleted");
        Ok(())
    }

    fn record_lock(&self, id: EndpointId) -> Arc<Mutex<()>> {
        let mut locks = self.record_locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Run `op` holding the record's write lock. If the record does not
    /// exist, the lock entry is dropped again unless another caller holds it.
    fn with_record_lock<T>(&self, id: EndpointId, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.record_lock(id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            op()
        };

        if matches!(result, Err(VaultError::NotFound(_))) {
            let mut locks = self.record_locks.lock().unwrap_or_else(|e| e.into_inner());
            // One reference in the map, one here.
            let idle = locks
                .get(&id)
                .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
            if idle {
                locks.remove(&id);
            }
        }

        result
    }
}
