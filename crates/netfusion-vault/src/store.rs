//! Endpoint storage: trait plus file-backed and in-memory implementations.
//!
//! The file-backed store keeps one JSON document per endpoint under a
//! configurable directory:
//! ```text
//! {root}/
//!   {endpoint_id}.json
//! ```
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a half-written record.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use netfusion_core::{Endpoint, EndpointId};

use crate::error::Result;

/// Trait for endpoint persistence backends.
///
/// Implementations need not coordinate writers themselves; the vault
/// serializes writes per record before calling in.
pub trait EndpointStore: Send + Sync {
    /// Insert or replace the record with this endpoint's id.
    fn save(&self, endpoint: &Endpoint) -> Result<()>;

    /// Fetch a record by id.
    fn get(&self, id: EndpointId) -> Result<Option<Endpoint>>;

    /// Remove a record. Returns `false` if it did not exist.
    fn remove(&self, id: EndpointId) -> Result<bool>;

    /// All stored records, in no particular order.
    fn list(&self) -> Result<Vec<Endpoint>>;
}

/// File-system backed endpoint store.
pub struct FileEndpointStore {
    root: PathBuf,
}

impl FileEndpointStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn record_path(&self, id: EndpointId) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

impl EndpointStore for FileEndpointStore {
    fn save(&self, endpoint: &Endpoint) -> Result<()> {
        let path = self.record_path(endpoint.id);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(endpoint)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(
            endpoint_id = %endpoint.id,
            path = %path.display(),
            "Endpoint record written"
        );

        Ok(())
    }

    fn get(&self, id: EndpointId) -> Result<Option<Endpoint>> {
        let path = self.record_path(id);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(&self, id: EndpointId) -> Result<bool> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<Endpoint>> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.root)?.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                // Deleted after the directory scan.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable endpoint record"
                    );
                    continue;
                }
            };
            match serde_json::from_slice::<Endpoint>(&bytes) {
                Ok(endpoint) => records.push(endpoint),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable endpoint record"
                    );
                }
            }
        }

        Ok(records)
    }
}

/// Volatile store, used in tests and for ephemeral deployments.
#[derive(Default)]
pub struct MemoryEndpointStore {
    records: RwLock<HashMap<EndpointId, Endpoint>>,
}

impl MemoryEndpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointStore for MemoryEndpointStore {
    fn save(&self, endpoint: &Endpoint) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.insert(endpoint.id, endpoint.clone());
        Ok(())
    }

    fn get(&self, id: EndpointId) -> Result<Option<Endpoint>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(&id).cloned())
    }

    fn remove(&self, id: EndpointId) -> Result<bool> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        Ok(records.remove(&id).is_some())
    }

    fn list(&self) -> Result<Vec<Endpoint>> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use netfusion_core::{AuthType, EndpointKind};

    fn make_endpoint(name: &str) -> Endpoint {
        let now = Utc::now();
        Endpoint {
            id: EndpointId::new(),
            name: name.to_string(),
            kind: EndpointKind::Generic,
            address: "10.0.0.1".to_string(),
            auth_type: AuthType::Token,
            username: None,
            password: None,
            api_key: Some("tok".to_string()),
            snmp_version: None,
            snmp_community: None,
            site: None,
            notes: None,
            enabled: true,
            created_ts: now,
            updated_ts: now,
        }
    }

    #[test]
    fn file_store_save_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEndpointStore::new(dir.path()).unwrap();
        let ep = make_endpoint("sw1");

        store.save(&ep).unwrap();
        assert_eq!(store.get(ep.id).unwrap(), Some(ep.clone()));

        assert!(store.remove(ep.id).unwrap());
        assert!(!store.remove(ep.id).unwrap());
        assert_eq!(store.get(ep.id).unwrap(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let ep = make_endpoint("persisted");
        FileEndpointStore::new(dir.path()).unwrap().save(&ep).unwrap();

        let reopened = FileEndpointStore::new(dir.path()).unwrap();
        let all = reopened.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].api_key.as_deref(), Some("tok"));
    }

    #[test]
    fn file_store_list_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEndpointStore::new(dir.path()).unwrap();
        store.save(&make_endpoint("good")).unwrap();
        fs::write(dir.path().join("broken.json"), b"{not json").unwrap();
        fs::write(dir.path().join("README.txt"), b"ignored").unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "good");
    }

    #[test]
    fn file_store_list_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEndpointStore::new(dir.path()).unwrap();
        store.save(&make_endpoint("good")).unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let all = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "good");
    }

    #[test]
    fn file_store_list_tolerates_concurrent_removal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEndpointStore::new(dir.path()).unwrap();
        store.save(&make_endpoint("stable")).unwrap();

        std::thread::scope(|s| {
            let store = &store;
            s.spawn(move || {
                for _ in 0..40 {
                    let batch: Vec<Endpoint> = (0..50)
                        .map(|i| make_endpoint(&format!("ep-{i}")))
                        .collect();
                    for ep in &batch {
                        store.save(ep).unwrap();
                    }
                    for ep in &batch {
                        store.remove(ep.id).unwrap();
                    }
                }
            });

            for _ in 0..500 {
                let all = store.list().unwrap();
                assert!(all.iter().any(|ep| ep.name == "stable"));
            }
        });
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryEndpointStore::new();
        let ep = make_endpoint("mem");
        store.save(&ep).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.remove(ep.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
