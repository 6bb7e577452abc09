//! Process-local stores: an in-memory map and a store that keeps nothing.

use dashmap::DashMap;
use dbrefactor_core::AppliedSet;
use tracing::warn;

use crate::error::StorageError;
use crate::traits::{AppliedStore, storage_key};

/// In-memory store holding the serialized payload per storage key, the same shape a
/// browser's key-value storage would hold.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw payload under a storage key, bypassing serialization.
    pub fn insert_raw(&self, key: impl Into<String>, payload: impl Into<String>) {
        self.records.insert(key.into(), payload.into());
    }

    /// The raw payload stored under a storage key.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.get(key).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl AppliedStore for MemoryStore {
    fn load(&self, root_key: &str) -> AppliedSet {
        let Some(payload) = self.raw(&storage_key(root_key)) else {
            return AppliedSet::new();
        };
        serde_json::from_str(&payload).unwrap_or_else(|e| {
            warn!(root_key, error = %e, "corrupt applied set, treating as empty");
            AppliedSet::new()
        })
    }

    fn save(&self, root_key: &str, applied: &AppliedSet) -> Result<(), StorageError> {
        let payload = serde_json::to_string(applied)?;
        self.records.insert(storage_key(root_key), payload);
        Ok(())
    }

    fn clear(&self, root_key: &str) -> Result<bool, StorageError> {
        Ok(self.records.remove(&storage_key(root_key)).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Used when no durable backend exists (e.g. no home directory). Loads are empty and
/// writes are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl AppliedStore for NullStore {
    fn load(&self, _root_key: &str) -> AppliedSet {
        AppliedSet::new()
    }

    fn save(&self, _root_key: &str, _applied: &AppliedSet) -> Result<(), StorageError> {
        Ok(())
    }

    fn clear(&self, _root_key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}
