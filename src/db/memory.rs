//! In-memory backend for tests and ephemeral sessions.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{DatabaseError, KeyValueBackend};

/// Process-local backend. Nothing survives a restart.
///
/// A `BTreeMap` keeps `keys()` sorted so scans are deterministic, matching
/// the SQLite backend's `ORDER BY key`.
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let entries = self.entries.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), DatabaseError> {
        let mut entries = self.entries.write().map_err(|_| DatabaseError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DatabaseError> {
        let mut entries = self.entries.write().map_err(|_| DatabaseError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, DatabaseError> {
        let entries = self.entries.read().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_overwrite() {
        let backend = MemoryBackend::new();
        backend.set("k", b"one").unwrap();
        backend.set("k", b"two").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"two".to_vec()));
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn remove_absent_key_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.remove("missing").is_ok());
        assert!(backend.is_empty());
    }

    #[test]
    fn keys_are_sorted() {
        let backend = MemoryBackend::new();
        backend.set("b", b"").unwrap();
        backend.set("a", b"").unwrap();
        backend.set("c", b"").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["a", "b", "c"]);
    }
}
