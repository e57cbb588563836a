//! Process-lifetime encryption manager.
//!
//! Owns the single AES-256-GCM key. The key record is loaded from the
//! backend on first use, or generated and persisted when none exists.
//!
//! Lifecycle: `Uninitialized → Ready` or `Uninitialized → Failed`. Both
//! end states are terminal for the process; a failed manager stays failed
//! until restart. The initializing step runs under the write lock, so
//! concurrent callers wait for its outcome instead of racing a second key.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::encryption::EncryptedPayload;
use super::keys::{EncryptionKey, StoredKeyRecord};
use super::CryptoError;
use crate::config::ENCRYPTION_KEY_RECORD;
use crate::db::{get_json, set_json, KeyValueBackend};

const SELF_TEST_PLAINTEXT: &str = "This is a test of the encryption system";

enum KeyState {
    Uninitialized,
    Ready(Arc<EncryptionKey>),
    Failed(String),
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Uninitialized,
    Ready,
    Failed,
}

/// Outcome of [`EncryptionManager::self_test`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionSelfTest {
    pub success: bool,
    pub detail: String,
}

pub struct EncryptionManager {
    backend: Arc<dyn KeyValueBackend>,
    state: RwLock<KeyState>,
}

impl EncryptionManager {
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(KeyState::Uninitialized),
        }
    }

    /// Load or create the process key. No-op once ready.
    pub fn initialize(&self) -> Result<(), CryptoError> {
        self.active_key().map(|_| ())
    }

    pub fn status(&self) -> KeyStatus {
        match self.state.read() {
            Ok(state) => match &*state {
                KeyState::Uninitialized => KeyStatus::Uninitialized,
                KeyState::Ready(_) => KeyStatus::Ready,
                KeyState::Failed(_) => KeyStatus::Failed,
            },
            Err(_) => KeyStatus::Failed,
        }
    }

    /// Id of the active key, `None` before initialization or after failure.
    pub fn key_id(&self) -> Option<String> {
        let state = self.state.read().ok()?;
        match &*state {
            KeyState::Ready(key) => Some(key.key_id().to_string()),
            _ => None,
        }
    }

    /// Encrypt a UTF-8 string under a fresh IV. Initializes lazily.
    pub fn encrypt_data(&self, plaintext: &str) -> Result<EncryptedPayload, CryptoError> {
        let key = self.active_key().map_err(|_| CryptoError::KeyUnavailable)?;
        key.encrypt(plaintext.as_bytes())
    }

    /// Decrypt a payload produced by [`encrypt_data`](Self::encrypt_data).
    pub fn decrypt_data(&self, encrypted_data: &str, iv: &str) -> Result<String, CryptoError> {
        let key = self.active_key().map_err(|_| CryptoError::KeyUnavailable)?;
        let payload = EncryptedPayload {
            encrypted_data: encrypted_data.to_string(),
            iv: iv.to_string(),
        };
        let plaintext = key.decrypt(&payload)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Round-trip a fixed probe string through the active key. Never fails;
    /// errors are folded into the report.
    pub fn self_test(&self) -> EncryptionSelfTest {
        let outcome = self.encrypt_data(SELF_TEST_PLAINTEXT).and_then(|sealed| {
            let decrypted = self.decrypt_data(&sealed.encrypted_data, &sealed.iv)?;
            Ok((sealed, decrypted))
        });

        match outcome {
            Ok((sealed, decrypted)) => {
                let preview: String = sealed.encrypted_data.chars().take(20).collect();
                EncryptionSelfTest {
                    success: decrypted == SELF_TEST_PLAINTEXT,
                    detail: format!(
                        "Original: {SELF_TEST_PLAINTEXT}\nEncrypted: {preview}...\nDecrypted: {decrypted}"
                    ),
                }
            }
            Err(e) => {
                tracing::warn!("Encryption self-test failed: {e}");
                EncryptionSelfTest {
                    success: false,
                    detail: format!("Error: {e}"),
                }
            }
        }
    }

    fn active_key(&self) -> Result<Arc<EncryptionKey>, CryptoError> {
        {
            let state = self
                .state
                .read()
                .map_err(|_| CryptoError::KeyInitialization("key state lock poisoned".into()))?;
            match &*state {
                KeyState::Ready(key) => return Ok(Arc::clone(key)),
                KeyState::Failed(reason) => {
                    return Err(CryptoError::KeyInitialization(reason.clone()))
                }
                KeyState::Uninitialized => {}
            }
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| CryptoError::KeyInitialization("key state lock poisoned".into()))?;

        // Another caller may have finished while we waited for the write lock.
        match &*state {
            KeyState::Ready(key) => return Ok(Arc::clone(key)),
            KeyState::Failed(reason) => return Err(CryptoError::KeyInitialization(reason.clone())),
            KeyState::Uninitialized => {}
        }

        match self.load_or_generate() {
            Ok(key) => {
                let key = Arc::new(key);
                *state = KeyState::Ready(Arc::clone(&key));
                Ok(key)
            }
            Err(e) => {
                tracing::error!("Encryption initialization failed: {e}");
                let reason = match &e {
                    CryptoError::KeyInitialization(reason) => reason.clone(),
                    other => other.to_string(),
                };
                *state = KeyState::Failed(reason);
                Err(e)
            }
        }
    }

    fn load_or_generate(&self) -> Result<EncryptionKey, CryptoError> {
        let stored: Option<StoredKeyRecord> = get_json(self.backend.as_ref(), ENCRYPTION_KEY_RECORD)
            .map_err(|e| CryptoError::KeyInitialization(format!("cannot read key record: {e}")))?;

        match stored {
            Some(record) => {
                let key = EncryptionKey::import(&record)?;
                tracing::info!(key_id = %key.key_id(), "Encryption key loaded");
                Ok(key)
            }
            None => {
                let (key, record) = EncryptionKey::generate()?;
                set_json(self.backend.as_ref(), ENCRYPTION_KEY_RECORD, &record).map_err(|e| {
                    CryptoError::KeyInitialization(format!("cannot persist key record: {e}"))
                })?;
                tracing::info!(key_id = %key.key_id(), "Encryption key generated");
                Ok(key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseError, MemoryBackend, SqliteBackend};
    use std::collections::HashSet;

    /// Backend that refuses every operation.
    struct OfflineBackend;

    impl KeyValueBackend for OfflineBackend {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
            Err(DatabaseError::Unavailable("offline".into()))
        }
        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("offline".into()))
        }
        fn remove(&self, _key: &str) -> Result<(), DatabaseError> {
            Err(DatabaseError::Unavailable("offline".into()))
        }
        fn keys(&self) -> Result<Vec<String>, DatabaseError> {
            Err(DatabaseError::Unavailable("offline".into()))
        }
    }

    fn manager() -> EncryptionManager {
        EncryptionManager::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn uninitialized_has_no_key_id() {
        let manager = manager();
        assert_eq!(manager.status(), KeyStatus::Uninitialized);
        assert!(manager.key_id().is_none());
    }

    #[test]
    fn initialize_is_idempotent() {
        let manager = manager();
        manager.initialize().unwrap();
        let first = manager.key_id().unwrap();
        manager.initialize().unwrap();
        assert_eq!(manager.key_id().unwrap(), first);
        assert_eq!(manager.status(), KeyStatus::Ready);
    }

    #[test]
    fn encrypt_initializes_lazily() {
        let manager = manager();
        let sealed = manager.encrypt_data("lazy").unwrap();
        assert_eq!(manager.status(), KeyStatus::Ready);
        assert_eq!(manager.decrypt_data(&sealed.encrypted_data, &sealed.iv).unwrap(), "lazy");
    }

    #[test]
    fn round_trip_unicode() {
        let manager = manager();
        for text in ["", "plain ascii", "Kikohozi cha siku 3", "発熱と咳 🤒", "a\u{0}b\nc"] {
            let sealed = manager.encrypt_data(text).unwrap();
            assert_eq!(manager.decrypt_data(&sealed.encrypted_data, &sealed.iv).unwrap(), text);
        }
    }

    #[test]
    fn ivs_never_repeat() {
        let manager = manager();
        let mut seen = HashSet::new();
        for _ in 0..2_000 {
            let sealed = manager.encrypt_data("same plaintext").unwrap();
            assert!(seen.insert(sealed.iv), "IV reused");
        }
    }

    #[test]
    fn key_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let (key_id, sealed) = {
            let backend = Arc::new(SqliteBackend::open(&path).unwrap());
            let manager = EncryptionManager::new(backend);
            let sealed = manager.encrypt_data("before restart").unwrap();
            (manager.key_id().unwrap(), sealed)
        };

        let backend = Arc::new(SqliteBackend::open(&path).unwrap());
        let manager = EncryptionManager::new(backend);
        manager.initialize().unwrap();
        assert_eq!(manager.key_id().unwrap(), key_id);
        assert_eq!(
            manager.decrypt_data(&sealed.encrypted_data, &sealed.iv).unwrap(),
            "before restart"
        );
    }

    #[test]
    fn other_key_cannot_decrypt() {
        let a = manager();
        let b = manager();
        let sealed = a.encrypt_data("only for a").unwrap();
        assert_eq!(
            b.decrypt_data(&sealed.encrypted_data, &sealed.iv),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn offline_backend_fails_permanently() {
        let manager = EncryptionManager::new(Arc::new(OfflineBackend));
        let err = manager.initialize().unwrap_err();
        assert!(matches!(err, CryptoError::KeyInitialization(_)));
        assert_eq!(manager.status(), KeyStatus::Failed);
        assert!(manager.key_id().is_none());

        // Terminal: later calls report the same failure without retrying.
        assert_eq!(manager.initialize().unwrap_err(), err);
        assert_eq!(manager.encrypt_data("x"), Err(CryptoError::KeyUnavailable));
    }

    #[test]
    fn corrupt_key_record_is_not_replaced() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(ENCRYPTION_KEY_RECORD, br#"{"keyId":"k1","key":[1,2,3]}"#)
            .unwrap();
        let manager = EncryptionManager::new(backend.clone());
        assert!(manager.initialize().is_err());
        // The unusable record stays put so prior ciphertext is not orphaned by a new key.
        assert_eq!(
            backend.get(ENCRYPTION_KEY_RECORD).unwrap().unwrap(),
            br#"{"keyId":"k1","key":[1,2,3]}"#.to_vec()
        );
    }

    #[test]
    fn self_test_reports_success() {
        let report = manager().self_test();
        assert!(report.success);
        assert!(report.detail.contains("Decrypted: This is a test"));
    }

    #[test]
    fn self_test_reports_failure() {
        let report = EncryptionManager::new(Arc::new(OfflineBackend)).self_test();
        assert!(!report.success);
        assert!(report.detail.starts_with("Error:"));
    }

    #[test]
    fn concurrent_first_use_creates_one_key() {
        let manager = Arc::new(manager());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = Arc::clone(&manager);
                std::thread::spawn(move || {
                    m.initialize().unwrap();
                    m.key_id().unwrap()
                })
            })
            .collect();
        let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(ids.len(), 1);
    }
}
