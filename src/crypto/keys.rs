use aes_gcm::aead::KeyInit;
use aes_gcm::Aes256Gcm;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encryption::EncryptedPayload;
use super::CryptoError;

pub const KEY_LENGTH: usize = 32; // AES-256

/// Persisted form of the process key: id plus raw key bytes.
/// Zeroed on drop.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub(crate) struct StoredKeyRecord {
    #[serde(rename = "keyId")]
    pub(crate) key_id: String,
    pub(crate) key: Vec<u8>,
}

/// The process-lifetime AES-256-GCM key.
///
/// Only the initialized cipher is kept; the raw bytes are not reachable
/// once the key has been built.
pub struct EncryptionKey {
    key_id: String,
    cipher: Aes256Gcm,
}

impl EncryptionKey {
    /// Generate a fresh key. Returns the key and the record to persist.
    pub(crate) fn generate() -> Result<(Self, StoredKeyRecord), CryptoError> {
        let mut raw = Zeroizing::new([0u8; KEY_LENGTH]);
        OsRng.try_fill_bytes(&mut raw[..]).map_err(|e| {
            CryptoError::KeyInitialization(format!("random source unavailable: {e}"))
        })?;

        let record = StoredKeyRecord {
            key_id: Uuid::new_v4().to_string(),
            key: raw.to_vec(),
        };
        let key = Self::import(&record)?;
        Ok((key, record))
    }

    /// Rebuild the key from a persisted record.
    pub(crate) fn import(record: &StoredKeyRecord) -> Result<Self, CryptoError> {
        if record.key.len() != KEY_LENGTH {
            return Err(CryptoError::KeyInitialization(format!(
                "stored key must be {KEY_LENGTH} bytes, got {}",
                record.key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&record.key)
            .map_err(|e| CryptoError::KeyInitialization(e.to_string()))?;
        Ok(Self {
            key_id: record.key_id.clone(),
            cipher,
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Encrypt data using AES-256-GCM
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, CryptoError> {
        EncryptedPayload::seal(&self.cipher, plaintext)
    }

    /// Decrypt data using AES-256-GCM
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>, CryptoError> {
        payload.open(&self.cipher)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
