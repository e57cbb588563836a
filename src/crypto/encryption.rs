use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::CryptoError;

pub const NONCE_LENGTH: usize = 12;

/// Encrypted string payload: base64 ciphertext (includes the AES-GCM auth tag)
/// and the base64 96-bit IV it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    pub encrypted_data: String,
    pub iv: String,
}

impl EncryptedPayload {
    /// Encrypt plaintext using AES-256-GCM with a fresh random IV
    pub(crate) fn seal(cipher: &Aes256Gcm, plaintext: &[u8]) -> Result<Self, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(Self {
            encrypted_data: BASE64.encode(ciphertext),
            iv: BASE64.encode(nonce_bytes),
        })
    }

    /// Decrypt using AES-256-GCM. Any decoding or authentication failure is
    /// reported as `DecryptionFailed`; no plaintext is returned in that case.
    pub(crate) fn open(&self, cipher: &Aes256Gcm) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = BASE64.decode(&self.encrypted_data).map_err(|e| {
            tracing::debug!("Ciphertext is not valid base64: {e}");
            CryptoError::DecryptionFailed
        })?;
        let nonce_bytes = BASE64.decode(&self.iv).map_err(|e| {
            tracing::debug!("IV is not valid base64: {e}");
            CryptoError::DecryptionFailed
        })?;
        if nonce_bytes.len() != NONCE_LENGTH {
            tracing::debug!(len = nonce_bytes.len(), "IV has wrong length");
            return Err(CryptoError::DecryptionFailed);
        }
        let nonce = Nonce::from_slice(&nonce_bytes);

        cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Raw IV bytes, if the encoding is valid.
    pub fn iv_bytes(&self) -> Option<Vec<u8>> {
        BASE64.decode(&self.iv).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::aead::KeyInit;

    fn test_cipher(fill: u8) -> Aes256Gcm {
        Aes256Gcm::new_from_slice(&[fill; 32]).unwrap()
    }

    #[test]
    fn seal_open_round_trip() {
        let cipher = test_cipher(7);
        let sealed = EncryptedPayload::seal(&cipher, b"Hello, medical data!").unwrap();
        assert_eq!(sealed.open(&cipher).unwrap(), b"Hello, medical data!");
    }

    #[test]
    fn empty_plaintext_round_trip() {
        let cipher = test_cipher(7);
        let sealed = EncryptedPayload::seal(&cipher, b"").unwrap();
        assert!(sealed.open(&cipher).unwrap().is_empty());
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = EncryptedPayload::seal(&test_cipher(1), b"secret").unwrap();
        assert_eq!(sealed.open(&test_cipher(2)), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn every_flipped_bit_detected() {
        let cipher = test_cipher(9);
        let sealed = EncryptedPayload::seal(&cipher, b"tamper me").unwrap();
        let raw = BASE64.decode(&sealed.encrypted_data).unwrap();

        for byte in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[byte] ^= 1 << bit;
                let payload = EncryptedPayload {
                    encrypted_data: BASE64.encode(&tampered),
                    iv: sealed.iv.clone(),
                };
                assert_eq!(payload.open(&cipher), Err(CryptoError::DecryptionFailed));
            }
        }
    }

    #[test]
    fn wrong_iv_fails() {
        let cipher = test_cipher(3);
        let first = EncryptedPayload::seal(&cipher, b"one").unwrap();
        let second = EncryptedPayload::seal(&cipher, b"two").unwrap();
        let swapped = EncryptedPayload {
            encrypted_data: first.encrypted_data,
            iv: second.iv,
        };
        assert_eq!(swapped.open(&cipher), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn malformed_base64_fails() {
        let cipher = test_cipher(3);
        let sealed = EncryptedPayload::seal(&cipher, b"x").unwrap();

        let bad_data = EncryptedPayload {
            encrypted_data: "not base64!!".into(),
            iv: sealed.iv.clone(),
        };
        assert_eq!(bad_data.open(&cipher), Err(CryptoError::DecryptionFailed));

        let short_iv = EncryptedPayload {
            encrypted_data: sealed.encrypted_data.clone(),
            iv: BASE64.encode([0u8; 8]),
        };
        assert_eq!(short_iv.open(&cipher), Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn iv_is_96_bits() {
        let sealed = EncryptedPayload::seal(&test_cipher(1), b"x").unwrap();
        assert_eq!(sealed.iv_bytes().unwrap().len(), NONCE_LENGTH);
    }

    #[test]
    fn json_field_names() {
        let sealed = EncryptedPayload::seal(&test_cipher(1), b"x").unwrap();
        let json = serde_json::to_value(&sealed).unwrap();
        assert!(json.get("encryptedData").is_some());
        assert!(json.get("iv").is_some());
    }
}
