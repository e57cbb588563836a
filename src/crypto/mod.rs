pub mod encryption;
pub mod keys;
pub mod manager;

pub use encryption::*;
pub use keys::*;
pub use manager::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Key initialization failed: {0}")]
    KeyInitialization(String),

    #[error("Encryption key not available")]
    KeyUnavailable,

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,
}
