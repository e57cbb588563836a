//! Key-value persistence seam.
//!
//! Every record kind lives in one flat string-keyed namespace. Backends
//! store opaque bytes; the JSON encoding of records is handled by the
//! helpers below so a backend only has to move bytes around.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DatabaseError;

/// Flat key-value store with get/set/remove/keys.
///
/// Implementations must be thread-safe (`Send + Sync`). A single call is
/// atomic for its one key; nothing spans multiple keys.
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, DatabaseError>;

    /// Insert or overwrite `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), DatabaseError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), DatabaseError>;

    /// Every key currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>, DatabaseError>;
}

/// Load and decode a JSON record.
pub fn get_json<T: DeserializeOwned>(
    backend: &dyn KeyValueBackend,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    match backend.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode a record as JSON and store it.
pub fn set_json<T: Serialize + ?Sized>(
    backend: &dyn KeyValueBackend,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let bytes = serde_json::to_vec(value)?;
    backend.set(key, &bytes)
}

/// Keys starting with `prefix`, in backend order.
pub fn keys_with_prefix(
    backend: &dyn KeyValueBackend,
    prefix: &str,
) -> Result<Vec<String>, DatabaseError> {
    Ok(backend
        .keys()?
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .collect())
}
