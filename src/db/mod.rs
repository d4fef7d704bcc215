//! Keyed local storage
//!
//! Persisted state lives in a flat key-value namespace of JSON strings, one
//! value per key (`sms_campaigns`, `sms_statistics`, `sms_settings`,
//! `sms_users`). Services own their keys; nothing else reads or writes them.

mod file;
mod memory;

pub use file::FileKeyValueStore;
pub use memory::MemoryKeyValueStore;

use thiserror::Error;

/// Errors raised by the storage layer and the services built on it
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("campaign '{0}' has more sends than recipients")]
    InconsistentCampaign(String),
}

/// A synchronous string key-value namespace.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Keys are used as file names, so keep them to a safe alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
