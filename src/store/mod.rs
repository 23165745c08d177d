pub mod file;
pub mod memory;

use std::sync::Arc;

use crate::models::PendingSubmission;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Name of the slot holding the serialized pending list.
pub const PENDING_SLOT: &str = "pendingSubmissions";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "Storage I/O error: {err}"),
            StorageError::Serialize(err) => write!(f, "Storage serialization error: {err}"),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialize(err)
    }
}

/// String key-value slots with whole-value replace semantics.
pub trait StorageProvider: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Durable home of the pending list. Reads never fail: a missing, unreadable
/// or malformed slot loads as an empty list.
#[derive(Clone)]
pub struct LocalStore {
    provider: Arc<dyn StorageProvider>,
    key: String,
}

impl LocalStore {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self::with_key(provider, PENDING_SLOT)
    }

    pub fn with_key(provider: Arc<dyn StorageProvider>, key: &str) -> Self {
        Self {
            provider,
            key: key.to_string(),
        }
    }

    pub fn load(&self) -> Vec<PendingSubmission> {
        let raw = match self.provider.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", self.key);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Discarding corrupt {} slot: {e}", self.key);
                Vec::new()
            }
        }
    }

    pub fn save(&self, submissions: &[PendingSubmission]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(submissions)?;
        self.provider.set(&self.key, &raw)
    }

    pub fn clear(&self) {
        if let Err(e) = self.provider.remove(&self.key) {
            tracing::warn!("Failed to clear {}: {e}", self.key);
        }
    }
}
