//! Storage error types.
//!
//! Every error variant carries the key or path involved so a failure can be
//! diagnosed from the log line alone.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open or create the storage root.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to storage.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a key from storage.
    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// Failed to enumerate the store.
    #[error("failed to list keys: {reason}")]
    List { reason: String },

    /// The key does not exist.
    #[error("key '{key}' not found")]
    NotFound { key: String },

    /// The key already exists and the operation refuses to overwrite it.
    #[error("key '{key}' already exists")]
    AlreadyExists { key: String },

    /// The key cannot name an entry in this store.
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}
