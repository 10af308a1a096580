//! Error types for `flatcms-core`.
//!
//! Validation errors carry the exact sentence shown to the user. Credential
//! errors never include password material, only the file path and the user
//! name involved.

use flatcms_storage::StorageError;

/// Errors from document operations.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The requested name is not acceptable for a new document.
    #[error("{reason}")]
    Validation { reason: String },

    /// The document does not exist.
    #[error("{name} does not exist.")]
    NotFound { name: String },

    /// A document with this name already exists.
    #[error("{name} already exists.")]
    AlreadyExists { name: String },

    /// The storage backend failed.
    #[error("document storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for DocumentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound { name: key },
            StorageError::AlreadyExists { key } => Self::AlreadyExists { name: key },
            StorageError::InvalidKey { key, reason } => Self::Validation {
                reason: format!("{key} is not a valid document name: {reason}."),
            },
            other => Self::Storage(other),
        }
    }
}

/// Errors from loading or checking credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The credentials file is missing, unreadable, or malformed.
    #[error("credentials config error at '{path}': {reason}")]
    Config { path: String, reason: String },

    /// Hashing or verifying a password failed outside of a mismatch.
    #[error("password hashing failed: {reason}")]
    Hash { reason: String },
}

/// Errors from rendering document content.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The document's extension has no renderer.
    #[error("{name} cannot be displayed.")]
    Unsupported { name: String },
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The signing secret cannot be used.
    #[error("invalid session secret: {reason}")]
    InvalidSecret { reason: String },
}
