//! Storage backend abstraction for `FlatCMS`.
//!
//! This crate defines the [`StorageBackend`] trait, a flat namespace of named
//! blobs that knows nothing about documents, extensions, or rendering. The
//! document store in `flatcms-core` wraps a backend and layers the naming
//! rules on top.
//!
//! Two implementations are provided:
//!
//! - [`FsBackend`]: production default, one file per key in a directory
//! - [`MemoryBackend`]: in-memory, for testing only

mod error;
mod fs_backend;
mod memory;

pub use error::StorageError;
pub use fs_backend::FsBackend;
pub use memory::MemoryBackend;

/// A pluggable flat blob store.
///
/// Keys are single path segments (a file name such as `about.md`). Values
/// are opaque byte arrays. There is no hierarchy and no locking: concurrent
/// writers to the same key race and the last write wins.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for keys rejected by
    /// [`validate_key`], or [`StorageError::Read`] if the backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a value, overwriting any existing one. Creates the key if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Create an empty value under `key`. Never overwrites.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`] if the key is present, or
    /// [`StorageError::Write`] if the underlying backend fails.
    async fn create(&self, key: &str) -> Result<(), StorageError>;

    /// Delete a key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the key is absent, or
    /// [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List every key, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Check whether a key exists.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Check that `key` names a single entry inside the store.
///
/// Rejects empty keys, `.` and `..`, and anything containing a path
/// separator or a null byte.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] describing the first rule violated.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let reason = if key.is_empty() {
        "key must not be empty"
    } else if key == "." || key == ".." {
        "key must not be a relative path component"
    } else if key.contains(['/', '\\']) {
        "key must not contain path separators"
    } else if key.contains('\0') {
        "key must not contain null bytes"
    } else {
        return Ok(());
    };

    Err(StorageError::InvalidKey {
        key: key.to_owned(),
        reason: reason.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_names_are_valid() {
        assert!(validate_key("about.md").is_ok());
        assert!(validate_key("notes.txt").is_ok());
        assert!(validate_key("no-extension").is_ok());
        assert!(validate_key("a..b.md").is_ok());
    }

    #[test]
    fn traversal_and_separators_are_rejected() {
        for key in ["", ".", "..", "../etc/passwd", "dir/file.md", "dir\\file.md", "nul\0.md"] {
            let err = validate_key(key).unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidKey { .. }),
                "expected InvalidKey for {key:?}"
            );
        }
    }
}
