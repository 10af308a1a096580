//! Document store for `FlatCMS`.
//!
//! A document is a named blob in the storage backend; its name is its file
//! name, extension included. The backend is the source of truth and nothing
//! is cached here. Only `.txt` and `.md` documents can be created through
//! [`DocumentStore::create`], but anything already present in the backend
//! is listed.

use std::path::Path;
use std::sync::Arc;

use flatcms_storage::{StorageBackend, StorageError};
use tracing::info;

use crate::error::DocumentError;

/// Message for an empty or whitespace-only name.
pub const NAME_REQUIRED: &str = "A name is required.";

/// Message for a name whose extension is not whitelisted.
pub const BAD_EXTENSION: &str = "The file extension must be .txt or .md.";

/// The two kinds of document the system creates and renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Plain text, `.txt`.
    Text,
    /// Markdown, `.md`.
    Markdown,
}

impl DocumentKind {
    /// Classify a document name by its extension.
    ///
    /// Matching is case-sensitive. A dot-file such as `.md` has no
    /// extension and yields `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match Path::new(name).extension()?.to_str()? {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            _ => None,
        }
    }

    /// The extension including its leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => ".txt",
            Self::Markdown => ".md",
        }
    }
}

/// Check a name submitted for a new document.
///
/// # Errors
///
/// Returns [`DocumentError::Validation`] with the user-facing message when
/// the name is blank or its extension is not `.txt` or `.md`.
pub fn validate_new_name(name: &str) -> Result<DocumentKind, DocumentError> {
    if name.trim().is_empty() {
        return Err(DocumentError::Validation {
            reason: NAME_REQUIRED.to_owned(),
        });
    }

    DocumentKind::from_name(name).ok_or_else(|| DocumentError::Validation {
        reason: BAD_EXTENSION.to_owned(),
    })
}

/// Named-document CRUD over a storage backend.
#[derive(Clone)]
pub struct DocumentStore {
    storage: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// All document names, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend cannot be listed.
    pub async fn list(&self) -> Result<Vec<String>, DocumentError> {
        Ok(self.storage.list().await?)
    }

    /// Whether a document with this name exists.
    ///
    /// A name the backend cannot address never exists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] if the backend fails.
    pub async fn exists(&self, name: &str) -> Result<bool, DocumentError> {
        match self.storage.exists(name).await {
            Ok(found) => Ok(found),
            Err(StorageError::InvalidKey { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a document's full content.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if the document is absent or the
    /// name cannot be addressed.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, DocumentError> {
        match self.storage.get(name).await {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) | Err(StorageError::InvalidKey { .. }) => Err(DocumentError::NotFound {
                name: name.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Create an empty document.
    ///
    /// An existing document with the same name is left untouched.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Validation`] if the name is blank, has the wrong
    ///   extension, or cannot be addressed by the backend.
    /// - [`DocumentError::AlreadyExists`] if the name is taken.
    /// - [`DocumentError::Storage`] if the backend fails.
    pub async fn create(&self, name: &str) -> Result<DocumentKind, DocumentError> {
        let kind = validate_new_name(name)?;
        self.storage.create(name).await?;
        info!(name = %name, kind = ?kind, "document created");
        Ok(kind)
    }

    /// Replace a document's content, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Validation`] for names the backend cannot
    /// address, or [`DocumentError::Storage`] if the write fails.
    pub async fn write(&self, name: &str, content: &[u8]) -> Result<(), DocumentError> {
        self.storage.put(name, content).await?;
        info!(name = %name, bytes = content.len(), "document written");
        Ok(())
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NotFound`] if the document is absent or the
    /// name cannot be addressed.
    pub async fn delete(&self, name: &str) -> Result<(), DocumentError> {
        match self.storage.delete(name).await {
            Ok(()) => {
                info!(name = %name, "document deleted");
                Ok(())
            }
            Err(StorageError::InvalidKey { .. }) => Err(DocumentError::NotFound {
                name: name.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
