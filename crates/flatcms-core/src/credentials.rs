//! Credential store for `FlatCMS`.
//!
//! Credentials live in a TOML file of `username = "bcrypt hash"` pairs:
//!
//! ```toml
//! admin = "$2b$12$..."
//! ```
//!
//! The file is read fresh on every verification, so edits take effect
//! without a restart. Nothing here ever writes to it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::CredentialError;

/// bcrypt work factor used when hashing new passwords.
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// Read-only view of the credentials file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Point the store at a credentials file. The file is not read until
    /// [`load`](Self::load) or [`verify`](Self::verify).
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The credentials file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Config`] if the file is missing, unreadable,
    /// or not a flat table of string values.
    pub async fn load(&self) -> Result<HashMap<String, String>, CredentialError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.config_error(format!("failed to read file: {e}")))?;

        toml::from_str(&raw).map_err(|e| self.config_error(format!("malformed credentials: {e}")))
    }

    /// Check a username and plaintext password against the file.
    ///
    /// Returns `Ok(false)` for unknown users and wrong passwords alike. The
    /// bcrypt comparison runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Config`] if the file cannot be loaded or the
    ///   stored hash for `username` is not a valid bcrypt hash.
    /// - [`CredentialError::Hash`] if the blocking task fails.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let mut credentials = self.load().await?;
        let Some(hash) = credentials.remove(username) else {
            return Ok(false);
        };

        let password = password.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| CredentialError::Hash {
                reason: format!("verification task failed: {e}"),
            })?;

        outcome.map_err(|e| {
            self.config_error(format!("invalid password hash for user '{username}': {e}"))
        })
    }

    fn config_error(&self, reason: String) -> CredentialError {
        CredentialError::Config {
            path: self.path.display().to_string(),
            reason,
        }
    }
}

/// Hash a plaintext password for storage in the credentials file.
///
/// # Errors
///
/// Returns [`CredentialError::Hash`] if `cost` is outside bcrypt's range.
pub fn hash_password(password: &str, cost: u32) -> Result<String, CredentialError> {
    bcrypt::hash(password, cost).map_err(|e| CredentialError::Hash {
        reason: e.to_string(),
    })
}
