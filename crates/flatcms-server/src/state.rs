//! Shared application state for `FlatCMS` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use flatcms_core::credentials::CredentialStore;
use flatcms_core::document::DocumentStore;
use flatcms_core::session::SessionStore;
use flatcms_storage::FsBackend;

use crate::config::ServerConfig;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Document CRUD over the data directory.
    pub documents: DocumentStore,
    /// Username/password checks against the credentials file.
    pub credentials: CredentialStore,
    /// Server-side sessions behind signed cookies.
    pub sessions: SessionStore,
    /// Idle lifetime after which the sweeper drops a session.
    pub session_ttl: Duration,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Open the data directory, check the credentials file, and set up the
    /// session store.
    ///
    /// # Errors
    ///
    /// Fails if the data directory cannot be opened, the credentials file
    /// cannot be loaded, or the session secret is unusable.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Arc<Self>> {
        let backend = FsBackend::open(&config.data_dir).context("failed to open data directory")?;
        info!(path = %config.data_dir.display(), env = ?config.environment, "using document directory");

        let credentials = CredentialStore::new(&config.credentials_path);
        let users = credentials
            .load()
            .await
            .context("failed to load credentials")?;
        info!(
            path = %config.credentials_path.display(),
            users = users.len(),
            "credentials file loaded"
        );

        let secret = if let Some(secret) = &config.session_secret {
            secret.as_bytes().to_vec()
        } else {
            warn!("FLATCMS_SESSION_SECRET not set; sessions will not survive a restart");
            random_secret()
        };
        let sessions = SessionStore::new(&secret).context("failed to set up session store")?;

        Ok(Arc::new(Self {
            documents: DocumentStore::new(Arc::new(backend)),
            credentials,
            sessions,
            session_ttl: Duration::from_secs(config.session_ttl_secs),
        }))
    }
}

/// 32 bytes of OS randomness from two v4 UUIDs.
fn random_secret() -> Vec<u8> {
    let a = uuid::Uuid::new_v4();
    let b = uuid::Uuid::new_v4();
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(a.as_bytes());
    key.extend_from_slice(b.as_bytes());
    key
}
