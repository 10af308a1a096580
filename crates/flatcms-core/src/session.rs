//! Sessions, flash messages, and the sign-in guard.
//!
//! A [`Session`] holds at most two values: the signed-in username and a
//! one-shot flash message. Sessions live server-side in a [`SessionStore`];
//! the browser only carries a cookie of the form `<id>.<signature>`, where
//! the signature is HMAC-SHA256 of the id under the process secret.
//!
//! A cookie that fails verification, or names a session the store no longer
//! holds, simply starts a fresh session.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Idle lifetime of a signed-out session that only carries a flash.
pub const DEFAULT_ANONYMOUS_IDLE: Duration = Duration::from_secs(300);

/// Most signed-out sessions held at once before the oldest are evicted.
pub const DEFAULT_ANONYMOUS_CAPACITY: usize = 10_000;

/// Flash staged when a signed-out visitor hits a protected operation.
pub const SIGN_IN_REQUIRED: &str = "You must be signed in to do that.";

/// Per-browser session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
    message: Option<String>,
}

impl Session {
    /// Whether the session carries a signed-in identity.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.username.is_some()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn sign_in(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    pub fn sign_out(&mut self) {
        self.username = None;
    }

    /// Stage a message for the next rendered page, replacing any pending one.
    pub fn set_flash(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Remove and return the pending message. A second call returns `None`.
    pub fn take_flash(&mut self) -> Option<String> {
        self.message.take()
    }

    /// True when there is nothing worth persisting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.message.is_none()
    }
}

/// Signal that the caller must stop and redirect to the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequired;

/// Gate a protected operation on the session being signed in.
///
/// # Errors
///
/// When signed out, stages [`SIGN_IN_REQUIRED`] and returns
/// [`AuthRequired`]. The caller must perform no further side effects.
pub fn require_signed_in(session: &mut Session) -> Result<(), AuthRequired> {
    if session.is_signed_in() {
        Ok(())
    } else {
        session.set_flash(SIGN_IN_REQUIRED);
        Err(AuthRequired)
    }
}

/// Opaque identifier of a stored session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Result of resolving a request's cookie.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub id: SessionId,
    pub session: Session,
    /// The browser does not yet hold a cookie for `id`.
    pub is_new: bool,
}

struct StoredSession {
    session: Session,
    last_seen: Instant,
}

/// In-process session storage keyed by signed cookie values.
pub struct SessionStore {
    mac: HmacSha256,
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
    anonymous_idle: Duration,
    anonymous_capacity: usize,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create an empty store signing cookies with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSecret`] if the secret is empty.
    pub fn new(secret: &[u8]) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret {
                reason: "secret must not be empty".to_owned(),
            });
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|e| SessionError::InvalidSecret {
            reason: e.to_string(),
        })?;

        Ok(Self {
            mac,
            sessions: RwLock::new(HashMap::new()),
            anonymous_idle: DEFAULT_ANONYMOUS_IDLE,
            anonymous_capacity: DEFAULT_ANONYMOUS_CAPACITY,
        })
    }

    /// Override how long a signed-out session may sit idle.
    #[must_use]
    pub fn with_anonymous_idle(mut self, idle: Duration) -> Self {
        self.anonymous_idle = idle;
        self
    }

    /// Override how many signed-out sessions are kept at once.
    #[must_use]
    pub fn with_anonymous_capacity(mut self, capacity: usize) -> Self {
        self.anonymous_capacity = capacity.max(1);
        self
    }

    /// The cookie value that identifies `id`.
    #[must_use]
    pub fn cookie_value(&self, id: &SessionId) -> String {
        let mut mac = self.mac.clone();
        mac.update(id.0.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        format!("{}.{signature}", id.0)
    }

    /// Extract the session id from a cookie value if its signature holds.
    fn verify_cookie(&self, cookie: &str) -> Option<SessionId> {
        let (id, signature) = cookie.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(SessionId(id.to_owned()))
    }

    /// Resolve the session for a request cookie, starting a fresh one when
    /// the cookie is absent, forged, or stale.
    pub async fn load(&self, cookie: Option<&str>) -> LoadedSession {
        if let Some(id) = cookie.and_then(|c| self.verify_cookie(c)) {
            let sessions = self.sessions.read().await;
            if let Some(stored) = sessions.get(&id) {
                return LoadedSession {
                    id,
                    session: stored.session.clone(),
                    is_new: false,
                };
            }
        }

        LoadedSession {
            id: SessionId::generate(),
            session: Session::default(),
            is_new: true,
        }
    }

    /// Persist a session and mark it as seen now.
    ///
    /// Empty sessions are dropped instead of stored. Storing a new signed-out
    /// session beyond the anonymous capacity evicts the least recently seen
    /// signed-out one.
    pub async fn save(&self, id: &SessionId, session: Session) {
        if session.is_empty() {
            self.remove(id).await;
            return;
        }

        let mut sessions = self.sessions.write().await;
        if !session.is_signed_in() && !sessions.contains_key(id) {
            evict_anonymous(&mut sessions, self.anonymous_capacity.saturating_sub(1));
        }
        sessions.insert(
            id.clone(),
            StoredSession {
                session,
                last_seen: Instant::now(),
            },
        );
    }

    /// Retire `old` and return a fresh id to store its session under.
    ///
    /// Called whenever the signed-in identity changes, so a cookie handed
    /// out before the change never carries the new identity.
    pub async fn rotate(&self, old: &SessionId) -> SessionId {
        self.remove(old).await;
        SessionId::generate()
    }

    /// Forget a session. Returns whether it was stored.
    pub async fn remove(&self, id: &SessionId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drop every session not seen within `ttl`. Signed-out sessions go
    /// after the shorter anonymous idle limit. Returns how many went.
    pub async fn purge_idle(&self, ttl: Duration) -> usize {
        let anonymous_ttl = ttl.min(self.anonymous_idle);
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| {
            let limit = if stored.session.is_signed_in() {
                ttl
            } else {
                anonymous_ttl
            };
            stored.last_seen.elapsed() < limit
        });
        before.saturating_sub(sessions.len())
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Drop the least recently seen signed-out sessions until at most `keep`
/// remain. Signed-in sessions are never touched.
fn evict_anonymous(sessions: &mut HashMap<SessionId, StoredSession>, keep: usize) {
    let mut anonymous: Vec<(Instant, SessionId)> = sessions
        .iter()
        .filter(|(_, stored)| !stored.session.is_signed_in())
        .map(|(id, stored)| (stored.last_seen, id.clone()))
        .collect();
    if anonymous.len() <= keep {
        return;
    }

    anonymous.sort_unstable_by_key(|(seen, _)| *seen);
    let excess = anonymous.len() - keep;
    for (_, id) in anonymous.into_iter().take(excess) {
        sessions.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn make_store() -> SessionStore {
        SessionStore::new(b"test-secret").unwrap()
    }

    // ── Session ──────────────────────────────────────────────────────

    #[test]
    fn flash_is_read_once() {
        let mut session = Session::default();
        session.set_flash("Welcome!");
        assert_eq!(session.take_flash().as_deref(), Some("Welcome!"));
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn later_flash_replaces_earlier() {
        let mut session = Session::default();
        session.set_flash("first");
        session.set_flash("second");
        assert_eq!(session.take_flash().as_deref(), Some("second"));
    }

    #[test]
    fn sign_in_and_out() {
        let mut session = Session::default();
        assert!(!session.is_signed_in());
        session.sign_in("admin");
        assert_eq!(session.username(), Some("admin"));
        session.sign_out();
        assert!(!session.is_signed_in());
    }

    #[test]
    fn guard_passes_when_signed_in() {
        let mut session = Session::default();
        session.sign_in("admin");
        assert!(require_signed_in(&mut session).is_ok());
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn guard_stages_flash_when_signed_out() {
        let mut session = Session::default();
        assert_eq!(require_signed_in(&mut session), Err(AuthRequired));
        assert_eq!(session.take_flash().as_deref(), Some(SIGN_IN_REQUIRED));
    }

    // ── SessionStore ─────────────────────────────────────────────────

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            SessionStore::new(b""),
            Err(SessionError::InvalidSecret { .. })
        ));
    }

    #[tokio::test]
    async fn missing_cookie_starts_new_session() {
        let store = make_store();
        let loaded = store.load(None).await;
        assert!(loaded.is_new);
        assert!(loaded.session.is_empty());
    }

    #[tokio::test]
    async fn saved_session_is_found_by_cookie() {
        let store = make_store();
        let loaded = store.load(None).await;
        let mut session = loaded.session;
        session.sign_in("admin");
        store.save(&loaded.id, session).await;

        let cookie = store.cookie_value(&loaded.id);
        let again = store.load(Some(&cookie)).await;
        assert!(!again.is_new);
        assert_eq!(again.id, loaded.id);
        assert_eq!(again.session.username(), Some("admin"));
    }

    #[tokio::test]
    async fn tampered_cookie_starts_new_session() {
        let store = make_store();
        let loaded = store.load(None).await;
        let mut session = Session::default();
        session.sign_in("admin");
        store.save(&loaded.id, session).await;

        let cookie = store.cookie_value(&loaded.id);
        let forged = format!("{}0.{}", loaded.id.as_str(), cookie.rsplit_once('.').unwrap().1);
        for bad in [forged.as_str(), loaded.id.as_str(), "garbage", "abc.zz"] {
            let again = store.load(Some(bad)).await;
            assert!(again.is_new, "cookie {bad:?} should not resolve");
            assert!(!again.session.is_signed_in());
        }
    }

    #[tokio::test]
    async fn cookie_from_other_secret_is_rejected() {
        let store = make_store();
        let other = SessionStore::new(b"other-secret").unwrap();
        let loaded = store.load(None).await;
        let mut session = Session::default();
        session.set_flash("hi");
        store.save(&loaded.id, session).await;

        let foreign = other.cookie_value(&loaded.id);
        assert!(store.load(Some(&foreign)).await.is_new);
    }

    #[tokio::test]
    async fn empty_sessions_are_not_stored() {
        let store = make_store();
        let loaded = store.load(None).await;
        store.save(&loaded.id, Session::default()).await;
        assert!(store.is_empty().await);

        let mut session = Session::default();
        session.set_flash("x");
        store.save(&loaded.id, session.clone()).await;
        assert_eq!(store.len().await, 1);

        session.take_flash();
        store.save(&loaded.id, session).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn removed_session_is_forgotten() {
        let store = make_store();
        let loaded = store.load(None).await;
        let mut session = Session::default();
        session.sign_in("admin");
        store.save(&loaded.id, session).await;

        assert!(store.remove(&loaded.id).await);
        assert!(!store.remove(&loaded.id).await);

        let cookie = store.cookie_value(&loaded.id);
        assert!(store.load(Some(&cookie)).await.is_new);
    }

    #[tokio::test]
    async fn purge_idle_drops_only_stale_sessions() {
        let store = make_store();
        let mut session = Session::default();
        session.sign_in("admin");
        let loaded = store.load(None).await;
        store.save(&loaded.id, session).await;

        assert_eq!(store.purge_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.purge_idle(Duration::ZERO).await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn signed_out_sessions_expire_sooner() {
        let store = make_store().with_anonymous_idle(Duration::ZERO);

        let mut member = Session::default();
        member.sign_in("admin");
        let member_id = store.load(None).await.id;
        store.save(&member_id, member).await;

        let mut visitor = Session::default();
        visitor.set_flash("missing.txt does not exist.");
        let visitor_id = store.load(None).await.id;
        store.save(&visitor_id, visitor).await;

        assert_eq!(store.purge_idle(Duration::from_secs(3600)).await, 1);
        let cookie = store.cookie_value(&member_id);
        assert!(!store.load(Some(&cookie)).await.is_new);
    }

    #[tokio::test]
    async fn signed_out_sessions_are_capped() {
        let store = make_store().with_anonymous_capacity(3);

        let mut member = Session::default();
        member.sign_in("admin");
        let member_id = store.load(None).await.id;
        store.save(&member_id, member).await;

        let mut first = None;
        for _ in 0..50 {
            let mut visitor = Session::default();
            visitor.set_flash("missing.txt does not exist.");
            let id = store.load(None).await.id;
            first.get_or_insert_with(|| id.clone());
            store.save(&id, visitor).await;
        }

        assert_eq!(store.len().await, 4);
        let oldest = store.cookie_value(&first.unwrap());
        assert!(store.load(Some(&oldest)).await.is_new);
        let cookie = store.cookie_value(&member_id);
        assert!(!store.load(Some(&cookie)).await.is_new);
    }

    #[tokio::test]
    async fn rotate_retires_old_id() {
        let store = make_store();
        let loaded = store.load(None).await;
        let mut session = Session::default();
        session.set_flash("planted");
        store.save(&loaded.id, session.clone()).await;

        let fresh = store.rotate(&loaded.id).await;
        assert_ne!(fresh, loaded.id);
        session.sign_in("admin");
        store.save(&fresh, session).await;

        let old_cookie = store.cookie_value(&loaded.id);
        let reloaded = store.load(Some(&old_cookie)).await;
        assert!(reloaded.is_new);
        assert!(!reloaded.session.is_signed_in());

        let new_cookie = store.cookie_value(&fresh);
        assert_eq!(store.load(Some(&new_cookie)).await.session.username(), Some("admin"));
    }
}
