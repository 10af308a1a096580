//! Session middleware for `FlatCMS`.
//!
//! Resolves the session cookie before the handler runs and injects a
//! [`RequestContext`] into the request extensions. After the handler
//! returns, the (possibly modified) session is written back to the store and
//! a cookie is issued if the browser does not have one yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tokio::sync::{Mutex, MutexGuard};
use tracing::warn;

use flatcms_core::session::{self, Session};

use crate::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the signed session id.
pub const SESSION_COOKIE: &str = "flatcms_session";

/// Per-request context handed to handlers.
///
/// Holds the request's session. Cloning shares the same session.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    session: Arc<Mutex<Session>>,
    rotate: Arc<AtomicBool>,
}

impl RequestContext {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            rotate: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Lock the session for reading or mutation.
    pub async fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    /// Run the sign-in guard.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AuthRequired`], which renders as a redirect to
    /// `/`, with the sign-in flash already staged.
    pub async fn require_signed_in(&self) -> Result<(), AppError> {
        let mut session = self.session().await;
        session::require_signed_in(&mut session)?;
        Ok(())
    }

    /// Stage a flash message and redirect to the listing.
    pub async fn redirect_home(&self, message: impl Into<String>) -> Response {
        self.session().await.set_flash(message);
        Redirect::to("/").into_response()
    }

    /// Have the session stored under a fresh id once the handler returns.
    ///
    /// Must be called whenever the signed-in identity changes.
    pub fn rotate_session(&self) {
        self.rotate.store(true, Ordering::Relaxed);
    }

    fn rotation_requested(&self) -> bool {
        self.rotate.load(Ordering::Relaxed)
    }

    async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }
}

/// Middleware that loads and persists the session around each request.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie = read_cookie(req.headers(), SESSION_COOKIE);
    let loaded = state.sessions.load(cookie.as_deref()).await;

    let ctx = RequestContext::new(loaded.session);
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;

    let session = ctx.snapshot().await;
    let (id, issue_cookie) = if ctx.rotation_requested() {
        let id = state.sessions.rotate(&loaded.id).await;
        (id, !session.is_empty())
    } else {
        (loaded.id, loaded.is_new && !session.is_empty())
    };
    state.sessions.save(&id, session).await;

    if issue_cookie {
        let value = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            state.sessions.cookie_value(&id)
        );
        match HeaderValue::from_str(&value) {
            Ok(header) => {
                response.headers_mut().append(SET_COOKIE, header);
            }
            Err(e) => warn!(error = %e, "failed to encode session cookie"),
        }
    }

    response
}

/// Find a cookie by name across all `Cookie` headers.
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn read_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; flatcms_session=abc.def"));
        assert_eq!(
            read_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("abc.def")
        );
    }

    #[test]
    fn read_cookie_checks_every_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("flatcms_session=xyz.123"));
        assert_eq!(
            read_cookie(&headers, SESSION_COOKIE).as_deref(),
            Some("xyz.123")
        );
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn guard_on_signed_out_context_stages_flash() {
        let ctx = RequestContext::default();
        let err = ctx.require_signed_in().await.unwrap_err();
        assert!(matches!(err, AppError::AuthRequired));
        assert_eq!(
            ctx.session().await.take_flash().as_deref(),
            Some(session::SIGN_IN_REQUIRED)
        );
    }

    #[test]
    fn rotation_is_shared_between_clones() {
        let ctx = RequestContext::default();
        let handle = ctx.clone();
        assert!(!ctx.rotation_requested());
        handle.rotate_session();
        assert!(ctx.rotation_requested());
    }
}
