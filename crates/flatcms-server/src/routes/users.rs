//! Sign-in routes: `/users/signin` and `/users/signout`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::state::AppState;
use crate::views;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Show the sign-in form.
pub async fn signin_form(Extension(ctx): Extension<RequestContext>) -> Response {
    let mut session = ctx.session().await;
    views::page(&mut session, "Sign In", &views::signin("")).into_response()
}

/// Check the submitted credentials and sign the session in.
pub async fn signin(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    if state
        .credentials
        .verify(&form.username, &form.password)
        .await?
    {
        info!(username = %form.username, "user signed in");
        let mut session = ctx.session().await;
        session.sign_in(form.username);
        drop(session);
        ctx.rotate_session();
        return Ok(ctx.redirect_home("Welcome!").await);
    }

    warn!(username = %form.username, "sign-in rejected");
    let mut session = ctx.session().await;
    session.set_flash(INVALID_CREDENTIALS);
    let page = views::page(&mut session, "Sign In", &views::signin(&form.username));
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

/// Forget the signed-in user.
pub async fn signout(Extension(ctx): Extension<RequestContext>) -> Response {
    let mut session = ctx.session().await;
    if let Some(username) = session.username() {
        info!(username = %username, "user signed out");
    }
    session.sign_out();
    drop(session);
    ctx.rotate_session();
    ctx.redirect_home("You have been signed out.").await
}
