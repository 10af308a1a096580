//! HTTP route handlers for `FlatCMS`.
//!
//! Routes are organized by concern:
//! - `documents`: listing, viewing, creating, editing, and deleting documents
//! - `users`: sign-in and sign-out

pub mod documents;
pub mod users;

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode};
use axum::middleware as axum_mw;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::session_middleware;
use crate::state::AppState;
use crate::views;

/// Concurrent sign-in attempts allowed; bcrypt verification is expensive.
const SIGNIN_CONCURRENCY: usize = 8;

/// Build the full application router with session handling and response
/// headers applied.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(documents::index))
        .route(
            "/users/signin",
            get(users::signin_form)
                .post(users::signin)
                .layer(tower::limit::ConcurrencyLimitLayer::new(SIGNIN_CONCURRENCY)),
        )
        .route("/users/signout", post(users::signout))
        .route("/new", get(documents::new_form).post(documents::update_new))
        .route("/create", get(documents::show_create).post(documents::create))
        .route("/{filename}", get(documents::show).post(documents::update))
        .route("/{filename}/edit", get(documents::edit_form))
        .route("/{filename}/delete", post(documents::delete))
        .fallback(not_found)
        .layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        views::error_page(StatusCode::NOT_FOUND, "No such page."),
    )
}
