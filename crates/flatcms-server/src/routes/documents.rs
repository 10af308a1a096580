//! Document routes: `/`, `/new`, `/create`, `/{filename}`, and its
//! `/edit` and `/delete` sub-paths.
//!
//! Viewing and listing are public. Everything that changes a document, and
//! the forms leading to it, goes through the sign-in guard first.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form};
use serde::Deserialize;

use flatcms_core::error::DocumentError;
use flatcms_core::render::{self, ContentKind, RenderedContent};

use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::state::AppState;
use crate::views;

const SITE_TITLE: &str = "FlatCMS";

// ── Request types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateDocumentForm {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentForm {
    #[serde(default)]
    pub content: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// List every document.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, AppError> {
    let names = state.documents.list().await?;

    let mut session = ctx.session().await;
    let body = views::index(&names, session.username());
    Ok(views::page(&mut session, SITE_TITLE, &body).into_response())
}

/// Show a document: plain text verbatim, markdown inside the layout.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if !state.documents.exists(&filename).await? {
        return Ok(ctx.redirect_home(not_found_message(&filename)).await);
    }

    let bytes = match state.documents.read(&filename).await {
        Ok(bytes) => bytes,
        // Removed between the two calls.
        Err(DocumentError::NotFound { .. }) => {
            return Ok(ctx.redirect_home(not_found_message(&filename)).await);
        }
        Err(e) => return Err(e.into()),
    };

    match render::render(&filename, &bytes) {
        Ok(RenderedContent {
            kind: ContentKind::PlainText,
            body,
        }) => Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()),
        Ok(RenderedContent {
            kind: ContentKind::Html,
            body,
        }) => {
            let mut session = ctx.session().await;
            Ok(views::page(&mut session, &filename, &views::markdown_document(&body)).into_response())
        }
        Err(e) => {
            tracing::debug!(name = %filename, "refusing to display unsupported document");
            Ok(ctx.redirect_home(e.to_string()).await)
        }
    }
}

/// Form for a new document.
pub async fn new_form(Extension(ctx): Extension<RequestContext>) -> Result<Response, AppError> {
    ctx.require_signed_in().await?;

    let mut session = ctx.session().await;
    Ok(views::page(&mut session, "New Document", &views::new_document("")).into_response())
}

/// Create an empty document. Invalid names re-render the form with 422.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    form: Result<Form<CreateDocumentForm>, FormRejection>,
) -> Result<Response, AppError> {
    ctx.require_signed_in().await?;
    let Form(form) = form?;

    match state.documents.create(&form.filename).await {
        Ok(_) => Ok(ctx
            .redirect_home(format!("{} has been created.", form.filename))
            .await),
        Err(e @ (DocumentError::Validation { .. } | DocumentError::AlreadyExists { .. })) => {
            let mut session = ctx.session().await;
            session.set_flash(e.to_string());
            let page = views::page(&mut session, "New Document", &views::new_document(&form.filename));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Form pre-filled with the document's current content.
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    ctx.require_signed_in().await?;

    let bytes = match state.documents.read(&filename).await {
        Ok(bytes) => bytes,
        Err(DocumentError::NotFound { .. }) => {
            return Ok(ctx.redirect_home(not_found_message(&filename)).await);
        }
        Err(e) => return Err(e.into()),
    };

    let content = String::from_utf8_lossy(&bytes);
    let mut session = ctx.session().await;
    let title = format!("Edit {filename}");
    Ok(views::page(&mut session, &title, &views::edit_document(&filename, &content)).into_response())
}

/// Replace a document's content. Creates the document if it is missing.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(filename): Path<String>,
    form: Result<Form<UpdateDocumentForm>, FormRejection>,
) -> Result<Response, AppError> {
    ctx.require_signed_in().await?;
    let Form(form) = form?;

    state
        .documents
        .write(&filename, form.content.as_bytes())
        .await?;

    Ok(ctx
        .redirect_home(format!("{filename} has been updated."))
        .await)
}

/// Delete a document.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    ctx.require_signed_in().await?;

    match state.documents.delete(&filename).await {
        Ok(()) => Ok(ctx
            .redirect_home(format!("{filename} has been deleted."))
            .await),
        Err(DocumentError::NotFound { .. }) => {
            Ok(ctx.redirect_home(not_found_message(&filename)).await)
        }
        Err(e) => Err(e.into()),
    }
}

// `/new` and `/create` shadow documents of the same name for one method
// each; the other method falls through to the per-document handler.

/// `GET /create`: view a document named `create`.
pub async fn show_create(
    state: State<Arc<AppState>>,
    ctx: Extension<RequestContext>,
) -> Result<Response, AppError> {
    show(state, ctx, Path("create".to_owned())).await
}

/// `POST /new`: update a document named `new`.
pub async fn update_new(
    state: State<Arc<AppState>>,
    ctx: Extension<RequestContext>,
    form: Result<Form<UpdateDocumentForm>, FormRejection>,
) -> Result<Response, AppError> {
    update(state, ctx, Path("new".to_owned()), form).await
}

// ── Helpers ──────────────────────────────────────────────────────────

fn not_found_message(filename: &str) -> String {
    format!("{filename} does not exist.")
}
