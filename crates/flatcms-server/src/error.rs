//! HTTP error types for `FlatCMS` server.
//!
//! Maps domain errors from `flatcms-core` into HTTP responses. Errors render
//! as a small HTML page, except [`AppError::AuthRequired`], which is the
//! sign-in guard's redirect back to the listing.

use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use flatcms_core::error::{CredentialError, DocumentError};
use flatcms_core::session::AuthRequired;

use crate::views;

/// Application-level error returned from HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Protected operation attempted while signed out. The flash is
    /// already staged on the session.
    #[error("sign-in required")]
    AuthRequired,
    /// The request body could not be parsed.
    #[error("{0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Input understood but refused.
    #[error("{0}")]
    Unprocessable(String),
    /// Internal server error. The message is logged, never shown.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::AuthRequired => return Redirect::to("/").into_response(),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong.".to_owned(),
                )
            }
        };

        (status, views::error_page(status, &message)).into_response()
    }
}

impl From<AuthRequired> for AppError {
    fn from(_: AuthRequired) -> Self {
        Self::AuthRequired
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation { .. } | DocumentError::AlreadyExists { .. } => {
                Self::Unprocessable(err.to_string())
            }
            DocumentError::NotFound { .. } => Self::NotFound(err.to_string()),
            DocumentError::Storage(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        Self::BadRequest(err.body_text())
    }
}
