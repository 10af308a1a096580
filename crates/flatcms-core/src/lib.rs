//! Core library for `FlatCMS`.
//!
//! Contains the document store, the credential store, the content renderer,
//! and the session model with its sign-in guard. This crate depends on
//! `flatcms-storage` for the blob backend and knows nothing about HTTP.

pub mod credentials;
pub mod document;
pub mod error;
pub mod render;
pub mod session;
