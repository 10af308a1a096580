//! `FlatCMS` HTTP server.
//!
//! Wires the core library and the filesystem storage backend into an Axum
//! application serving the document pages and the sign-in flow.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod views;
