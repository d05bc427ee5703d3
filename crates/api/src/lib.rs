//! HTTP surface for the letterdesk workflow server.
//!
//! Exposes the workflow endpoints (upload, generate, merge, send-emails,
//! progress, status, files, download) under `/api/v1/workflows/{variant}`,
//! sharing the router builder between the production binary and the
//! integration tests.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
