//! HTTP API layer for quorum.
//!
//! This crate provides the REST API and real-time streaming:
//!
//! - **Endpoints**: vote ledger and notification feed
//! - **Extractors**: authentication
//! - **Middleware**: bearer-token validation
//! - **Streaming**: the WebSocket transport behind the presence registry
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod auth;
pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

pub use auth::{AuthenticatedUser, TokenVerifier};
pub use endpoints::router;
pub use streaming::streaming_handler;
