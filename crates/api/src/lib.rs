//! HTTP API layer for EMR Adopt.
//!
//! - **Endpoints**: registration, listings, adoptions, donations, admin
//! - **Extractors**: authenticated user and administrator
//! - **Middleware**: `X-User-Id` identity resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
