//! API endpoints.

mod accounts;
mod admin;
mod adoptions;
mod donations;
mod listings;
mod notifications;

use axum::Router;
use serde::Deserialize;

use crate::middleware::AppState;

/// Offset pagination query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    20
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(accounts::router())
        .nest("/listings", listings::router())
        .nest("/adoptions", adoptions::router())
        .nest("/donations", donations::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
}
