//! Notifications endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use emr_common::AppResult;
use emr_db::entities::notification;
use serde::Deserialize;

use super::default_limit;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications query.
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    /// Maximum results (default: 20, max: 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
}

/// Get notifications for the authenticated user, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<ApiResponse<Vec<notification::Model>>> {
    let notifications = state
        .notification_service
        .list_for_user(&user.id, query.limit, query.until_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(notifications))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}
