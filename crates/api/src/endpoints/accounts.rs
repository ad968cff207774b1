//! Registration and account endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use emr_common::AppResult;
use emr_core::{Account, RegisterInput};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Register a donor or recipient.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<Account>> {
    let account = state.registration_service.register(input).await?;
    Ok(ApiResponse::created(account))
}

/// Get the current account with its profile.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Account>> {
    let account = state.registration_service.get_account(&user.id).await?;
    Ok(ApiResponse::ok(account))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
}
