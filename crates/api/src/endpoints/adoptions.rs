//! Adoption endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use emr_common::AppResult;
use emr_db::entities::{
    adoption::{self, AdoptionKind},
    donation,
};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create adoption request.
#[derive(Debug, Deserialize)]
pub struct CreateAdoptionRequest {
    pub listing_id: String,
    /// `RECURRING` (default) or `ONE_TIME`.
    #[serde(default)]
    pub kind: AdoptionKind,
}

/// A new adoption and its first donation.
#[derive(Serialize)]
pub struct CreatedAdoptionResponse {
    pub adoption: adoption::Model,
    pub donation: donation::Model,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateAdoptionRequest>,
) -> AppResult<ApiResponse<CreatedAdoptionResponse>> {
    let (adoption, donation) = state
        .adoption_service
        .create(&user, &req.listing_id, req.kind)
        .await?;
    Ok(ApiResponse::created(CreatedAdoptionResponse {
        adoption,
        donation,
    }))
}

/// Adoptions of the calling donor.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<adoption::Model>>> {
    let adoptions = state.adoption_service.list_for_donor(&user).await?;
    Ok(ApiResponse::ok(adoptions))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<adoption::Model>> {
    let adoption = state.adoption_service.get(&id).await?;
    state
        .adoption_service
        .ensure_donor_or_admin(&user, &adoption)
        .await?;
    Ok(ApiResponse::ok(adoption))
}

async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<adoption::Model>> {
    Ok(ApiResponse::ok(state.adoption_service.cancel(&id, &user).await?))
}

async fn donations(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<donation::Model>>> {
    let adoption = state.adoption_service.get(&id).await?;
    state
        .adoption_service
        .ensure_donor_or_admin(&user, &adoption)
        .await?;
    let donations = state.adoption_service.list_donations(&id).await?;
    Ok(ApiResponse::ok(donations))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/donations", get(donations))
}
