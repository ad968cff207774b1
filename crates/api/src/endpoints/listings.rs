//! Listing endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use emr_common::AppResult;
use emr_core::{CreateListingInput, UpdateListingInput};
use emr_db::{entities::rhu_listing, repositories::ListingWithDonors};
use serde::Deserialize;

use super::default_limit;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Marketplace browse query.
#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

/// Reject request.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// Browse validated listings.
async fn browse(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> AppResult<ApiResponse<Vec<ListingWithDonors>>> {
    let listings = state
        .listing_service
        .browse(query.search.as_deref(), query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(listings))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    Ok(ApiResponse::ok(state.listing_service.get(&id).await?))
}

/// Listings owned by the calling recipient.
async fn mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<rhu_listing::Model>>> {
    let listings = state.listing_service.list_for_recipient(&user).await?;
    Ok(ApiResponse::ok(listings))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateListingInput>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    let listing = state.listing_service.create(&user, input).await?;
    Ok(ApiResponse::created(listing))
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateListingInput>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    let listing = state.listing_service.update(&id, &user, input).await?;
    Ok(ApiResponse::ok(listing))
}

async fn submit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    Ok(ApiResponse::ok(state.listing_service.submit(&id, &user).await?))
}

async fn validate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    Ok(ApiResponse::ok(
        state.listing_service.validate(&id, &user).await?,
    ))
}

async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    let listing = state
        .listing_service
        .reject(&id, &user, &req.reason)
        .await?;
    Ok(ApiResponse::ok(listing))
}

async fn deactivate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<rhu_listing::Model>> {
    Ok(ApiResponse::ok(
        state.listing_service.deactivate(&id, &user).await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(browse).post(create))
        .route("/mine", get(mine))
        .route("/{id}", get(show).patch(update))
        .route("/{id}/submit", post(submit))
        .route("/{id}/validate", post(validate))
        .route("/{id}/reject", post(reject))
        .route("/{id}/deactivate", post(deactivate))
}
