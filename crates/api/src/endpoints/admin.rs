//! Admin endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use emr_common::{AppError, AppResult};
use emr_core::BillingOutcome;
use emr_db::entities::{rhu_listing, setting};
use serde::Deserialize;

use super::PageQuery;
use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Update setting request.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: String,
}

/// Validation queue, oldest first.
async fn pending_listings(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Vec<rhu_listing::Model>>> {
    let listings = state
        .listing_service
        .list_pending(&admin, query.limit, query.offset)
        .await?;
    Ok(ApiResponse::ok(listings))
}

/// Run the billing cycle for one adoption now.
async fn advance_billing(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(adoption_id): Path<String>,
) -> AppResult<ApiResponse<BillingOutcome>> {
    let outcome = state
        .adoption_service
        .advance_billing_cycle(&adoption_id, Utc::now())
        .await?;
    tracing::info!(adoption_id = %adoption_id, admin_id = %admin.id, "Manual billing advance");
    Ok(ApiResponse::ok(outcome))
}

async fn get_setting(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<ApiResponse<setting::Model>> {
    let stored = state
        .settings_service
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("setting {key}")))?;
    Ok(ApiResponse::ok(stored))
}

async fn put_setting(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<UpdateSettingRequest>,
) -> AppResult<ApiResponse<setting::Model>> {
    let stored = state
        .settings_service
        .set(&admin, &key, &req.value)
        .await?;
    Ok(ApiResponse::ok(stored))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/listings/pending", get(pending_listings))
        .route("/billing/{adoption_id}/advance", post(advance_billing))
        .route("/settings/{key}", get(get_setting).put(put_setting))
}
