//! Donation endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use emr_common::AppResult;
use emr_core::PaymentOutcome;
use emr_db::entities::donation;
use serde::Deserialize;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Gateway outcome for a pending donation.
#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    pub outcome: PaymentOutcome,
}

async fn record_payment(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RecordPaymentRequest>,
) -> AppResult<ApiResponse<donation::Model>> {
    tracing::debug!(donation_id = %id, admin_id = %admin.id, outcome = ?req.outcome, "Recording payment");
    let donation = state
        .adoption_service
        .record_payment(&id, req.outcome)
        .await?;
    Ok(ApiResponse::ok(donation))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/payment", post(record_payment))
}
