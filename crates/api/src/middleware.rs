//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use emr_core::{
    AdoptionService, ListingService, NotificationService, RegistrationService, SettingsService,
};

/// Header carrying the caller's user ID, set by the upstream identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub registration_service: RegistrationService,
    pub listing_service: ListingService,
    pub adoption_service: AdoptionService,
    pub notification_service: NotificationService,
    pub settings_service: SettingsService,
}

/// Authentication middleware.
///
/// Resolves `X-User-Id` to a user and stores it in the request extensions.
/// Unknown IDs are ignored, so protected handlers answer 401. A failed
/// lookup ends the request with the error response.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    if let Some(user_id) = user_id {
        match state.registration_service.find_user(&user_id).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "Identity header names unknown user");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
