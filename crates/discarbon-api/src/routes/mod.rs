//! API route handlers

pub mod assets;
pub mod health;
pub mod ledger;
pub mod quote;
pub mod settlement;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use carbon::CarbonError;

use crate::dto::ApiError;
use crate::AppState;

/// Handler error: status plus JSON body
pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/assets", get(assets::list_assets))
        .route("/quote", post(quote::quote))
        .route("/settle", post(settlement::settle))
        .route("/ledger", get(ledger::get_ledger))
        .route("/ledger/contributors/{index}", get(ledger::get_contributor))
        .route("/ledger/contributions/{address}", get(ledger::get_contribution))
        .with_state(state)
}

/// Map a protocol error onto its HTTP status and code
pub(crate) fn carbon_failure(e: CarbonError) -> ApiFailure {
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(e.error_code(), e.to_string())),
    )
}

pub(crate) fn bad_request(e: impl Into<ApiError>) -> ApiFailure {
    (StatusCode::BAD_REQUEST, Json(e.into()))
}

/// Body that is not JSON or does not fit the DTO, answered in the API's error shape
pub(crate) fn invalid_body(rejection: JsonRejection) -> ApiFailure {
    (
        rejection.status(),
        Json(ApiError::new("invalid_body", rejection.body_text())),
    )
}
