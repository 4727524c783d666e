//! Quote endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::dto::{QuoteRequestDto, QuoteResponse};
use crate::routes::{bad_request, carbon_failure, invalid_body, ApiFailure};
use crate::AppState;

/// POST /quote - Input needed for a desired carbon amount at current prices
pub async fn quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequestDto>, JsonRejection>,
) -> Result<Json<QuoteResponse>, ApiFailure> {
    let Json(request) = payload.map_err(invalid_body)?;
    let request = request.parse().map_err(bad_request)?;

    let quote = state
        .executor()
        .await
        .quote(&request)
        .map_err(carbon_failure)?;

    Ok(Json(QuoteResponse::from(quote)))
}
