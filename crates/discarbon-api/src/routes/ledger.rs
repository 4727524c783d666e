//! Contribution ledger reads

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::dto::{ApiError, ContributionResponse, ContributorResponse, LedgerResponse};
use crate::routes::{bad_request, ApiFailure};
use crate::state::parse_address;
use crate::AppState;

/// GET /ledger - Total and every contributor in order
pub async fn get_ledger(State(state): State<AppState>) -> Json<LedgerResponse> {
    let snapshot = state.executor().await.ledger().snapshot();
    Json(LedgerResponse::from(snapshot))
}

/// GET /ledger/contributors/{index}
pub async fn get_contributor(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ContributorResponse>, ApiFailure> {
    let address = state.executor().await.ledger().contributor_at(index);

    match address {
        Some(address) => Ok(Json(ContributorResponse {
            index,
            address: address.to_string(),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("No contributor at index {}", index))),
        )),
    }
}

/// GET /ledger/contributions/{address} - Zero for unknown addresses
pub async fn get_contribution(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ContributionResponse>, ApiFailure> {
    let address = parse_address("address", &address).map_err(bad_request)?;
    let amount = state.executor().await.ledger().contribution_of(address);

    Ok(Json(ContributionResponse {
        address: address.to_string(),
        amount: amount.to_string(),
    }))
}
