//! Settlement endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::dto::{SettleRequestDto, SettleResponse};
use crate::routes::{bad_request, carbon_failure, invalid_body, ApiFailure};
use crate::AppState;

/// POST /settle - Swap, split and record one contribution
pub async fn settle(
    State(state): State<AppState>,
    payload: Result<Json<SettleRequestDto>, JsonRejection>,
) -> Result<Json<SettleResponse>, ApiFailure> {
    let Json(request) = payload.map_err(invalid_body)?;
    let request = request.parse().map_err(bad_request)?;

    let outcome = {
        let mut executor = state.executor().await;
        executor.settle(&request)
    };

    match outcome {
        Ok(outcome) => Ok(Json(SettleResponse::from(outcome))),
        Err(e) => {
            tracing::warn!(
                contributor = %request.contributor,
                code = e.error_code(),
                error = %e,
                "Settlement rejected"
            );
            Err(carbon_failure(e))
        }
    }
}
