//! Asset allow-list endpoint

use axum::{extract::State, Json};

use crate::dto::AssetsResponse;
use crate::AppState;

/// GET /assets - Assets accepted as settlement input
pub async fn list_assets(State(state): State<AppState>) -> Json<AssetsResponse> {
    let executor = state.executor().await;
    Json(AssetsResponse::new(executor.config(), executor.fee_schedule()))
}
