//! Read-only aggregate endpoints.

use crate::error::AppError;
use crate::response::ok;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::collections::HashMap;

/// GET /api/get-crops-by-name?name=<fragment>
pub async fn get_crops_by_name(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let fragment = params.get("name").map(String::as_str).unwrap_or("");
    let crops = state.queries().crops_by_name(fragment).await?;
    Ok(ok(crops))
}

/// GET /api/get-all-crop-relationships
pub async fn get_all_crop_relationships(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let edges = state.queries().all_crop_relationships().await?;
    Ok(ok(edges))
}

/// GET /api/get-locations
pub async fn get_locations(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let locations = state.queries().all_locations().await?;
    Ok(ok(locations))
}
