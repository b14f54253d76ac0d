//! POST /api/get-updates

use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::response::ok;
use crate::service::SyncRequest;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn get_updates(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SyncRequest>,
) -> Result<impl IntoResponse, AppError> {
    let diff = state.sync().changes_since(req).await?;
    Ok(ok(diff))
}
