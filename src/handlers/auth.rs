//! POST /api/login

use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::registry::EntityKind;
use crate::response::ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.verifier.verify(req.username.trim(), &req.password).await?;
    tracing::info!(user = %user.id, "login accepted");
    let user = user.without_fields(state.registry.get(EntityKind::User).sensitive_fields);
    Ok(ok(user))
}
