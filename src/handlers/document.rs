//! Document CRUD handlers. Router state is the `CrudService` of one kind.

use crate::error::AppError;
use crate::extractors::{DocumentId, JsonBody};
use crate::response::{created, ok};
use crate::service::CrudService;
use axum::{extract::State, response::IntoResponse};
use serde_json::Value;

pub async fn create(
    State(svc): State<CrudService>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let doc = svc.create(body).await?;
    Ok(created(doc))
}

pub async fn read(
    State(svc): State<CrudService>,
    DocumentId(id): DocumentId,
) -> Result<impl IntoResponse, AppError> {
    let doc = svc.read(id).await?;
    Ok(ok(doc))
}

pub async fn update(
    State(svc): State<CrudService>,
    DocumentId(id): DocumentId,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let doc = svc.update(id, body).await?;
    Ok(ok(doc))
}

/// Soft delete; responds with the tombstoned document.
pub async fn delete(
    State(svc): State<CrudService>,
    DocumentId(id): DocumentId,
) -> Result<impl IntoResponse, AppError> {
    let doc = svc.delete(id).await?;
    Ok(ok(doc))
}
