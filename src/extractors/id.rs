//! Extract a document id from the `:id` path segment.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// Parsed `:id`. A segment that is not a UUID cannot name a live document, so it is a 404.
#[derive(Clone, Copy, Debug)]
pub struct DocumentId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for DocumentId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::RouteNotFound)?;
        Uuid::parse_str(raw.trim())
            .map(DocumentId)
            .map_err(|_| AppError::NotFound(format!("no live document with id {}", raw)))
    }
}
