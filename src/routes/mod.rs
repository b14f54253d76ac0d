//! Router assembly.

mod api;
mod common;
mod document;

pub use api::api_routes;
pub use common::common_routes;
pub use document::document_routes;

use crate::error::{panic_response, AppError};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Enforced while `JsonBody` buffers the request, so overruns surface as `AppError::PayloadTooLarge`.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// The full application: common routes at the root, the document API under `/api`.
pub fn app(state: AppState) -> Result<Router, AppError> {
    Ok(Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state)?)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http()))
}
