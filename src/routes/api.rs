//! The `/api` router: one document router per registry entry plus the function endpoints.

use crate::error::{no_such_route, AppError};
use crate::handlers::auth::login;
use crate::handlers::query::{get_all_crop_relationships, get_crops_by_name, get_locations};
use crate::handlers::sync::get_updates;
use crate::routes::document_routes;
use crate::state::AppState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

/// Public API: any origin may read.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn api_routes(state: AppState) -> Result<Router, AppError> {
    let mut router = Router::new()
        .route("/login", post(login).fallback(no_such_route))
        .route("/get-crops-by-name", get(get_crops_by_name).fallback(no_such_route))
        .route(
            "/get-all-crop-relationships",
            get(get_all_crop_relationships).fallback(no_such_route),
        )
        .route("/get-locations", get(get_locations).fallback(no_such_route))
        .route("/get-updates", post(get_updates).fallback(no_such_route))
        .with_state(state.clone());

    for entity in state.registry.entries() {
        let crud = state.crud(entity.kind)?;
        router = router.nest(&format!("/{}", entity.path_segment), document_routes(crud));
        tracing::debug!(
            kind = %entity.kind,
            policy = ?entity.policy,
            "document routes mounted"
        );
    }

    Ok(router.fallback(no_such_route).layer(cors()))
}
