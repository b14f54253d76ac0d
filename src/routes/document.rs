//! Generic CRUD router factory: one router per registered kind, gated by its mutability policy.

use crate::error::no_such_route;
use crate::handlers::document::{create, delete, read, update};
use crate::service::CrudService;
use axum::{
    routing::{get, post},
    Router,
};

/// `POST /` and `GET /:id` always; `PUT /:id` and `DELETE /:id` only for `Full` kinds.
/// A verb that is not registered falls through to the same "No such route" 404 as an unknown path.
pub fn document_routes(svc: CrudService) -> Router {
    let item = if svc.entity().policy.allows_mutation() {
        get(read).put(update).delete(delete)
    } else {
        get(read)
    };
    Router::new()
        .route("/", post(create).fallback(no_such_route))
        .route("/:id", item.fallback(no_such_route))
        .with_state(svc)
}
