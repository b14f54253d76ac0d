//! Crop planner backend: a policy-gated document API over crops, crop relationships, crop tags,
//! users and locations, with a cross-collection incremental sync endpoint.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{Settings, StoreBackend};
pub use error::{AppError, ConfigError};
pub use model::{Document, Model, Payload};
pub use registry::{EntityKind, MutabilityPolicy, Registry};
pub use routes::{api_routes, app, common_routes, document_routes};
pub use service::{CrudService, SyncRequest, SyncResponse, SyncService};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, ModelSet};
