//! Services sitting between the HTTP handlers and the `Model` stores.

pub mod credentials;
mod crud;
mod query;
mod sync;
mod validation;
pub use credentials::{CredentialVerifier, StoreVerifier};
pub use crud::{body_to_payload, CrudService};
pub use query::QueryService;
pub use sync::{SyncRequest, SyncResponse, SyncService};
pub use validation::RequestValidator;
