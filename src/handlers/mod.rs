//! HTTP handlers for document CRUD, synchronization, domain queries and login.

pub mod auth;
pub mod document;
pub mod query;
pub mod sync;
