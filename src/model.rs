//! Document shape and the capability contract every backing store implements.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys owned by the store; ignored when they appear in a client payload.
pub const RESERVED_KEYS: [&str; 3] = ["id", "updatedAt", "deletedAt"];

/// Opaque kind-specific attributes.
pub type Payload = Map<String, Value>;

/// One stored entity. Only `id`, `updated_at` and `deleted_at` are interpreted; the rest is
/// passed through as-is and flattened next to them on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Document {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Copy with the given payload fields removed.
    pub fn without_fields(mut self, fields: &[&str]) -> Self {
        for f in fields {
            self.payload.remove(*f);
        }
        self
    }
}

/// Drop store-owned keys from a client payload.
pub fn strip_reserved(mut payload: Payload) -> Payload {
    for key in RESERVED_KEYS {
        payload.remove(key);
    }
    payload
}

/// Capability contract for one document kind.
///
/// `get`, `update` and `soft_delete` only see live documents and return `Ok(None)` otherwise.
/// `find_changed_since` also returns soft-deleted documents, ordered oldest to newest.
#[async_trait]
pub trait Model: Send + Sync {
    async fn create(&self, payload: Payload) -> Result<Document, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Shallow merge of `payload` into the stored attributes.
    async fn update(&self, id: Uuid, payload: Payload) -> Result<Option<Document>, AppError>;

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Document>, AppError>;

    /// Strictly after `since`; everything when `since` is `None`.
    async fn find_changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Document>, AppError>;

    /// Every live document, oldest to newest.
    async fn list_live(&self) -> Result<Vec<Document>, AppError>;

    /// Live documents whose string `field` contains `fragment`, ignoring case.
    async fn search(&self, field: &str, fragment: &str) -> Result<Vec<Document>, AppError>;

    /// Live documents whose string `field` equals `value` exactly.
    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<Document>, AppError>;

    /// Cheap round-trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
