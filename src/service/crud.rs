//! Generic document CRUD for one registered kind.

use crate::error::AppError;
use crate::model::{strip_reserved, Document, Model, Payload};
use crate::registry::{EntityDescriptor, EntityKind};
use crate::service::credentials::hash_password_field;
use crate::service::RequestValidator;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Client body must be a JSON object.
pub fn body_to_payload(value: Value) -> Result<Payload, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}

#[derive(Clone)]
pub struct CrudService {
    entity: Arc<EntityDescriptor>,
    model: Arc<dyn Model>,
}

impl CrudService {
    pub fn new(entity: EntityDescriptor, model: Arc<dyn Model>) -> Self {
        CrudService {
            entity: Arc::new(entity),
            model,
        }
    }

    pub fn entity(&self) -> &EntityDescriptor {
        &self.entity
    }

    /// Strip sensitive fields before a document leaves the service.
    pub fn sanitize(&self, doc: Document) -> Document {
        doc.without_fields(self.entity.sensitive_fields)
    }

    fn not_found(&self, id: Uuid) -> AppError {
        AppError::not_found(self.entity.path_segment, id)
    }

    pub async fn create(&self, body: Value) -> Result<Document, AppError> {
        let payload = strip_reserved(body_to_payload(body)?);
        RequestValidator::validate(&payload, &self.entity.validation)?;
        let payload = if self.entity.kind == EntityKind::User {
            hash_password_field(payload)
        } else {
            payload
        };
        let doc = self.model.create(payload).await?;
        tracing::info!(kind = %self.entity.kind, id = %doc.id, "document created");
        Ok(self.sanitize(doc))
    }

    pub async fn read(&self, id: Uuid) -> Result<Document, AppError> {
        let doc = self.model.get(id).await?.ok_or_else(|| self.not_found(id))?;
        Ok(self.sanitize(doc))
    }

    pub async fn update(&self, id: Uuid, body: Value) -> Result<Document, AppError> {
        let payload = strip_reserved(body_to_payload(body)?);
        RequestValidator::validate_partial(&payload, &self.entity.validation)?;
        let doc = self.model.update(id, payload).await?.ok_or_else(|| self.not_found(id))?;
        tracing::info!(kind = %self.entity.kind, id = %id, "document updated");
        Ok(self.sanitize(doc))
    }

    pub async fn delete(&self, id: Uuid) -> Result<Document, AppError> {
        let doc = self.model.soft_delete(id).await?.ok_or_else(|| self.not_found(id))?;
        tracing::info!(kind = %self.entity.kind, id = %id, "document soft deleted");
        Ok(self.sanitize(doc))
    }
}
