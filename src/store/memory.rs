//! In-process document store. Backs `STORE=memory` and the test suites.

use crate::error::AppError;
use crate::model::{Document, Model, Payload};
use crate::registry::EntityKind;
use crate::store::MonotonicClock;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub struct MemoryModel {
    kind: EntityKind,
    docs: RwLock<HashMap<Uuid, Document>>,
    clock: Arc<MonotonicClock>,
}

impl MemoryModel {
    pub fn new(kind: EntityKind, clock: Arc<MonotonicClock>) -> Self {
        MemoryModel {
            kind,
            docs: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Document>> {
        self.docs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Document>> {
        self.docs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn collect_sorted<F>(&self, keep: F) -> Vec<Document>
    where
        F: Fn(&Document) -> bool,
    {
        let mut out: Vec<Document> = self.read().values().filter(|d| keep(d)).cloned().collect();
        out.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
        out
    }
}

fn field_str<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.payload.get(field).and_then(|v| v.as_str())
}

#[async_trait]
impl Model for MemoryModel {
    async fn create(&self, payload: Payload) -> Result<Document, AppError> {
        let mut docs = self.write();
        let doc = Document {
            id: Uuid::new_v4(),
            updated_at: self.clock.now(),
            deleted_at: None,
            payload,
        };
        docs.insert(doc.id, doc.clone());
        tracing::debug!(kind = %self.kind, id = %doc.id, "created");
        Ok(doc)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        Ok(self.read().get(&id).filter(|d| d.is_live()).cloned())
    }

    async fn update(&self, id: Uuid, payload: Payload) -> Result<Option<Document>, AppError> {
        let mut docs = self.write();
        let Some(doc) = docs.get_mut(&id).filter(|d| d.is_live()) else {
            return Ok(None);
        };
        doc.payload.extend(payload);
        doc.updated_at = self.clock.now();
        Ok(Some(doc.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        let mut docs = self.write();
        let Some(doc) = docs.get_mut(&id).filter(|d| d.is_live()) else {
            return Ok(None);
        };
        let now = self.clock.now();
        doc.updated_at = now;
        doc.deleted_at = Some(now);
        tracing::debug!(kind = %self.kind, id = %id, "soft deleted");
        Ok(Some(doc.clone()))
    }

    async fn find_changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Document>, AppError> {
        Ok(self.collect_sorted(|d| since.map_or(true, |t| d.updated_at > t)))
    }

    async fn list_live(&self) -> Result<Vec<Document>, AppError> {
        Ok(self.collect_sorted(Document::is_live))
    }

    async fn search(&self, field: &str, fragment: &str) -> Result<Vec<Document>, AppError> {
        let needle = fragment.to_lowercase();
        Ok(self.collect_sorted(|d| {
            d.is_live() && field_str(d, field).is_some_and(|s| s.to_lowercase().contains(&needle))
        }))
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<Document>, AppError> {
        Ok(self.collect_sorted(|d| d.is_live() && field_str(d, field) == Some(value)))
    }
}
