//! Read-only aggregate queries over the crop, relationship and location collections.

use crate::error::AppError;
use crate::model::{Document, Model};
use crate::registry::{EntityDescriptor, EntityKind, Registry};
use crate::store::ModelSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryService {
    registry: Arc<Registry>,
    models: ModelSet,
}

impl QueryService {
    pub fn new(registry: Arc<Registry>, models: ModelSet) -> Self {
        QueryService { registry, models }
    }

    fn source(&self, kind: EntityKind) -> Result<(&EntityDescriptor, Arc<dyn Model>), AppError> {
        let model = self
            .models
            .get(kind)
            .ok_or_else(|| AppError::Upstream(format!("no store registered for {}", kind)))?;
        Ok((self.registry.get(kind), model))
    }

    /// Live crops whose name contains `fragment`, ignoring case. Empty when nothing matches.
    pub async fn crops_by_name(&self, fragment: &str) -> Result<Vec<Document>, AppError> {
        let (entity, model) = self.source(EntityKind::Crop)?;
        let field = entity
            .name_field
            .ok_or_else(|| AppError::Upstream("crops have no name field".into()))?;
        let docs = model.search(field, fragment.trim()).await?;
        Ok(sanitized(entity, docs))
    }

    /// Every live crop relationship; grouping is left to the client.
    pub async fn all_crop_relationships(&self) -> Result<Vec<Document>, AppError> {
        self.all_live(EntityKind::CropRelationship).await
    }

    pub async fn all_locations(&self) -> Result<Vec<Document>, AppError> {
        self.all_live(EntityKind::Location).await
    }

    async fn all_live(&self, kind: EntityKind) -> Result<Vec<Document>, AppError> {
        let (entity, model) = self.source(kind)?;
        Ok(sanitized(entity, model.list_live().await?))
    }
}

fn sanitized(entity: &EntityDescriptor, docs: Vec<Document>) -> Vec<Document> {
    docs.into_iter().map(|d| d.without_fields(entity.sensitive_fields)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Payload;
    use serde_json::json;

    fn payload(v: serde_json::Value) -> Payload {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn name_lookup_ignores_case_and_returns_empty_on_no_match() {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::in_memory(&registry);
        let crops = models.get(EntityKind::Crop).unwrap();
        crops.create(payload(json!({"commonName": "Tomato"}))).await.unwrap();
        crops.create(payload(json!({"commonName": "Sweet Potato"}))).await.unwrap();
        let queries = QueryService::new(registry, models);

        assert_eq!(queries.crops_by_name("tomato").await.unwrap().len(), 1);
        assert_eq!(queries.crops_by_name("TATO").await.unwrap().len(), 2);
        assert!(queries.crops_by_name("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn relationship_graph_excludes_deleted_edges() {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::in_memory(&registry);
        let edges = models.get(EntityKind::CropRelationship).unwrap();
        let kept = edges.create(payload(json!({"kind": "companion"}))).await.unwrap();
        let dropped = edges.create(payload(json!({"kind": "competitor"}))).await.unwrap();
        edges.soft_delete(dropped.id).await.unwrap();
        let queries = QueryService::new(registry, models);

        let graph = queries.all_crop_relationships().await.unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph[0].id, kept.id);
        assert!(queries.all_locations().await.unwrap().is_empty());
    }
}
