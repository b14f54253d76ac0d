//! Cross-collection change feed: everything changed after a checkpoint, for every registered kind.

use crate::error::AppError;
use crate::model::Document;
use crate::registry::Registry;
use crate::store::ModelSet;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Body of `POST /api/get-updates`. A per-kind cursor overrides the global one; a missing
/// cursor means "from the beginning".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncRequest {
    #[serde(default)]
    pub checkpoint: Option<DateTime<Utc>>,
    #[serde(default)]
    pub checkpoints: HashMap<String, DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SyncResponse {
    /// Greatest `updatedAt` returned, or the request's checkpoint when nothing changed.
    ///
    /// Kinds are read by separate queries, so a write to one kind that lands while another
    /// kind's newer change is being read can sit below this value and be skipped on resume.
    /// Clients that need every change should resume with `checkpoints` instead.
    pub checkpoint: Option<DateTime<Utc>>,
    /// Per-kind cursor: the kind's newest `updatedAt` returned, else the cursor it was read from.
    pub checkpoints: BTreeMap<String, Option<DateTime<Utc>>>,
    /// Changed documents per kind, oldest to newest, soft-deleted ones included.
    pub updates: BTreeMap<String, Vec<Document>>,
}

impl SyncResponse {
    pub fn total(&self) -> usize {
        self.updates.values().map(Vec::len).sum()
    }
}

#[derive(Clone)]
pub struct SyncService {
    registry: Arc<Registry>,
    models: ModelSet,
}

impl SyncService {
    pub fn new(registry: Arc<Registry>, models: ModelSet) -> Self {
        SyncService { registry, models }
    }

    /// One query per kind, run concurrently. Any failing kind fails the whole call.
    pub async fn changes_since(&self, req: SyncRequest) -> Result<SyncResponse, AppError> {
        if let Some(unknown) = req.checkpoints.keys().find(|k| self.registry.by_path(k).is_none()) {
            return Err(AppError::Validation(format!("unknown collection in checkpoints: {}", unknown)));
        }

        let mut queries = Vec::with_capacity(self.registry.entries().len());
        for entity in self.registry.entries() {
            let model = self
                .models
                .get(entity.kind)
                .ok_or_else(|| AppError::Upstream(format!("no store registered for {}", entity.kind)))?;
            let cursor = req.checkpoints.get(entity.path_segment).copied().or(req.checkpoint);
            queries.push(async move {
                let docs = model.find_changed_since(cursor).await?;
                Ok::<_, AppError>((entity, cursor, docs))
            });
        }
        let results = try_join_all(queries).await?;

        let mut response = SyncResponse {
            checkpoint: req.checkpoint,
            checkpoints: BTreeMap::new(),
            updates: BTreeMap::new(),
        };
        for (entity, cursor, mut docs) in results {
            docs.sort_by_key(|d| d.updated_at);
            let newest = docs.iter().map(|d| d.updated_at).max();
            if let Some(t) = newest {
                response.checkpoint = Some(response.checkpoint.map_or(t, |c| c.max(t)));
            }
            response
                .checkpoints
                .insert(entity.path_segment.to_string(), newest.or(cursor));
            let docs = docs
                .into_iter()
                .map(|d| d.without_fields(entity.sensitive_fields))
                .collect();
            response.updates.insert(entity.path_segment.to_string(), docs);
        }
        tracing::info!(
            since = ?req.checkpoint,
            changed = response.total(),
            checkpoint = ?response.checkpoint,
            "sync computed"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Model, Payload};
    use crate::registry::EntityKind;
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    struct BrokenModel;

    #[async_trait]
    impl Model for BrokenModel {
        async fn create(&self, _: Payload) -> Result<Document, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn get(&self, _: Uuid) -> Result<Option<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn update(&self, _: Uuid, _: Payload) -> Result<Option<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn soft_delete(&self, _: Uuid) -> Result<Option<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn find_changed_since(&self, _: Option<DateTime<Utc>>) -> Result<Vec<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn list_live(&self) -> Result<Vec<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn search(&self, _: &str, _: &str) -> Result<Vec<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
        async fn find_by(&self, _: &str, _: &str) -> Result<Vec<Document>, AppError> {
            Err(AppError::Upstream("down".into()))
        }
    }

    fn payload(v: serde_json::Value) -> Payload {
        v.as_object().cloned().unwrap_or_default()
    }

    fn setup() -> (SyncService, ModelSet) {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::in_memory(&registry);
        (SyncService::new(registry, models.clone()), models)
    }

    #[tokio::test]
    async fn empty_store_keeps_checkpoint_and_lists_every_kind() {
        let (sync, _) = setup();
        let t0 = Utc::now();
        let res = sync
            .changes_since(SyncRequest {
                checkpoint: Some(t0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(res.checkpoint, Some(t0));
        assert_eq!(res.updates.len(), 5);
        assert!(res.updates.values().all(Vec::is_empty));
        assert_eq!(res.checkpoints["users"], Some(t0));
    }

    #[tokio::test]
    async fn returned_checkpoint_is_the_newest_change() {
        let (sync, models) = setup();
        let crops = models.get(EntityKind::Crop).unwrap();
        let tags = models.get(EntityKind::CropTag).unwrap();
        let a = crops.create(payload(json!({"commonName": "Tomato"}))).await.unwrap();
        let b = tags.create(payload(json!({"name": "annual"}))).await.unwrap();

        let first = sync.changes_since(SyncRequest::default()).await.unwrap();
        assert_eq!(first.total(), 2);
        assert_eq!(first.checkpoint, Some(b.updated_at));
        assert_eq!(first.checkpoints["crops"], Some(a.updated_at));
        assert_eq!(first.checkpoints["locations"], None);

        let again = sync
            .changes_since(SyncRequest {
                checkpoint: first.checkpoint,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(again.total(), 0);
        assert_eq!(again.checkpoint, first.checkpoint);
    }

    #[tokio::test]
    async fn per_kind_cursor_overrides_global() {
        let (sync, models) = setup();
        let crops = models.get(EntityKind::Crop).unwrap();
        let tomato = crops.create(payload(json!({"commonName": "Tomato"}))).await.unwrap();
        let bean = crops.create(payload(json!({"commonName": "Bean"}))).await.unwrap();

        let res = sync
            .changes_since(SyncRequest {
                checkpoint: Some(bean.updated_at),
                checkpoints: HashMap::from([("crops".to_string(), tomato.updated_at)]),
            })
            .await
            .unwrap();
        assert_eq!(res.updates["crops"].len(), 1);
        assert_eq!(res.updates["crops"][0].id, bean.id);
    }

    #[tokio::test]
    async fn resuming_from_per_kind_cursors_sees_every_later_change() {
        let (sync, models) = setup();
        let crops = models.get(EntityKind::Crop).unwrap();
        let tags = models.get(EntityKind::CropTag).unwrap();
        crops.create(payload(json!({"commonName": "Tomato"}))).await.unwrap();
        tags.create(payload(json!({"name": "annual"}))).await.unwrap();

        let first = sync.changes_since(SyncRequest::default()).await.unwrap();
        let bean = crops.create(payload(json!({"commonName": "Bean"}))).await.unwrap();

        let cursors = first
            .checkpoints
            .iter()
            .filter_map(|(k, v)| v.map(|t| (k.clone(), t)))
            .collect();
        let next = sync
            .changes_since(SyncRequest {
                checkpoint: None,
                checkpoints: cursors,
            })
            .await
            .unwrap();
        assert_eq!(next.total(), 1);
        assert_eq!(next.updates["crops"][0].id, bean.id);
        assert_eq!(next.checkpoints["crops"], Some(bean.updated_at));
        assert_eq!(next.checkpoints["crop-tags"], first.checkpoints["crop-tags"]);
    }

    #[tokio::test]
    async fn unknown_collection_is_rejected() {
        let (sync, _) = setup();
        let err = sync
            .changes_since(SyncRequest {
                checkpoint: None,
                checkpoints: HashMap::from([("plants".to_string(), Utc::now())]),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn one_failing_kind_fails_the_whole_call() {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::in_memory(&registry).with(EntityKind::Location, Arc::new(BrokenModel));
        let sync = SyncService::new(registry, models);
        let err = sync.changes_since(SyncRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn users_sync_without_credentials() {
        let (sync, models) = setup();
        let users = models.get(EntityKind::User).unwrap();
        users
            .create(payload(json!({"username": "ada", "passwordHash": "h", "passwordSalt": "s"})))
            .await
            .unwrap();
        let res = sync.changes_since(SyncRequest::default()).await.unwrap();
        let user = &res.updates["users"][0];
        assert!(user.payload.get("passwordHash").is_none());
        assert!(user.payload.get("passwordSalt").is_none());
    }
}
