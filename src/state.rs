//! Process-wide handle shared by every router: registry, per-kind stores and the login collaborator.

use crate::error::AppError;
use crate::registry::{EntityKind, Registry};
use crate::service::{CredentialVerifier, CrudService, QueryService, StoreVerifier, SyncService};
use crate::store::ModelSet;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub models: ModelSet,
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Present when backed by Postgres; closed on shutdown.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Login checks run against the User store of `models`.
    pub fn new(registry: Arc<Registry>, models: ModelSet) -> Result<Self, AppError> {
        let users = models
            .get(EntityKind::User)
            .ok_or_else(|| AppError::Upstream("no store registered for users".into()))?;
        Ok(AppState {
            registry,
            models,
            verifier: Arc::new(StoreVerifier::new(users)),
            pool: None,
        })
    }

    pub fn in_memory() -> Result<Self, AppError> {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::in_memory(&registry);
        AppState::new(registry, models)
    }

    pub fn postgres(pool: PgPool, schema: &str) -> Result<Self, AppError> {
        let registry = Arc::new(Registry::new());
        let models = ModelSet::postgres(&pool, schema, &registry);
        let mut state = AppState::new(registry, models)?;
        state.pool = Some(pool);
        Ok(state)
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn crud(&self, kind: EntityKind) -> Result<CrudService, AppError> {
        let model = self
            .models
            .get(kind)
            .ok_or_else(|| AppError::Upstream(format!("no store registered for {}", kind)))?;
        Ok(CrudService::new(self.registry.get(kind).clone(), model))
    }

    pub fn sync(&self) -> SyncService {
        SyncService::new(self.registry.clone(), self.models.clone())
    }

    pub fn queries(&self) -> QueryService {
        QueryService::new(self.registry.clone(), self.models.clone())
    }

    /// Round-trip every store; used by readiness.
    pub async fn ping(&self) -> Result<(), AppError> {
        for entity in self.registry.entries() {
            if let Some(model) = self.models.get(entity.kind) {
                model.ping().await?;
            }
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("database pool closed");
        }
    }
}
