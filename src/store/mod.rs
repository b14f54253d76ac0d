//! Backing stores for the `Model` contract and the per-kind model set handed to routers.

mod clock;
pub mod memory;
pub mod postgres;

pub use clock::MonotonicClock;
pub use memory::MemoryModel;
pub use postgres::{ensure_database_exists, ensure_tables, PgModel};

use crate::model::Model;
use crate::registry::{EntityKind, Registry};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

/// One `Model` per registered kind.
#[derive(Clone, Default)]
pub struct ModelSet {
    models: HashMap<EntityKind, Arc<dyn Model>>,
}

impl ModelSet {
    pub fn new() -> Self {
        ModelSet::default()
    }

    /// Replace the model backing `kind`.
    pub fn with(mut self, kind: EntityKind, model: Arc<dyn Model>) -> Self {
        self.models.insert(kind, model);
        self
    }

    /// In-process store for every kind, sharing one clock.
    pub fn in_memory(registry: &Registry) -> Self {
        let clock = Arc::new(MonotonicClock::new());
        registry.entries().iter().fold(ModelSet::new(), |set, e| {
            set.with(e.kind, Arc::new(MemoryModel::new(e.kind, clock.clone())))
        })
    }

    pub fn postgres(pool: &PgPool, schema: &str, registry: &Registry) -> Self {
        registry.entries().iter().fold(ModelSet::new(), |set, e| {
            set.with(e.kind, Arc::new(PgModel::new(pool.clone(), schema, e)))
        })
    }

    pub fn get(&self, kind: EntityKind) -> Option<Arc<dyn Model>> {
        self.models.get(&kind).cloned()
    }
}
