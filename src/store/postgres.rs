//! PostgreSQL-backed document store: one JSONB table per kind.

use crate::error::AppError;
use crate::model::{Document, Model, Payload};
use crate::registry::{EntityDescriptor, Registry};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

type DocumentRow = (Uuid, sqlx::types::Json<Value>, DateTime<Utc>, Option<DateTime<Utc>>);

pub struct PgModel {
    pool: PgPool,
    schema: String,
    table: &'static str,
}

impl PgModel {
    pub fn new(pool: PgPool, schema: impl Into<String>, entity: &EntityDescriptor) -> Self {
        PgModel {
            pool,
            schema: schema.into(),
            table: entity.table_name,
        }
    }

    async fn fetch_optional(&self, q: QueryBuf) -> Result<Option<Document>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, DocumentRow>(&q.sql);
        for p in q.params {
            query = p.bind_to(query);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.map(row_to_document))
    }

    async fn fetch_all(&self, q: QueryBuf) -> Result<Vec<Document>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, DocumentRow>(&q.sql);
        for p in q.params {
            query = p.bind_to(query);
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(row_to_document).collect())
    }
}

fn row_to_document((id, payload, updated_at, deleted_at): DocumentRow) -> Document {
    let payload = match payload.0 {
        Value::Object(m) => m,
        _ => Payload::new(),
    };
    Document {
        id,
        updated_at,
        deleted_at,
        payload,
    }
}

#[async_trait]
impl Model for PgModel {
    async fn create(&self, payload: Payload) -> Result<Document, AppError> {
        let q = sql::insert(&self.schema, self.table, Uuid::new_v4(), Value::Object(payload));
        self.fetch_optional(q)
            .await?
            .ok_or_else(|| AppError::Upstream(format!("insert into {} returned no row", self.table)))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        self.fetch_optional(sql::select_live_by_id(&self.schema, self.table, id)).await
    }

    async fn update(&self, id: Uuid, payload: Payload) -> Result<Option<Document>, AppError> {
        self.fetch_optional(sql::update(&self.schema, self.table, id, Value::Object(payload)))
            .await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Option<Document>, AppError> {
        self.fetch_optional(sql::soft_delete(&self.schema, self.table, id)).await
    }

    async fn find_changed_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Document>, AppError> {
        self.fetch_all(sql::select_changed_since(&self.schema, self.table, since)).await
    }

    async fn list_live(&self) -> Result<Vec<Document>, AppError> {
        self.fetch_all(sql::select_live(&self.schema, self.table)).await
    }

    async fn search(&self, field: &str, fragment: &str) -> Result<Vec<Document>, AppError> {
        self.fetch_all(sql::select_live_matching(&self.schema, self.table, field, fragment))
            .await
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Vec<Document>, AppError> {
        self.fetch_all(sql::select_live_by_field(&self.schema, self.table, field, value))
            .await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Create the schema and every registered document table if missing.
pub async fn ensure_tables(pool: &PgPool, schema: &str, registry: &Registry) -> Result<(), AppError> {
    for entity in registry.entries() {
        for ddl in sql::create_table(schema, entity.table_name) {
            sqlx::query(&ddl).execute(pool).await?;
        }
    }
    tracing::info!(schema = %schema, tables = registry.entries().len(), "document tables ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::Upstream(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::Upstream("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
