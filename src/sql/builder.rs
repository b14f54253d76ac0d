//! Builds parameterized statements against a document table.
//! Identifiers come from the registry only; values are always bound parameters.

use crate::sql::SqlParam;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const COLUMNS: &str = "id, payload, updated_at, deleted_at";

/// Next timestamp for a row: wall time, but always strictly after the stored value.
/// `statement_timestamp()` is stable within one statement, so updated_at and deleted_at agree.
const BUMP: &str = "GREATEST(statement_timestamp(), updated_at + interval '1 microsecond')";

/// Quote identifier for PostgreSQL (safe: only from the registry and validated settings).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new(sql: String) -> Self {
        QueryBuf { sql, params: Vec::new() }
    }

    fn bind(mut self, p: SqlParam) -> Self {
        self.params.push(p);
        self
    }
}

/// Escape LIKE metacharacters and wrap in `%...%` for a substring match.
pub fn like_pattern(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Idempotent DDL for the schema and one document table.
pub fn create_table(schema: &str, table: &str) -> Vec<String> {
    let q_table = qualified_table(schema, table);
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                payload JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT statement_timestamp(),
                deleted_at TIMESTAMPTZ
            )
            "#,
            q_table
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (updated_at)",
            quoted(&format!("{}_updated_at_idx", table)),
            q_table
        ),
    ]
}

pub fn insert(schema: &str, table: &str, id: Uuid, payload: serde_json::Value) -> QueryBuf {
    QueryBuf::new(format!(
        "INSERT INTO {} (id, payload, updated_at) VALUES ($1, $2, statement_timestamp()) RETURNING {}",
        qualified_table(schema, table),
        COLUMNS
    ))
    .bind(SqlParam::Uuid(id))
    .bind(SqlParam::Json(payload))
}

/// SELECT one live row by id.
pub fn select_live_by_id(schema: &str, table: &str, id: Uuid) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE id = $1 AND deleted_at IS NULL",
        COLUMNS,
        qualified_table(schema, table)
    ))
    .bind(SqlParam::Uuid(id))
}

/// Shallow merge (`||`) of the payload into a live row.
pub fn update(schema: &str, table: &str, id: Uuid, payload: serde_json::Value) -> QueryBuf {
    QueryBuf::new(format!(
        "UPDATE {} SET payload = payload || $2, updated_at = {} WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
        qualified_table(schema, table),
        BUMP,
        COLUMNS
    ))
    .bind(SqlParam::Uuid(id))
    .bind(SqlParam::Json(payload))
}

pub fn soft_delete(schema: &str, table: &str, id: Uuid) -> QueryBuf {
    QueryBuf::new(format!(
        "UPDATE {} SET updated_at = {bump}, deleted_at = {bump} WHERE id = $1 AND deleted_at IS NULL RETURNING {}",
        qualified_table(schema, table),
        COLUMNS,
        bump = BUMP
    ))
    .bind(SqlParam::Uuid(id))
}

/// Rows (live or not) changed strictly after `since`; all rows when `since` is None.
pub fn select_changed_since(schema: &str, table: &str, since: Option<DateTime<Utc>>) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE ($1::timestamptz IS NULL OR updated_at > $1) ORDER BY updated_at, id",
        COLUMNS,
        qualified_table(schema, table)
    ))
    .bind(SqlParam::Timestamp(since))
}

pub fn select_live(schema: &str, table: &str) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY updated_at, id",
        COLUMNS,
        qualified_table(schema, table)
    ))
}

/// Case-insensitive substring match on a top-level payload string field.
pub fn select_live_matching(schema: &str, table: &str, field: &str, fragment: &str) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL AND payload->>$1 ILIKE $2 ESCAPE '\\' ORDER BY updated_at, id",
        COLUMNS,
        qualified_table(schema, table)
    ))
    .bind(SqlParam::Text(field.to_string()))
    .bind(SqlParam::Text(like_pattern(fragment)))
}

pub fn select_live_by_field(schema: &str, table: &str, field: &str, value: &str) -> QueryBuf {
    QueryBuf::new(format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL AND payload->>$1 = $2 ORDER BY updated_at, id",
        COLUMNS,
        qualified_table(schema, table)
    ))
    .bind(SqlParam::Text(field.to_string()))
    .bind(SqlParam::Text(value.to_string()))
}
