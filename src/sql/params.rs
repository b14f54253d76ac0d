//! Typed values bound to document-table statements.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum SqlParam {
    Uuid(Uuid),
    Json(Value),
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlParam {
    /// Bind onto a sqlx query in positional order.
    pub fn bind_to<'q, O>(
        self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            SqlParam::Uuid(u) => query.bind(u),
            SqlParam::Json(v) => query.bind(sqlx::types::Json(v)),
            SqlParam::Text(s) => query.bind(s),
            SqlParam::Timestamp(t) => query.bind(t),
        }
    }
}
