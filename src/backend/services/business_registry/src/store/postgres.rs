//! Direct Postgres backend.
//!
//! Rows travel as `jsonb`: reads select `to_jsonb(r)` and writes go through
//! `jsonb_populate_record` so the database coerces every column to its
//! declared type. Only columns present in the written record are touched,
//! which leaves column defaults (generated ids, timestamps) to the database.
//! Filter operands are coerced the same way before comparison.

use async_trait::async_trait;
use serde_json::Value;
use shared_models::Record;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use tracing::{debug, info};

use super::{
    escape_like, validate_query, validate_row, Condition, Criteria, Direction, Query, RemoteStore,
};
use crate::utils::errors::StoreError;

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

pub async fn create_pool(config: &PostgresConfig) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(Duration::from_secs(30 * 60)) // 30 minutes
        .idle_timeout(Duration::from_secs(10 * 60)) // 10 minutes
        .connect(&config.connection_string)
        .await
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &PostgresConfig) -> Result<Self, StoreError> {
        let pool = create_pool(config).await?;
        info!(max_connections = config.max_connections, "Postgres pool ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let mut builder = select_sql(query)?;
        debug!(sql = builder.sql(), "select");
        let rows = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn insert(&self, table: &str, row: Record) -> Result<Vec<Record>, StoreError> {
        let mut builder = insert_sql(table, row)?;
        debug!(sql = builder.sql(), "insert");
        let rows = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn update(&self, query: &Query, changes: Record) -> Result<Vec<Record>, StoreError> {
        if changes.is_empty() {
            // UPDATE needs at least one assignment; nothing to change reads the rows back.
            let filter = Query::new(query.table.clone(), query.criteria.filter_only());
            return self.select(&filter).await;
        }
        let mut builder = update_sql(query, changes)?;
        debug!(sql = builder.sql(), "update");
        let rows = builder
            .build_query_scalar::<Json<Record>>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    async fn delete(&self, query: &Query) -> Result<u64, StoreError> {
        let mut builder = delete_sql(query)?;
        debug!(sql = builder.sql(), "delete");
        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn select_sql(query: &Query) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    validate_query(query)?;
    let mut builder = QueryBuilder::new(format!(
        "SELECT to_jsonb(r) AS record FROM \"{}\" AS r",
        query.table
    ));
    push_where(&mut builder, &query.table, &query.criteria);

    if let Some(order) = &query.criteria.order {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        builder.push(format!(
            " ORDER BY r.\"{}\" {} NULLS LAST",
            order.column, direction
        ));
    }
    if let Some(limit) = query.criteria.limit {
        builder.push(" LIMIT ").push_bind(to_i64(limit));
    }
    if query.criteria.offset > 0 {
        builder
            .push(" OFFSET ")
            .push_bind(to_i64(query.criteria.offset));
    }
    Ok(builder)
}

fn insert_sql(table: &str, row: Record) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    validate_row(table, &row)?;
    let mut builder = QueryBuilder::new(format!("INSERT INTO \"{table}\" AS r"));
    if row.is_empty() {
        builder.push(" DEFAULT VALUES");
    } else {
        let columns = column_list(&row);
        builder.push(format!(
            " ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::\"{table}\", "
        ));
        builder.push_bind(Json(row)).push(")");
    }
    builder.push(" RETURNING to_jsonb(r) AS record");
    Ok(builder)
}

fn update_sql(query: &Query, changes: Record) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    validate_query(query)?;
    validate_row(&query.table, &changes)?;
    let assignments = changes
        .keys()
        .map(|column| format!("\"{column}\" = p.\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut builder = QueryBuilder::new(format!(
        "UPDATE \"{}\" AS r SET {} FROM jsonb_populate_record(NULL::\"{}\", ",
        query.table, assignments, query.table
    ));
    builder.push_bind(Json(changes)).push(") AS p");
    push_where(&mut builder, &query.table, &query.criteria);
    builder.push(" RETURNING to_jsonb(r) AS record");
    Ok(builder)
}

fn delete_sql(query: &Query) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    validate_query(query)?;
    let mut builder = QueryBuilder::new(format!("DELETE FROM \"{}\" AS r", query.table));
    push_where(&mut builder, &query.table, &query.criteria);
    Ok(builder)
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, table: &str, criteria: &Criteria) {
    for (i, condition) in criteria.conditions.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_condition(builder, table, condition);
    }
}

/// Compares the column itself against an operand coerced to the column's
/// declared type, so comparisons are by value and column indexes apply.
fn push_comparison(
    builder: &mut QueryBuilder<'static, Postgres>,
    table: &str,
    column: &str,
    operator: &str,
    value: &Value,
) {
    let mut operand = Record::new();
    operand.insert(column.to_string(), value.clone());
    builder
        .push(format!(
            "r.\"{column}\" {operator} (jsonb_populate_record(NULL::\"{table}\", "
        ))
        .push_bind(Json(operand))
        .push(format!(")).\"{column}\""));
}

fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, table: &str, condition: &Condition) {
    match condition {
        Condition::Eq(column, Value::Null) => {
            builder.push(format!("r.\"{column}\" IS NULL"));
        }
        Condition::Eq(column, value) => push_comparison(builder, table, column, "=", value),
        Condition::ILike(column, pattern) => {
            builder
                .push(format!("r.\"{column}\"::text ILIKE "))
                .push_bind(format!("%{}%", escape_like(pattern)));
        }
        Condition::Gte(column, value) => push_comparison(builder, table, column, ">=", value),
        Condition::Lte(column, value) => push_comparison(builder, table, column, "<=", value),
        Condition::Or(conditions) if conditions.is_empty() => {
            builder.push("FALSE");
        }
        Condition::Or(conditions) => {
            builder.push("(");
            for (i, condition) in conditions.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_condition(builder, table, condition);
            }
            builder.push(")");
        }
    }
}

fn column_list(row: &Record) -> String {
    row.keys()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
