//! The remote store contract the repositories are written against, and its
//! backends.

mod memory;
mod postgres;
mod postgrest;
mod query;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore, PostgresConfig};
pub use postgrest::{PostgrestConfig, PostgrestStore};
pub use query::{Condition, Criteria, Direction, Order, Query};

use async_trait::async_trait;
use shared_models::Record;

use crate::utils::errors::StoreError;

/// Query-builder style access to a hosted table store.
///
/// Writes return the rows as the store echoes them back after the write, so
/// server-side defaults are visible to the caller. `update` and `delete` only
/// honour the query's conditions; ordering and windowing apply to `select`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError>;
    async fn insert(&self, table: &str, row: Record) -> Result<Vec<Record>, StoreError>;
    async fn update(&self, query: &Query, changes: Record) -> Result<Vec<Record>, StoreError>;
    /// Returns the number of rows removed.
    async fn delete(&self, query: &Query) -> Result<u64, StoreError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Accepts plain SQL identifiers only: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn validate_identifier(name: &str) -> Result<&str, StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

pub(crate) fn validate_query(query: &Query) -> Result<(), StoreError> {
    validate_identifier(&query.table)?;
    for column in query.criteria.columns() {
        validate_identifier(column)?;
    }
    Ok(())
}

pub(crate) fn validate_row(table: &str, row: &Record) -> Result<(), StoreError> {
    validate_identifier(table)?;
    for column in row.keys() {
        validate_identifier(column)?;
    }
    Ok(())
}

/// Escapes `LIKE` wildcards so the pattern matches literally.
pub(crate) fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
