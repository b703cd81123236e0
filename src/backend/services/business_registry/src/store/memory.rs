//! In-process store for tests, benchmarks and local development.
//!
//! Tables are created on first write and keep insertion order, which is the
//! order `select` returns rows in when no ordering is requested. Inserted rows
//! without an `id` get a UUID v4, and duplicate ids are rejected like a
//! primary key would.

use async_trait::async_trait;
use serde_json::Value;
use shared_models::Record;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{validate_query, validate_row, Condition, Criteria, Direction, Query, RemoteStore};
use crate::utils::errors::StoreError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts rows as-is, assigning ids where missing.
    pub async fn seed(&self, table: &str, rows: Vec<Record>) -> Result<(), StoreError> {
        for row in rows {
            self.insert(table, row).await?;
        }
        Ok(())
    }

    /// Number of rows currently in `table`.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        validate_query(query)?;
        let tables = self.tables.read().await;
        let rows = tables.get(&query.table).map(Vec::as_slice).unwrap_or_default();
        Ok(apply(rows, &query.criteria))
    }

    async fn insert(&self, table: &str, mut row: Record) -> Result<Vec<Record>, StoreError> {
        validate_row(table, &row)?;
        let needs_id = match row.get("id") {
            None | Some(Value::Null) => true,
            Some(Value::String(id)) => id.is_empty(),
            Some(_) => false,
        };
        if needs_id {
            row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();
        if rows.iter().any(|existing| existing.get("id") == row.get("id")) {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint \"{table}_pkey\""
            )));
        }
        rows.push(row.clone());
        debug!(table, rows = rows.len(), "memory insert");
        Ok(vec![row])
    }

    async fn update(&self, query: &Query, changes: Record) -> Result<Vec<Record>, StoreError> {
        validate_query(query)?;
        validate_row(&query.table, &changes)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in rows.iter_mut() {
            if matches_all(row, &query.criteria.conditions) {
                for (column, value) in &changes {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<u64, StoreError> {
        validate_query(query)?;
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches_all(row, &query.criteria.conditions));
        Ok((before - rows.len()) as u64)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

fn apply(rows: &[Record], criteria: &Criteria) -> Vec<Record> {
    let mut selected: Vec<&Record> = rows
        .iter()
        .filter(|row| matches_all(row, &criteria.conditions))
        .collect();

    if let Some(order) = &criteria.order {
        selected.sort_by(|a, b| {
            let ordering = match (a.get(&order.column), b.get(&order.column)) {
                (Some(x), Some(y)) if !x.is_null() && !y.is_null() => {
                    compare(x, y).unwrap_or(Ordering::Equal)
                }
                (Some(x), _) if !x.is_null() => return Ordering::Less,
                (_, Some(y)) if !y.is_null() => return Ordering::Greater,
                _ => Ordering::Equal,
            };
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }

    let offset = usize::try_from(criteria.offset).unwrap_or(usize::MAX);
    let limit = criteria
        .limit
        .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
    selected
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect()
}

fn matches_all(row: &Record, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| matches(row, condition))
}

fn matches(row: &Record, condition: &Condition) -> bool {
    match condition {
        Condition::Eq(column, expected) => match row.get(column) {
            None | Some(Value::Null) => expected.is_null(),
            Some(actual) => values_equal(actual, expected),
        },
        Condition::ILike(column, pattern) => row
            .get(column)
            .and_then(text_of)
            .map_or(false, |text| {
                text.to_lowercase().contains(&pattern.to_lowercase())
            }),
        Condition::Gte(column, bound) => row
            .get(column)
            .and_then(|actual| compare(actual, bound))
            .map_or(false, |ordering| ordering != Ordering::Less),
        Condition::Lte(column, bound) => row
            .get(column)
            .and_then(|actual| compare(actual, bound))
            .map_or(false, |ordering| ordering != Ordering::Greater),
        Condition::Or(conditions) => conditions.iter().any(|condition| matches(row, condition)),
    }
}

/// Text form used by substring matching, mirroring a `::text` cast.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        tokio_test::block_on(store.seed(
            "customer",
            vec![
                row(json!({ "id": "1", "name": "John", "age": 40, "city": null })),
                row(json!({ "id": "2", "name": "Amy", "age": 31, "city": "Haifa" })),
                row(json!({ "id": "3", "name": "Jonah", "age": 40.0, "city": "Eilat" })),
            ],
        ))
        .unwrap();
        store
    }

    fn ids(rows: &[Record]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[test]
    fn ilike_is_case_insensitive_substring() {
        let store = seeded();
        let query = Query::new("customer", Criteria::new().ilike("name", "JO"));
        let rows = tokio_test::block_on(store.select(&query)).unwrap();
        assert_eq!(ids(&rows), vec!["1", "3"]);
    }

    #[test]
    fn ilike_matches_numbers_by_text() {
        let store = seeded();
        let query = Query::new("customer", Criteria::new().ilike("age", "3"));
        let rows = tokio_test::block_on(store.select(&query)).unwrap();
        assert_eq!(ids(&rows), vec!["2"]);
    }

    #[test]
    fn numeric_equality_ignores_representation() {
        let store = seeded();
        let query = Query::new("customer", Criteria::new().eq("age", 40));
        let rows = tokio_test::block_on(store.select(&query)).unwrap();
        assert_eq!(ids(&rows), vec!["1", "3"]);
    }

    #[test]
    fn null_equality_matches_null_columns() {
        let store = seeded();
        let query = Query::new("customer", Criteria::new().eq("city", Value::Null));
        let rows = tokio_test::block_on(store.select(&query)).unwrap();
        assert_eq!(ids(&rows), vec!["1"]);
    }

    #[test]
    fn ordering_puts_nulls_last_both_ways() {
        let store = seeded();
        let asc = Query::new("customer", Criteria::new().order_by("city", Direction::Ascending));
        let desc = Query::new("customer", Criteria::new().order_by("city", Direction::Descending));
        let asc = tokio_test::block_on(store.select(&asc)).unwrap();
        let desc = tokio_test::block_on(store.select(&desc)).unwrap();
        assert_eq!(ids(&asc), vec!["3", "2", "1"]);
        assert_eq!(ids(&desc), vec!["2", "3", "1"]);
    }

    #[test]
    fn bounds_compare_within_type() {
        let store = seeded();
        let query = Query::new("customer", Criteria::new().gte("age", 35).lte("age", 40));
        let rows = tokio_test::block_on(store.select(&query)).unwrap();
        assert_eq!(ids(&rows), vec!["1", "3"]);
    }

    #[test]
    fn duplicate_ids_conflict() {
        let store = seeded();
        let err = tokio_test::block_on(store.insert("customer", row(json!({ "id": "2" }))))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn missing_table_reads_empty() {
        let store = MemoryStore::new();
        let rows = tokio_test::block_on(store.select(&Query::table("nothing"))).unwrap();
        assert!(rows.is_empty());
        let removed = tokio_test::block_on(store.delete(&Query::table("nothing"))).unwrap();
        assert_eq!(removed, 0);
    }
}
