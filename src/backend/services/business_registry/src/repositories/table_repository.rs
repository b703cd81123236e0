//! The generic repository: one entity type bound to one table of a
//! [`RemoteStore`].

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::models::{Entity, Record, ToStorageFormat};
use crate::repositories::{filters::SearchFilters, traits::BaseRepository};
use crate::store::{Criteria, Query, RemoteStore};
use crate::utils::errors::{RepositoryError, RepositoryResult as Result, StoreError};

pub struct TableRepository<T> {
    store: Arc<dyn RemoteStore>,
    table: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for TableRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            table: self.table.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for TableRepository<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRepository")
            .field("table", &self.table)
            .field("backend", &self.store.backend())
            .finish()
    }
}

impl<T: Entity> TableRepository<T> {
    pub fn new(store: Arc<dyn RemoteStore>, table: impl Into<String>) -> Self {
        let table = table.into();
        info!(table = %table, backend = store.backend(), "repository bound");
        Self {
            store,
            table,
            _entity: PhantomData,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn query(&self, criteria: Criteria) -> Query {
        Query::new(self.table.clone(), criteria)
    }

    fn by_id(&self, id: &str) -> Query {
        self.query(Criteria::new().eq("id", id))
    }

    fn not_found(&self, id: &str) -> RepositoryError {
        RepositoryError::NotFound {
            table: self.table.clone(),
            id: id.to_string(),
        }
    }

    fn decode(rows: Vec<Record>) -> Result<Vec<T>> {
        rows.into_iter()
            .map(|row| T::from_storage_format(row).map_err(RepositoryError::from))
            .collect()
    }

    async fn select(&self, criteria: Criteria) -> Result<Vec<T>> {
        let rows = self
            .store
            .select(&self.query(criteria))
            .await
            .map_err(|e| self.failed("select", e))?;
        debug!(table = %self.table, rows = rows.len(), "select");
        Self::decode(rows)
    }

    fn failed(&self, operation: &str, err: StoreError) -> RepositoryError {
        error!(table = %self.table, operation, error = %err, "store call failed");
        RepositoryError::Store(err)
    }
}

#[async_trait]
impl<T: Entity> BaseRepository<T> for TableRepository<T> {
    async fn get_by_id(&self, id: &str) -> Result<T> {
        let rows = self
            .store
            .select(&self.by_id(id))
            .await
            .map_err(|e| self.failed("get_by_id", e))?;
        let row = rows.into_iter().next().ok_or_else(|| self.not_found(id))?;
        Ok(T::from_storage_format(row)?)
    }

    async fn get_all(&self) -> Result<Vec<T>> {
        let all = self.select(Criteria::new()).await?;
        if all.is_empty() {
            info!(table = %self.table, "table is empty");
        }
        Ok(all)
    }

    async fn get_by_filters(&self, filters: &SearchFilters) -> Result<Vec<T>> {
        self.select(filters.to_criteria()).await
    }

    async fn get_where(&self, field: &str, value: Value) -> Result<Vec<T>> {
        self.select(Criteria::new().eq(field, value)).await
    }

    async fn find(&self, criteria: Criteria) -> Result<Vec<T>> {
        self.select(criteria).await
    }

    async fn post(&self, entity: &T) -> Result<T> {
        let row = entity.to_storage_format()?;
        let echoed = self
            .store
            .insert(&self.table, row)
            .await
            .map_err(|e| self.failed("post", e))?;
        let row = echoed.into_iter().next().ok_or_else(|| {
            self.failed(
                "post",
                StoreError::EmptyResponse {
                    table: self.table.clone(),
                    operation: "insert",
                },
            )
        })?;
        let saved = T::from_storage_format(row)?;
        debug!(table = %self.table, id = ?saved.id(), "inserted");
        Ok(saved)
    }

    async fn patch(&self, changes: &T::Patch, id: &str) -> Result<T> {
        let row = changes.to_storage_format()?;
        if row.is_empty() {
            return self.get_by_id(id).await;
        }
        let updated = self
            .store
            .update(&self.by_id(id), row)
            .await
            .map_err(|e| self.failed("patch", e))?;
        let row = updated.into_iter().next().ok_or_else(|| self.not_found(id))?;
        debug!(table = %self.table, id, "updated");
        Ok(T::from_storage_format(row)?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let removed = self
            .store
            .delete(&self.by_id(id))
            .await
            .map_err(|e| self.failed("delete", e))?;
        debug!(table = %self.table, id, removed, "deleted");
        Ok(())
    }
}
