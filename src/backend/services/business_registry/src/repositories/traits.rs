use async_trait::async_trait;
use serde_json::Value;

use crate::models::Entity;
use crate::repositories::filters::SearchFilters;
use crate::store::Criteria;
use crate::utils::errors::RepositoryResult as Result;

/// Uniform operations over one table of `T`.
///
/// "Nothing matched" is an error only for point lookups and updates
/// (`get_by_id`, `patch`); listing operations return an empty vec and
/// `delete` of a missing id succeeds.
#[async_trait]
pub trait BaseRepository<T: Entity>: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<T>;
    async fn get_all(&self) -> Result<Vec<T>>;
    /// Disjunctive search: a row matches if any supplied field matches.
    async fn get_by_filters(&self, filters: &SearchFilters) -> Result<Vec<T>>;
    /// Rows whose `field` equals `value` exactly.
    async fn get_where(&self, field: &str, value: Value) -> Result<Vec<T>>;
    async fn find(&self, criteria: Criteria) -> Result<Vec<T>>;
    async fn post(&self, entity: &T) -> Result<T>;
    async fn patch(&self, changes: &T::Patch, id: &str) -> Result<T>;
    async fn delete(&self, id: &str) -> Result<()>;
}
