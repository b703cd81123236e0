//! Data access for the business registry: a generic table repository over a
//! hosted Postgres store, plus the customer, invoice and audit log services
//! built on it.

pub mod config;
pub mod logging;
pub mod models;
pub mod repositories;
pub mod services;
pub mod store;
pub mod utils;

pub use config::{build_store, RegistryConfig, StoreBackend};
pub use repositories::{BaseRepository, SearchFilters, TableRepository};
pub use store::RemoteStore;
pub use utils::errors::{RepositoryError, ServiceError, StoreError};
