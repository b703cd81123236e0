use thiserror::Error;

/// Failures raised by a [`RemoteStore`](crate::store::RemoteStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store responded with {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store returned no row for {operation} on {table}")]
    EmptyResponse {
        table: String,
        operation: &'static str,
    },

    #[error("Malformed row: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures of the generic repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("No record in {table} with id {id}")]
    NotFound { table: String, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Repository(err) => err.is_not_found(),
            ServiceError::ValidationError(_) => false,
        }
    }
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

pub type Result<T> = std::result::Result<T, ServiceError>;
