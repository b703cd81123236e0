pub mod audit_log;
pub mod customer;
pub mod invoice;

pub use shared_models::{json_kind, FromStorageFormat, Id, Identifiable, Record, ToStorageFormat};

/// A type a [`TableRepository`](crate::repositories::TableRepository) can
/// read and write.
pub trait Entity: ToStorageFormat + FromStorageFormat + Identifiable + Send + Sync + 'static {
    /// Partial form accepted by `patch`; only the fields it serializes are written.
    type Patch: ToStorageFormat + Send + Sync + 'static;
}

/// Schema-less rows, used by the CLI and by tables without a typed model.
impl Entity for Record {
    type Patch = Record;
}
