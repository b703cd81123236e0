//! Types shared between the registry services and the command-line tooling.

use serde::{de::DeserializeOwned, ser::Error as _, Serialize};
use serde_json::{Map, Value};

/// Primary key of a stored entity. Tables use text or UUID keys.
pub type Id = String;

/// A schema-less row: column name to JSON value.
pub type Record = Map<String, Value>;

// Common shared types and traits
pub trait Identifiable {
    /// `None` until the store has assigned a key.
    fn id(&self) -> Option<&str>;
}

/// Conversion applied to an entity right before it is written.
///
/// The provided method writes the serde representation unchanged; entities
/// whose columns differ from their API shape override it.
pub trait ToStorageFormat: Serialize {
    fn to_storage_format(&self) -> Result<Record, serde_json::Error> {
        into_record(self)
    }
}

/// Inverse of [`ToStorageFormat`], applied to every row read back from a store.
pub trait FromStorageFormat: DeserializeOwned {
    fn from_storage_format(record: Record) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(record))
    }
}

/// Serializes `value` and requires the result to be a JSON object.
pub fn into_record<T: Serialize + ?Sized>(value: &T) -> Result<Record, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(serde_json::Error::custom(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Short name of a JSON value's type, used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Identifiable for Record {
    fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
    }
}

impl ToStorageFormat for Record {}

impl FromStorageFormat for Record {}
