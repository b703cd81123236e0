//! Audit trail entries. The API shape is camelCase; the `audit_logs` table
//! uses snake_case columns, so both storage hooks are overridden.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, FromStorageFormat, Id, Identifiable, Record, ToStorageFormat};

pub const AUDIT_LOG_TABLE: &str = "audit_logs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub user_email: String,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Post,
    Put,
    Patch,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Post => "POST",
            AuditAction::Put => "PUT",
            AuditAction::Patch => "PATCH",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// What a caller records; id and timestamp are assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub user_email: String,
    pub action: AuditAction,
    pub function_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditLogFilters {
    pub user_email: Option<String>,
    pub action: Option<AuditAction>,
    pub function_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u64>,
}

/// Fixed-width UTC form so stored timestamps also sort correctly as text.
pub fn storage_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Row layout of the `audit_logs` table.
#[derive(Serialize, Deserialize)]
struct AuditLogRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<Id>,
    user_email: String,
    timestamp: String,
    action: AuditAction,
    function_name: String,
    #[serde(default)]
    target_user_email: Option<String>,
}

impl Identifiable for AuditLog {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ToStorageFormat for AuditLog {
    fn to_storage_format(&self) -> Result<Record, serde_json::Error> {
        shared_models::into_record(&AuditLogRow {
            id: self.id.clone(),
            user_email: self.user_email.clone(),
            timestamp: storage_timestamp(&self.timestamp),
            action: self.action,
            function_name: self.function_name.clone(),
            target_user_email: self.target_user_email.clone(),
        })
    }
}

impl FromStorageFormat for AuditLog {
    fn from_storage_format(record: Record) -> Result<Self, serde_json::Error> {
        let row: AuditLogRow = serde_json::from_value(serde_json::Value::Object(record))?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| {
                <serde_json::Error as serde::de::Error>::custom(format!("invalid timestamp: {e}"))
            })?
            .with_timezone(&Utc);
        Ok(AuditLog {
            id: row.id,
            user_email: row.user_email,
            timestamp,
            action: row.action,
            function_name: row.function_name,
            target_user_email: row.target_user_email,
        })
    }
}

impl Entity for AuditLog {
    type Patch = Record;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn sample() -> AuditLog {
        AuditLog {
            id: Some("log-1".into()),
            user_email: "admin@example.com".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            action: AuditAction::Delete,
            function_name: "deleteCustomer".into(),
            target_user_email: Some("client@example.com".into()),
        }
    }

    #[test]
    fn storage_format_uses_snake_case_columns() {
        let record = sample().to_storage_format().unwrap();
        assert_eq!(
            Value::Object(record),
            json!({
                "id": "log-1",
                "user_email": "admin@example.com",
                "timestamp": "2024-05-01T09:30:00.000000Z",
                "action": "DELETE",
                "function_name": "deleteCustomer",
                "target_user_email": "client@example.com"
            })
        );
    }

    #[test]
    fn api_shape_is_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["userEmail"], json!("admin@example.com"));
        assert_eq!(value["functionName"], json!("deleteCustomer"));
    }

    #[test]
    fn reads_rows_with_any_offset() {
        let row = json!({
            "id": "log-2",
            "user_email": "admin@example.com",
            "timestamp": "2024-05-01T12:30:00+03:00",
            "action": "POST",
            "function_name": "postCustomer",
            "target_user_email": null
        });
        let Value::Object(record) = row else { unreachable!() };
        let log = AuditLog::from_storage_format(record).unwrap();
        assert_eq!(log.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
        assert_eq!(log.action, AuditAction::Post);
        assert_eq!(log.target_user_email, None);
    }
}
