use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, FromStorageFormat, Id, Identifiable, ToStorageFormat};

pub const CUSTOMER_TABLE: &str = "customer";

/// Columns covered by free-text customer search.
pub const SEARCHABLE_FIELDS: [&str; 4] = ["name", "email", "phone", "id_number"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default)]
    pub status: CustomerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    #[default]
    Active,
    NoticeGiven,
    ExitNotice,
    Pending,
    Created,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 5] = [
        CustomerStatus::Active,
        CustomerStatus::NoticeGiven,
        CustomerStatus::ExitNotice,
        CustomerStatus::Pending,
        CustomerStatus::Created,
    ];
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            phone: None,
            id_number: None,
            business_name: None,
            status: CustomerStatus::default(),
            notes: None,
            created_at: None,
        }
    }
}

/// Fields a customer update may touch. `None` leaves the column as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Identifiable for Customer {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ToStorageFormat for Customer {}

impl FromStorageFormat for Customer {}

impl ToStorageFormat for CustomerPatch {}

impl Entity for Customer {
    type Patch = CustomerPatch;
}
