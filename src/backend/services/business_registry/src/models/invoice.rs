use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Entity, FromStorageFormat, Id, Identifiable, Record, ToStorageFormat};

pub const INVOICE_TABLE: &str = "invoice";
pub const INVOICE_ITEM_TABLE: &str = "invoice_item";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub invoice_number: String,
    pub customer_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Paid,
    Overdue,
    Cancelled,
}

impl Invoice {
    pub fn total(&self) -> f64 {
        self.subtotal + self.tax_total
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One billed line. `total_price` is derived from quantity and unit price
/// whenever the item is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    pub invoice_id: Id,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,
}

impl InvoiceItem {
    pub fn new(
        invoice_id: impl Into<Id>,
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
    ) -> Self {
        Self {
            id: None,
            invoice_id: invoice_id.into(),
            description: description.into(),
            quantity,
            unit_price,
            total_price: quantity * unit_price,
        }
    }
}

impl Identifiable for Invoice {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ToStorageFormat for Invoice {}

impl FromStorageFormat for Invoice {}

impl ToStorageFormat for InvoicePatch {}

impl Entity for Invoice {
    type Patch = InvoicePatch;
}

impl Identifiable for InvoiceItem {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ToStorageFormat for InvoiceItem {
    fn to_storage_format(&self) -> Result<Record, serde_json::Error> {
        let mut record = shared_models::into_record(self)?;
        record.insert("total_price".into(), json!(self.quantity * self.unit_price));
        Ok(record)
    }
}

impl FromStorageFormat for InvoiceItem {}

impl Entity for InvoiceItem {
    type Patch = Record;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn item_storage_format_recomputes_total() {
        let mut item = InvoiceItem::new("inv-1", "Desk rental", 3.0, 120.5);
        item.total_price = 0.0;
        let record = item.to_storage_format().unwrap();
        assert_eq!(record["total_price"], json!(361.5));
        assert_eq!(record["invoice_id"], json!("inv-1"));
        assert!(!record.contains_key("id"));
    }

    #[test]
    fn invoice_reads_back_from_store_row() {
        let row = json!({
            "id": "9b2c",
            "invoice_number": "2024-001",
            "customer_id": "c-1",
            "status": "ISSUED",
            "issue_date": "2024-03-01",
            "due_date": "2024-03-31",
            "subtotal": 100,
            "tax_total": 17,
            "created_at": "2024-03-01T08:00:00+00:00"
        });
        let Value::Object(record) = row else { unreachable!() };
        let invoice = Invoice::from_storage_format(record).unwrap();
        assert_eq!(invoice.id(), Some("9b2c"));
        assert_eq!(invoice.status, InvoiceStatus::Issued);
        assert_eq!(invoice.total(), 117.0);
    }
}
