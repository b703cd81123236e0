use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::invoice::{
    Invoice, InvoiceItem, InvoicePatch, INVOICE_ITEM_TABLE, INVOICE_TABLE,
};
use crate::models::Identifiable;
use crate::repositories::{BaseRepository, TableRepository};
use crate::store::RemoteStore;
use crate::utils::errors::{Result, ServiceError};

pub struct InvoiceService {
    invoices: Arc<dyn BaseRepository<Invoice>>,
    items: Arc<dyn BaseRepository<InvoiceItem>>,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn BaseRepository<Invoice>>,
        items: Arc<dyn BaseRepository<InvoiceItem>>,
    ) -> Self {
        Self { invoices, items }
    }

    pub fn with_store(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(
            Arc::new(TableRepository::<Invoice>::new(Arc::clone(&store), INVOICE_TABLE)),
            Arc::new(TableRepository::<InvoiceItem>::new(store, INVOICE_ITEM_TABLE)),
        )
    }

    pub async fn create_invoice(&self, invoice: Invoice) -> Result<Invoice> {
        if invoice.invoice_number.trim().is_empty() {
            return Err(ServiceError::ValidationError("invoice number is empty".into()));
        }
        if invoice.due_date < invoice.issue_date {
            return Err(ServiceError::ValidationError(format!(
                "due date {} is before issue date {}",
                invoice.due_date, invoice.issue_date
            )));
        }
        if invoice.subtotal < 0.0 || invoice.tax_total < 0.0 {
            return Err(ServiceError::ValidationError("invoice amounts are negative".into()));
        }
        let created = self.invoices.post(&invoice).await?;
        info!(id = ?created.id(), number = %created.invoice_number, "invoice created");
        Ok(created)
    }

    pub async fn get_all_invoices(&self) -> Result<Vec<Invoice>> {
        Ok(self.invoices.get_all().await?)
    }

    pub async fn get_invoice_by_id(&self, id: &str) -> Result<Invoice> {
        Ok(self.invoices.get_by_id(id).await?)
    }

    pub async fn update_invoice(&self, changes: InvoicePatch, id: &str) -> Result<Invoice> {
        Ok(self.invoices.patch(&changes, id).await?)
    }

    /// Removes every invoice carrying `number`. Returns `false` when there
    /// was none.
    pub async fn delete_invoice_by_number(&self, number: &str) -> Result<bool> {
        let matches = self
            .invoices
            .get_where("invoice_number", json!(number))
            .await?;
        if matches.is_empty() {
            return Ok(false);
        }
        for invoice in &matches {
            match invoice.id() {
                Some(id) => self.invoices.delete(id).await?,
                None => warn!(number, "invoice row without id, skipped"),
            }
        }
        info!(number, count = matches.len(), "invoice deleted");
        Ok(true)
    }

    /// Adds a line to an existing invoice.
    pub async fn create_invoice_item(&self, item: InvoiceItem) -> Result<InvoiceItem> {
        if item.quantity <= 0.0 {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be positive, got {}",
                item.quantity
            )));
        }
        self.invoices.get_by_id(&item.invoice_id).await?;
        Ok(self.items.post(&item).await?)
    }

    pub async fn get_invoice_items(&self, invoice_id: &str) -> Result<Vec<InvoiceItem>> {
        Ok(self.items.get_where("invoice_id", json!(invoice_id)).await?)
    }
}
