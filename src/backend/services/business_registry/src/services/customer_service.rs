use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::models::customer::{
    Customer, CustomerPatch, CustomerStatus, CUSTOMER_TABLE, SEARCHABLE_FIELDS,
};
use crate::models::Identifiable;
use crate::repositories::{BaseRepository, SearchFilters, TableRepository};
use crate::store::RemoteStore;
use crate::utils::errors::{Result, ServiceError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub struct CustomerService {
    customers: Arc<dyn BaseRepository<Customer>>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn BaseRepository<Customer>>) -> Self {
        Self { customers }
    }

    pub fn with_store(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(Arc::new(TableRepository::<Customer>::new(store, CUSTOMER_TABLE)))
    }

    pub async fn get_all_customers(&self) -> Result<Vec<Customer>> {
        Ok(self.customers.get_all().await?)
    }

    pub async fn get_customer_by_id(&self, id: &str) -> Result<Customer> {
        Ok(self.customers.get_by_id(id).await?)
    }

    pub async fn create_customer(&self, customer: Customer) -> Result<Customer> {
        validate(&customer.name, &customer.email)?;
        let created = self.customers.post(&customer).await?;
        info!(id = ?created.id(), "customer created");
        Ok(created)
    }

    pub async fn update_customer(&self, changes: CustomerPatch, id: &str) -> Result<Customer> {
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if matches!(&changes.name, Some(name) if name.trim().is_empty()) {
            return Err(ServiceError::ValidationError("customer name is empty".into()));
        }
        Ok(self.customers.patch(&changes, id).await?)
    }

    pub async fn delete_customer(&self, id: &str) -> Result<()> {
        self.customers.delete(id).await?;
        info!(id, "customer deleted");
        Ok(())
    }

    /// Substring search over name, email, phone and id number. Blank text
    /// lists everyone.
    pub async fn search_by_text(&self, text: &str) -> Result<Vec<Customer>> {
        let text = text.trim();
        if text.is_empty() {
            return self.get_all_customers().await;
        }
        let filters = SEARCHABLE_FIELDS
            .iter()
            .fold(SearchFilters::new(), |filters, field| {
                filters.field(*field, Value::String(text.to_string()))
            });
        Ok(self.customers.get_by_filters(&filters).await?)
    }

    /// One page of customers. A missing or zero page means the first page and
    /// a missing or zero limit means [`DEFAULT_PAGE_SIZE`].
    pub async fn get_customers_by_page(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Vec<Customer>> {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        let filters = SearchFilters::new().paginate(page, limit);
        Ok(self.customers.get_by_filters(&filters).await?)
    }

    pub fn get_all_customer_statuses(&self) -> &'static [CustomerStatus] {
        &CustomerStatus::ALL
    }
}

fn validate(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::ValidationError("customer name is empty".into()));
    }
    validate_email(email)
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ServiceError::ValidationError(format!(
            "invalid email address: {email:?}"
        ))),
    }
}
