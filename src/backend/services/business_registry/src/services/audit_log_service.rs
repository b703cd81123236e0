use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::audit_log::{
    storage_timestamp, AuditLog, AuditLogEntry, AuditLogFilters, AUDIT_LOG_TABLE,
};
use crate::repositories::{BaseRepository, TableRepository};
use crate::store::{Criteria, Direction, RemoteStore};
use crate::utils::errors::Result;

pub struct AuditLogService {
    logs: Arc<dyn BaseRepository<AuditLog>>,
}

impl AuditLogService {
    pub fn new(logs: Arc<dyn BaseRepository<AuditLog>>) -> Self {
        Self { logs }
    }

    pub fn with_store(store: Arc<dyn RemoteStore>) -> Self {
        Self::new(Arc::new(TableRepository::<AuditLog>::new(store, AUDIT_LOG_TABLE)))
    }

    pub async fn create_audit_log(&self, entry: AuditLogEntry) -> Result<AuditLog> {
        let log = AuditLog {
            id: Some(Uuid::new_v4().to_string()),
            user_email: entry.user_email,
            timestamp: Utc::now(),
            action: entry.action,
            function_name: entry.function_name,
            target_user_email: entry.target_user_email,
        };
        let saved = self.logs.post(&log).await?;
        info!(
            user = %saved.user_email,
            action = saved.action.as_str(),
            function = %saved.function_name,
            "audit log recorded"
        );
        Ok(saved)
    }

    /// Matching entries, newest first.
    pub async fn get_audit_logs(&self, filters: &AuditLogFilters) -> Result<Vec<AuditLog>> {
        Ok(self.logs.find(criteria_for(filters)).await?)
    }
}

fn criteria_for(filters: &AuditLogFilters) -> Criteria {
    let mut criteria = Criteria::new();
    if let Some(user_email) = &filters.user_email {
        criteria = criteria.eq("user_email", user_email.as_str());
    }
    if let Some(action) = filters.action {
        criteria = criteria.eq("action", action.as_str());
    }
    if let Some(function_name) = &filters.function_name {
        criteria = criteria.eq("function_name", function_name.as_str());
    }
    if let Some(start) = &filters.start_date {
        criteria = criteria.gte("timestamp", storage_timestamp(start));
    }
    if let Some(end) = &filters.end_date {
        criteria = criteria.lte("timestamp", storage_timestamp(end));
    }
    criteria = criteria.order_by("timestamp", Direction::Descending);
    match filters.limit {
        Some(limit) => criteria.limit(limit),
        None => criteria,
    }
}
