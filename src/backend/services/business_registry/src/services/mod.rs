pub mod audit_log_service;
pub mod customer_service;
pub mod invoice_service;

pub use audit_log_service::AuditLogService;
pub use customer_service::CustomerService;
pub use invoice_service::InvoiceService;
