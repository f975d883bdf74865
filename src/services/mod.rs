pub mod audit_service;
pub mod page_service;

pub use audit_service::AuditService;
pub use page_service::PageService;
