//! Audit sink for authentication events

mod service;

pub use service::{hash_identifier, AuditService, AuditServiceConfig};
