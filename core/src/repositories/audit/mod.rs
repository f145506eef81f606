pub mod r#trait {
    pub use super::trait_::*;
}
#[path = "trait.rs"]
mod trait_;
pub mod mock;
pub mod noop;

pub use mock::MockAuditRepository;
pub use noop::NoOpAuditRepository;
pub use r#trait::AuditRepository;
