//! Value objects returned by authentication flows.

pub mod auth_response;

pub use auth_response::{AuthResponse, UserSummary};
