//! One-time password engine
//!
//! Generation, delivery dispatch, and validation of short numeric codes
//! for phone login and phone verification.

mod service;
mod traits;

pub use service::{OtpRequestResult, OtpService, OtpVerification};
pub use traits::SmsServiceTrait;
