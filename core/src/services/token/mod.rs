//! Session token issuance and validation
//!
//! All JWT handling converges here: the codec trait is the only seam
//! that touches a signing library, and every login method issues tokens
//! through the same service so claims stay canonical.

mod codec;
mod service;

pub use codec::{JwtCodec, TokenCodec, WireClaims};
pub use service::{TokenService, TokenSubject, ValidatedToken};
