//! Link-token engine
//!
//! Mints and redeems the single-use tokens binding a web account to a
//! Telegram identity, in either direction.

mod service;

pub use service::{IssuedLinkToken, LinkTokenService};
