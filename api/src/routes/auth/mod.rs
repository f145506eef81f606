//! Authentication route handlers
//!
//! One module per flow; every handler validates its DTO, extracts the
//! client IP for rate limiting, calls the auth service, and funnels any
//! domain error through the shared translation in `handlers::error`.

pub mod login_email;
pub mod login_phone;
pub mod phone_verification;
pub mod session;
pub mod telegram_link;
pub mod telegram_login;
pub mod unlink;

use actix_web::HttpRequest;

/// Extract the client IP address from the request
///
/// Honors reverse-proxy headers before falling back to the peer
/// address.
pub(crate) fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded_for) = req.headers().get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // First entry in the comma-separated list is the client
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    req.connection_info()
        .peer_addr()
        .map(|addr| addr.to_string())
}
