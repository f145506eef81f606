//! Session probe endpoint
//!
//! Answers for both anonymous and authenticated callers so the
//! storefront header can render login state with one call.

use actix_web::HttpResponse;
use serde::Serialize;

use ph_core::domain::entities::user::UserRole;
use ph_shared::types::ApiResponse;

use crate::middleware::OptionalAuth;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Handler for GET /api/v1/auth/session
pub async fn session(auth: OptionalAuth) -> HttpResponse {
    let response = match auth.0 {
        Some(context) => SessionResponse {
            authenticated: true,
            user_id: Some(context.user_id),
            role: Some(context.role),
        },
        None => SessionResponse {
            authenticated: false,
            user_id: None,
            role: None,
        },
    };
    HttpResponse::Ok().json(ApiResponse::success(response))
}
