//! Telegram unlink endpoint

use actix_web::{web, HttpRequest, HttpResponse};

use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::UnlinkResponse;
use crate::handlers::error::error_response;
use crate::middleware::AuthContext;

/// Handler for DELETE /api/v1/auth/telegram/unlink (authenticated)
///
/// Idempotent: a second call succeeds with `was_linked = false`.
pub async fn unlink(
    req: HttpRequest,
    state: web::Data<AppState>,
    auth: AuthContext,
) -> HttpResponse {
    match state.auth_service.unlink_telegram(auth.user_id).await {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(UnlinkResponse {
            success: result.success,
            was_linked: result.was_linked,
        })),
        Err(error) => error_response(&error, &req),
    }
}
