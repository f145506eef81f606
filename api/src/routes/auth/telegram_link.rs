//! Telegram account linking endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use ph_core::domain::entities::user::TelegramProfile;
use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::{LinkRequestedResponse, LinkVerifiedResponse, TelegramLinkVerifyRequest};
use crate::handlers::error::{error_response, validation_error_response};
use crate::middleware::AuthContext;

use super::extract_client_ip;

/// Handler for POST /api/v1/auth/telegram/link/request (authenticated)
pub async fn request_link(
    req: HttpRequest,
    state: web::Data<AppState>,
    auth: AuthContext,
) -> HttpResponse {
    let client_ip = extract_client_ip(&req);

    match state
        .auth_service
        .request_telegram_link(auth.user_id, client_ip)
        .await
    {
        Ok(issued) => {
            let deep_link_url = state.telegram.deep_link(&format!("link_{}", issued.token));
            HttpResponse::Ok().json(ApiResponse::success(LinkRequestedResponse {
                link_token: issued.token,
                deep_link_url,
                expires_in: issued.expires_in,
            }))
        }
        Err(error) => error_response(&error, &req),
    }
}

/// Handler for POST /api/v1/auth/telegram/link/verify (bot-initiated)
pub async fn verify_link(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TelegramLinkVerifyRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    let body = body.into_inner();
    let profile = TelegramProfile {
        username: body.telegram_username,
        first_name: body.telegram_first_name,
        last_name: body.telegram_last_name,
    };

    match state
        .auth_service
        .verify_telegram_link(&body.link_token, body.telegram_user_id, profile)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(LinkVerifiedResponse {
            user: result.user,
            linked_at: result.linked_at,
        })),
        Err(error) => error_response(&error, &req),
    }
}
