//! Telegram login endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::{
    TelegramLoginRequest, TelegramLoginRequestedResponse, TelegramLoginVerifyRequest,
};
use crate::handlers::error::{error_response, validation_error_response};

use super::extract_client_ip;

/// Handler for POST /api/v1/auth/telegram/login/request (bot-initiated)
pub async fn request_login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TelegramLoginRequest>,
) -> HttpResponse {
    match state
        .auth_service
        .request_telegram_login(body.telegram_user_id)
        .await
    {
        Ok(issued) => {
            let web_login_url = state.telegram.web_login_url(&issued.token);
            HttpResponse::Ok().json(ApiResponse::success(TelegramLoginRequestedResponse {
                login_token: issued.token,
                web_login_url,
                expires_in: issued.expires_in,
            }))
        }
        Err(error) => error_response(&error, &req),
    }
}

/// Handler for POST /api/v1/auth/telegram/login/verify
pub async fn verify_login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TelegramLoginVerifyRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    let client_ip = extract_client_ip(&req);

    match state
        .auth_service
        .verify_telegram_login(&body.login_token, client_ip)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(ApiResponse::success(response)),
        Err(error) => error_response(&error, &req),
    }
}
