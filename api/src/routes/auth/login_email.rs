//! Email + password login endpoint

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::EmailLoginRequest;
use crate::handlers::error::{error_response, request_id, validation_error_response};

use super::extract_client_ip;

/// Handler for POST /api/v1/auth/login/email
pub async fn login_email(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<EmailLoginRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    let client_ip = extract_client_ip(&req);
    log::info!(
        "[{}] email login attempt from {}",
        request_id(&req),
        client_ip.as_deref().unwrap_or("unknown")
    );

    match state
        .auth_service
        .login_with_password(&body.email, &body.password, client_ip)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(ApiResponse::success(response)),
        Err(error) => error_response(&error, &req),
    }
}
