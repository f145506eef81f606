//! Authenticated phone verification endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::{OtpRequestedResponse, PhoneVerifiedResponse, PhoneVerifyConfirmRequest};
use crate::handlers::error::{error_response, validation_error_response};
use crate::middleware::AuthContext;

/// Handler for POST /api/v1/auth/phone/verify/request
pub async fn request_verification(
    req: HttpRequest,
    state: web::Data<AppState>,
    auth: AuthContext,
) -> HttpResponse {
    match state.auth_service.request_phone_verification(auth.user_id).await {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(OtpRequestedResponse {
            expires_in: result.expires_in,
            resend_available_in: result.resend_available_in,
        })),
        Err(error) => error_response(&error, &req),
    }
}

/// Handler for POST /api/v1/auth/phone/verify/confirm
pub async fn confirm_verification(
    req: HttpRequest,
    state: web::Data<AppState>,
    auth: AuthContext,
    body: web::Json<PhoneVerifyConfirmRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    match state
        .auth_service
        .confirm_phone_verification(auth.user_id, &body.otp_code)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(PhoneVerifiedResponse {
            verified: result.verified,
            verified_at: result.verified_at,
        })),
        Err(error) => error_response(&error, &req),
    }
}
