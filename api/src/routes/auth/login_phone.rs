//! Phone OTP login endpoints

use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use ph_core::services::auth::mask_phone;
use ph_shared::types::ApiResponse;

use crate::app::AppState;
use crate::dto::auth_dto::{OtpRequestedResponse, PhoneOtpRequest, PhoneOtpVerifyRequest};
use crate::handlers::error::{error_response, request_id, validation_error_response};

use super::extract_client_ip;

/// Handler for POST /api/v1/auth/login/phone/request
pub async fn request_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<PhoneOtpRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    let client_ip = extract_client_ip(&req);
    log::info!(
        "[{}] OTP requested for {}",
        request_id(&req),
        mask_phone(&body.phone_number)
    );

    match state
        .auth_service
        .request_phone_otp(&body.phone_number, client_ip)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(ApiResponse::success(OtpRequestedResponse {
            expires_in: result.expires_in,
            resend_available_in: result.resend_available_in,
        })),
        Err(error) => error_response(&error, &req),
    }
}

/// Handler for POST /api/v1/auth/login/phone/verify
pub async fn verify_code(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<PhoneOtpVerifyRequest>,
) -> HttpResponse {
    if let Err(errors) = body.validate() {
        return validation_error_response(&errors, &req);
    }

    let client_ip = extract_client_ip(&req);
    log::info!(
        "[{}] OTP verification for {}",
        request_id(&req),
        mask_phone(&body.phone_number)
    );

    match state
        .auth_service
        .verify_phone_otp(&body.phone_number, &body.otp_code, client_ip)
        .await
    {
        Ok(response) => HttpResponse::Ok().json(ApiResponse::success(response)),
        Err(error) => error_response(&error, &req),
    }
}
