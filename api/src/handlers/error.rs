//! Domain error to HTTP response translation
//!
//! The only layer allowed to turn typed domain errors into HTTP status
//! and error-code pairs; handlers pass errors through untouched so the
//! taxonomy stays stable if the transport changes.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use uuid::Uuid;
use validator::ValidationErrors;

use ph_core::errors::{AuthError, DomainError, TokenError};
use ph_shared::types::ApiResponse;

/// Convert a domain error into the standard HTTP error response
pub fn error_response(error: &DomainError, req: &HttpRequest) -> HttpResponse {
    let request_id = request_id(req);
    log::warn!("[{}] {} {}: {:?}", request_id, req.method(), req.path(), error);

    let (status, code, message, retry_after) = map_error(error);

    let body: ApiResponse<()> = ApiResponse::error(code, message).with_request_id(request_id);
    let mut builder = HttpResponse::build(status);
    if let Some(seconds) = retry_after {
        builder.insert_header((header::RETRY_AFTER, seconds.to_string()));
    }
    builder.json(body)
}

/// Reject a request that failed DTO validation
pub fn validation_error_response(errors: &ValidationErrors, req: &HttpRequest) -> HttpResponse {
    let request_id = request_id(req);
    log::warn!(
        "[{}] validation failed on {}: {:?}",
        request_id,
        req.path(),
        errors
    );

    let fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
    let body: ApiResponse<()> = ApiResponse::error(
        "VALIDATION_ERROR",
        format!("Invalid request data: {}", fields.join(", ")),
    )
    .with_request_id(request_id);
    HttpResponse::BadRequest().json(body)
}

fn map_error(
    error: &DomainError,
) -> (actix_web::http::StatusCode, String, String, Option<i64>) {
    use actix_web::http::StatusCode;

    match error {
        DomainError::Auth(auth_error) => {
            let status = match auth_error {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::AccountLocked { .. } | AuthError::RateLimited { .. } => {
                    StatusCode::TOO_MANY_REQUESTS
                }
                AuthError::AccountDisabled | AuthError::RegistrationDisabled => {
                    StatusCode::FORBIDDEN
                }
                AuthError::AlreadyLinked | AuthError::TelegramAlreadyLinked => {
                    StatusCode::CONFLICT
                }
                AuthError::TelegramNotLinked | AuthError::UserNotFound => {
                    StatusCode::NOT_FOUND
                }
                _ => StatusCode::BAD_REQUEST,
            };
            let retry_after = match auth_error {
                AuthError::RateLimited {
                    retry_after_seconds,
                } => Some(*retry_after_seconds),
                AuthError::AccountLocked { minutes } => Some(minutes * 60),
                _ => None,
            };
            (
                status,
                auth_error.code().to_string(),
                auth_error.to_string(),
                retry_after,
            )
        }
        DomainError::Token(token_error) => {
            // Link and login token failures are client errors, not auth
            // challenges; session token failures are handled by the
            // middleware before a handler ever runs
            let status = match token_error {
                TokenError::TokenExpired | TokenError::TokenReplay => {
                    actix_web::http::StatusCode::BAD_REQUEST
                }
                TokenError::TokenInvalid => actix_web::http::StatusCode::BAD_REQUEST,
            };
            (
                status,
                token_error.code().to_string(),
                token_error.to_string(),
                None,
            )
        }
        DomainError::ValidationErr(validation_error) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR".to_string(),
            validation_error.to_string(),
            None,
        ),
        DomainError::Validation { message } => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR".to_string(),
            message.clone(),
            None,
        ),
        DomainError::BusinessRule { message } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "BUSINESS_RULE_VIOLATION".to_string(),
            message.clone(),
            None,
        ),
        DomainError::NotFound { resource } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND".to_string(),
            format!("{} not found", resource),
            None,
        ),
        DomainError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED".to_string(),
            "Unauthorized".to_string(),
            None,
        ),
        DomainError::Internal { .. } => (
            // Details stay in the log; clients get a generic message
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR".to_string(),
            "Internal server error".to_string(),
            None,
        ),
    }
}

/// Request ID from the X-Request-ID header, or a fresh one
pub fn request_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn status_of(error: DomainError) -> u16 {
        let req = TestRequest::default().to_http_request();
        error_response(&error, &req).status().as_u16()
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(status_of(AuthError::InvalidCredentials.into()), 401);
        assert_eq!(
            status_of(AuthError::RateLimited { retry_after_seconds: 60 }.into()),
            429
        );
        assert_eq!(status_of(AuthError::AccountLocked { minutes: 5 }.into()), 429);
        assert_eq!(status_of(AuthError::AlreadyLinked.into()), 409);
        assert_eq!(status_of(AuthError::TelegramAlreadyLinked.into()), 409);
        assert_eq!(status_of(AuthError::TelegramNotLinked.into()), 404);
        assert_eq!(
            status_of(AuthError::OtpInvalid { remaining_attempts: 2 }.into()),
            400
        );
        assert_eq!(status_of(AuthError::OtpMaxAttempts.into()), 400);
    }

    #[test]
    fn test_token_errors_are_bad_requests() {
        assert_eq!(status_of(TokenError::TokenExpired.into()), 400);
        assert_eq!(status_of(TokenError::TokenReplay.into()), 400);
        assert_eq!(status_of(TokenError::TokenInvalid.into()), 400);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let req = TestRequest::default().to_http_request();
        let response = error_response(
            &DomainError::Internal {
                message: "connection pool exhausted on db-3".to_string(),
            },
            &req,
        );
        assert_eq!(response.status().as_u16(), 500);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let req = TestRequest::default().to_http_request();
        let response = error_response(
            &AuthError::RateLimited {
                retry_after_seconds: 120,
            }
            .into(),
            &req,
        );
        let retry_after = response.headers().get(header::RETRY_AFTER).unwrap();
        assert_eq!(retry_after, "120");
    }
}
