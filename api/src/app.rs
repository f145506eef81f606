//! Application state and route registration

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use ph_core::services::auth::AuthService;
use ph_infra::{
    MySqlAuditRepository, MySqlLinkTokenRepository, MySqlOtpRepository, MySqlUserRepository,
    RedisRateLimiter, SmsDispatcher,
};
use ph_shared::config::TelegramConfig;

use crate::middleware::JwtAuth;
use crate::routes;

/// The auth service over the production infrastructure stack
pub type SharedAuthService = AuthService<
    MySqlUserRepository,
    MySqlOtpRepository,
    SmsDispatcher,
    MySqlLinkTokenRepository,
    RedisRateLimiter,
    MySqlAuditRepository,
>;

/// Shared application state injected into handlers
pub struct AppState {
    pub auth_service: Arc<SharedAuthService>,
    pub telegram: TelegramConfig,
}

/// Register all routes
///
/// Protected endpoints sit behind the required-JWT middleware; the
/// session probe uses the optional variant so it can answer for
/// anonymous visitors too.
pub fn configure_routes(
    cfg: &mut web::ServiceConfig,
    jwt_required: JwtAuth,
    jwt_optional: JwtAuth,
) {
    cfg.route("/health", web::get().to(routes::health::health_check))
        .service(
            web::scope("/api/v1/auth")
                .route(
                    "/login/email",
                    web::post().to(routes::auth::login_email::login_email),
                )
                .route(
                    "/login/phone/request",
                    web::post().to(routes::auth::login_phone::request_code),
                )
                .route(
                    "/login/phone/verify",
                    web::post().to(routes::auth::login_phone::verify_code),
                )
                .route(
                    "/telegram/link/verify",
                    web::post().to(routes::auth::telegram_link::verify_link),
                )
                .route(
                    "/telegram/login/request",
                    web::post().to(routes::auth::telegram_login::request_login),
                )
                .route(
                    "/telegram/login/verify",
                    web::post().to(routes::auth::telegram_login::verify_login),
                )
                .service(
                    web::scope("/phone/verify")
                        .wrap(jwt_required.clone())
                        .route(
                            "/request",
                            web::post().to(routes::auth::phone_verification::request_verification),
                        )
                        .route(
                            "/confirm",
                            web::post().to(routes::auth::phone_verification::confirm_verification),
                        ),
                )
                .service(
                    web::resource("/telegram/link/request")
                        .wrap(jwt_required.clone())
                        .route(web::post().to(routes::auth::telegram_link::request_link)),
                )
                .service(
                    web::resource("/telegram/unlink")
                        .wrap(jwt_required)
                        .route(web::delete().to(routes::auth::unlink::unlink)),
                )
                .service(
                    web::resource("/session")
                        .wrap(jwt_optional)
                        .route(web::get().to(routes::auth::session::session)),
                ),
        )
        .default_service(web::route().to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": "NOT_FOUND",
        "message": "The requested resource was not found"
    }))
}
