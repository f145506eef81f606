use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenvy::dotenv;
use log::{info, warn};

use ph_core::repositories::UserRepository;
use ph_core::services::audit::{AuditService, AuditServiceConfig};
use ph_core::services::auth::{AuthService, AuthServiceConfig};
use ph_core::services::cleanup::{CleanupConfig, CleanupService};
use ph_core::services::link::LinkTokenService;
use ph_core::services::otp::OtpService;
use ph_core::services::token::{JwtCodec, TokenService};
use ph_infra::{
    create_pool, create_sms_service, MySqlAuditRepository, MySqlLinkTokenRepository,
    MySqlOtpRepository, MySqlUserRepository, RedisClient, RedisRateLimiter,
};

use ph_api::app::{configure_routes, AppState};
use ph_api::config::AppConfig;
use ph_api::middleware::auth::JwtAuth;
use ph_api::middleware::cors::create_cors;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting PartsHub API server");

    let config = AppConfig::load();
    if config.jwt.is_using_default_secret() {
        warn!("JWT_SECRET is not set; using the development default");
    }

    // Infrastructure
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to connect to MySQL");
    let redis = RedisClient::new(&config.cache)
        .await
        .expect("Failed to connect to Redis");

    // Repositories
    let user_repository = Arc::new(MySqlUserRepository::new(pool.clone()));
    let otp_repository = Arc::new(MySqlOtpRepository::new(pool.clone()));
    let link_repository = Arc::new(MySqlLinkTokenRepository::new(pool.clone()));
    let audit_repository = Arc::new(MySqlAuditRepository::new(pool));

    // Background storage hygiene for expired codes, tokens, and
    // out-of-retention audit events
    let cleanup = CleanupService::new(
        otp_repository.clone(),
        link_repository.clone(),
        audit_repository.clone(),
        CleanupConfig::default(),
    );
    let _cleanup_handle = cleanup.spawn();

    // Services
    let sms_service = Arc::new(create_sms_service(&config.sms));
    let rate_limiter = Arc::new(RedisRateLimiter::new(redis, config.rate_limit.clone()));
    let otp_service = Arc::new(OtpService::new(
        otp_repository,
        sms_service,
        config.otp.clone(),
    ));
    let link_service = Arc::new(LinkTokenService::new(
        link_repository,
        config.link_token.clone(),
    ));
    let token_service = Arc::new(TokenService::new(
        Box::new(JwtCodec::new(&config.jwt.secret, &config.jwt.issuer)),
        config.jwt.clone(),
    ));
    let audit_service = Arc::new(AuditService::new(
        audit_repository,
        AuditServiceConfig::default(),
    ));

    let auth_service = Arc::new(AuthService::new(
        user_repository.clone(),
        otp_service,
        link_service,
        token_service.clone(),
        rate_limiter,
        audit_service,
        AuthServiceConfig {
            allow_registration: config.allow_registration,
            allow_shared_telegram: config.allow_shared_telegram,
            lockout: config.lockout.clone(),
        },
    ));

    let state = web::Data::new(AppState {
        auth_service,
        telegram: config.telegram.clone(),
    });
    let user_repository: Arc<dyn UserRepository> = user_repository;

    let bind_address = config.server.bind_address();
    info!("Server will bind to {}", bind_address);

    let cors_config = config.cors.clone();
    let workers = config.server.workers;

    let mut server = HttpServer::new(move || {
        let jwt_required = JwtAuth::required(token_service.clone(), user_repository.clone());
        let jwt_optional = JwtAuth::optional(token_service.clone(), user_repository.clone());

        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(&cors_config))
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, jwt_required, jwt_optional))
    })
    .bind(&bind_address)?;

    if workers > 0 {
        server = server.workers(workers);
    }

    server.run().await
}
