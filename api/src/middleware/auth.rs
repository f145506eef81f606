//! JWT authentication middleware for protecting API endpoints.
//!
//! Extracts the bearer token from the Authorization header, validates it
//! through the core token service, and injects an [`AuthContext`] into
//! the request. Legacy tokens whose subject is a username (rather than
//! the canonical numeric id) are resolved with a single account lookup
//! here, so handlers only ever see the canonical form.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::ErrorUnauthorized;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;

use ph_core::domain::entities::user::UserRole;
use ph_core::errors::{DomainError, TokenError};
use ph_core::repositories::UserRepository;
use ph_core::services::token::{TokenService, TokenSubject};

/// User authentication context injected into requests
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Canonical user id from the token subject
    pub user_id: i64,
    /// Role carried by the token
    pub role: UserRole,
}

impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let context = req.extensions().get::<AuthContext>().cloned();
        ready(context.ok_or_else(|| ErrorUnauthorized("Authentication required")))
    }
}

/// Optional authentication context for endpoints that behave
/// differently with and without a token
///
/// Yields `None` instead of failing when no valid token was presented;
/// call sites branch on the option rather than on an error.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthContext>);

impl FromRequest for OptionalAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(Self(req.extensions().get::<AuthContext>().cloned())))
    }
}

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuth {
    token_service: Arc<TokenService>,
    user_repository: Arc<dyn UserRepository>,
    /// When false, requests without a valid token pass through with no
    /// context instead of being rejected
    required: bool,
}

impl JwtAuth {
    /// Middleware rejecting requests without a valid token
    pub fn required(
        token_service: Arc<TokenService>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            token_service,
            user_repository,
            required: true,
        }
    }

    /// Middleware injecting a context when a valid token is present,
    /// passing the request through otherwise
    pub fn optional(
        token_service: Arc<TokenService>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            token_service,
            user_repository,
            required: false,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
            token_service: self.token_service.clone(),
            user_repository: self.user_repository.clone(),
            required: self.required,
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    token_service: Arc<TokenService>,
    user_repository: Arc<dyn UserRepository>,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token_service = self.token_service.clone();
        let user_repository = self.user_repository.clone();
        let required = self.required;

        Box::pin(async move {
            let token = extract_bearer_token(&req);

            let token = match (token, required) {
                (Some(token), _) => Some(token),
                (None, true) => {
                    return Err(ErrorUnauthorized(
                        "Missing or invalid Authorization header",
                    ))
                }
                (None, false) => None,
            };

            if let Some(token) = token {
                match authenticate(&token, &token_service, user_repository.as_ref()).await {
                    Ok(context) => {
                        req.extensions_mut().insert(context);
                    }
                    Err(error) if required => return Err(error),
                    // Optional mode: an invalid token is treated as absent
                    Err(_) => {}
                }
            }

            service.call(req).await
        })
    }
}

/// Validate a token and resolve its subject to a canonical context
async fn authenticate(
    token: &str,
    token_service: &TokenService,
    user_repository: &dyn UserRepository,
) -> Result<AuthContext, Error> {
    let validated = token_service.validate(token).map_err(|error| match error {
        DomainError::Token(TokenError::TokenExpired) => ErrorUnauthorized("Token expired"),
        _ => ErrorUnauthorized("Invalid token"),
    })?;

    let user_id = match validated.subject {
        TokenSubject::UserId(user_id) => user_id,
        // Legacy token: subject is the account email; one lookup
        // normalizes it to the canonical id
        TokenSubject::Username(username) => user_repository
            .find_by_email(&username)
            .await
            .map_err(|_| ErrorUnauthorized("Invalid token"))?
            .ok_or_else(|| ErrorUnauthorized("Invalid token"))?
            .id,
    };

    Ok(AuthContext {
        user_id,
        role: validated.role,
    })
}

/// Pull the bearer token out of the Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}
