use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::token::TokenService;
use crate::error::AppError;
use crate::store;

/// Request-scoped authentication gate.
///
/// For every protected request it extracts the bearer credential, verifies it
/// against the [`TokenService`], resolves the subject to a live user record
/// through the storage boundary, and attaches the public identity to the
/// request extensions for the `CurrentUser` extractor. Each failing step
/// collapses to the same generic 401; the concrete reason is only logged.
/// A storage outage during resolution surfaces as 503, not 401, so clients
/// can tell "retry later" from "re-authenticate".
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Skip authentication for health check and auth endpoints
        let path = req.path();
        if path == "/health"
            || path.starts_with("/api/auth/login")
            || path.starts_with("/api/auth/register")
        {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = req
                .headers()
                .get("Authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned);

            let token = match token {
                Some(token) => token,
                None => {
                    log::debug!("request to {} without bearer credential", req.path());
                    return Err(AppError::Unauthorized("Not authorized".into()).into());
                }
            };

            let token_service = req
                .app_data::<web::Data<TokenService>>()
                .cloned()
                .ok_or_else(|| {
                    AppError::InternalServerError("TokenService not configured".into())
                })?;
            let pool = req.app_data::<web::Data<PgPool>>().cloned().ok_or_else(|| {
                AppError::InternalServerError("Database pool not configured".into())
            })?;

            // verify() already collapses the failure reason to a generic 401.
            let claims = token_service.verify(&token)?;

            // The subject must still resolve to a live user: a token can
            // outlive its account. An Unavailable store error propagates as 503.
            let user = match store::users::find_user_by_id(&pool, claims.sub).await? {
                Some(user) => user,
                None => {
                    log::warn!("token subject {} no longer resolves to a user", claims.sub);
                    return Err(AppError::Unauthorized("Not authorized".into()).into());
                }
            };

            req.extensions_mut().insert(user);
            service.call(req).await
        })
    }
}
