use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// Extracts the authenticated user's identity from request extensions.
///
/// This extractor is intended to be used on routes protected by `AuthMiddleware`,
/// which is responsible for verifying the bearer token, resolving the subject to
/// a live user record, and inserting the public identity into request extensions.
/// Handlers therefore never perform their own identity lookups.
///
/// If the identity is not found in the extensions (e.g., if `AuthMiddleware` did
/// not run or failed to insert it), this extractor will return a generic
/// `AppError::Unauthorized` error. Extraction is a pure read: running it any
/// number of times within one request yields the same identity.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(CurrentUser(user))),
            None => {
                // Reached only when the middleware is missing from the scope or
                // failed to attach an identity after a successful verification.
                // Responding with the generic unauthorized error is the safe default.
                log::warn!(
                    "no authenticated identity in request extensions for path {}",
                    req.path()
                );
                let err = AppError::Unauthorized("Not authorized".to_string());
                ready(Err(err.into())) // Convert AppError to ActixError
            }
        }
    }
}
