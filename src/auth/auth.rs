use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::{auth::jwt::verify_token, config::Config, error::AppError};

pub struct AuthUser {
    pub user_id: u64,
    pub email: String,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// Bearer authentication that may be absent.
///
/// No `Authorization` header yields `OptionalAuth(None)`; a header that is
/// present but malformed, expired or forged is rejected with 401.
pub struct OptionalAuth(pub Option<AuthUser>);

fn bearer_token(req: &HttpRequest) -> Option<Result<&str, AppError>> {
    let header = req.headers().get("Authorization")?;
    Some(
        header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Authorization header must start with Bearer".into())),
    )
}

fn authenticate(req: &HttpRequest, token: &str) -> Result<AuthUser, AppError> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| AppError::Internal("Config missing".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        employee_id: claims.employee_id,
    })
}

impl FromRequest for OptionalAuth {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match bearer_token(req) {
            Some(Ok(token)) => authenticate(req, token).map(|user| OptionalAuth(Some(user))),
            Some(Err(e)) => Err(e),
            None => Ok(OptionalAuth(None)),
        };
        ready(result.map_err(Into::into))
    }
}
