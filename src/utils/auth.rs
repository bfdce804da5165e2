use actix_web::dev::Payload;
use actix_web::http::header::{self, Header};
use actix_web::{web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use log::{debug, error};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const NO_TOKEN: &str = "Access denied. No token provided.";
pub const INVALID_TOKEN: &str = "Invalid token";
pub const NOT_VERIFIED: &str = "Email not verified. Please check your email to verify your account.";

/// Identity carried by a valid session token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

fn app_state(req: &HttpRequest) -> Result<&web::Data<AppState>, AppError> {
    req.app_data::<web::Data<AppState>>().ok_or_else(|| {
        error!("AppState is not registered on the application");
        AppError::InternalServerError("Internal server error".to_string())
    })
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Err(AppError::Unauthorized(NO_TOKEN.to_string()));
    }

    let bearer = Authorization::<Bearer>::parse(req)
        .map_err(|err| {
            debug!("Malformed Authorization header: {}", err);
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?
        .into_scheme();

    let claims = app_state(req)?
        .tokens
        .verify_session(bearer.token())
        .map_err(|err| {
            debug!("Rejected session token: {}", err);
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

    Ok(AuthUser {
        id: claims.id,
        username: claims.username,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// A session whose account still exists and has a verified email.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub User);

impl FromRequest for VerifiedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let identity = authenticate(req);
        let state = app_state(req).cloned();

        Box::pin(async move {
            let identity = identity?;
            let state = state?;
            let user = state
                .users
                .find_user(identity.id)
                .await?
                .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;
            if !user.verified {
                return Err(AppError::Forbidden(NOT_VERIFIED.to_string()));
            }
            Ok(VerifiedUser(user))
        })
    }
}
