use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::user::{GeoPoint, PersonName, User, UserSummary};
use crate::services::mailer::{
    send_email_recovery_notice, send_password_reset_email, send_verification_email,
};
use crate::state::AppState;
use crate::utils::auth::NOT_VERIFIED;
use crate::utils::jwt::TokenPurpose;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validation::{
    mask_email, normalize_email, validate_geolocation, validate_not_blank, validate_payload,
    USERNAME_RE,
};

pub const DUPLICATE_IDENTITY: &str = "Username or email already exists";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const REGISTERED: &str =
    "User registered successfully. Please check your email to verify your account.";
pub const RESET_REQUESTED: &str =
    "If an account with that email exists, a password reset link has been sent.";

#[derive(Deserialize, Validate)]
pub struct NameInput {
    #[validate(
        custom = "validate_not_blank",
        length(min = 1, max = 50, message = "First name must be between 1 and 50 characters")
    )]
    first: String,

    #[validate(
        custom = "validate_not_blank",
        length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters")
    )]
    last: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate]
    name: NameInput,

    #[validate(regex(
        path = "USERNAME_RE",
        message = "Username must be 3-32 letters, digits, '.', '_' or '-'"
    ))]
    username: String,

    #[validate(email(message = "Invalid email format"))]
    email: String,

    #[validate(length(min = 1, max = 72, message = "Password must be between 1 and 72 characters"))]
    password: String,

    #[validate(custom = "validate_geolocation")]
    geolocation: GeoPoint,
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
    user: UserSummary,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    email: String,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, max = 72, message = "Password must be between 1 and 72 characters"))]
    new_password: String,
}

#[derive(Deserialize, Validate)]
pub struct RecoverEmailRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
}

/// Minimal standalone page for links opened from an email client.
fn html_page(status: StatusCode, title: &str, body: &str, frontend_url: &str) -> HttpResponse {
    let page = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: Arial, sans-serif; text-align: center; padding: 40px;">
<h1>{title}</h1>
{body}
<p><a href="{frontend_url}">Go to Wardrobe Wizard</a></p>
</body>
</html>"#
    );
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(page)
}

// POST /api/users/register
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;
    let req = req.into_inner();
    let email = normalize_email(&req.email);

    if state.users.identity_taken(&req.username, &email, None).await? {
        return Err(AppError::Conflict(DUPLICATE_IDENTITY.to_string()));
    }

    let password = hash_password(&req.password).await?;
    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        name: PersonName {
            first: req.name.first.trim().to_string(),
            last: req.name.last.trim().to_string(),
        },
        username: req.username,
        email,
        password,
        geolocation: req.geolocation,
        verified: false,
        created_at: now,
        updated_at: now,
    };
    state.users.create_user(&user).await?;
    info!("Registered user {} ({})", user.username, user.id);

    let token = state.tokens.issue_action(user.id, TokenPurpose::Verify)?;
    let link = format!(
        "{}/api/users/verify-email?token={}",
        state.settings.public_base_url, token
    );
    send_verification_email(state.mailer.as_ref(), &user.email, &link)
        .await
        .map_err(|e| AppError::internal("Error sending verification email", e))?;

    Ok(HttpResponse::Created().json(json!({ "message": REGISTERED })))
}

// POST /api/users/login
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    let user = state
        .users
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&req.password, &user.password).await? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    if !user.verified {
        return Err(AppError::Forbidden(NOT_VERIFIED.to_string()));
    }

    let token = state.tokens.issue_session(user.id, &user.username)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

// GET /api/users/verify-email?token=
pub async fn verify_email(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
) -> Result<HttpResponse, AppError> {
    let frontend = state.settings.frontend_url.as_str();
    let invalid = || {
        html_page(
            StatusCode::BAD_REQUEST,
            "Invalid or Expired Link",
            "<p>This verification link is invalid or has expired.</p>",
            frontend,
        )
    };

    let Some(token) = query.token.as_deref() else {
        return Ok(invalid());
    };
    let user_id = match state.tokens.verify_action(token, TokenPurpose::Verify) {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejected verification token: {}", e);
            return Ok(invalid());
        }
    };

    let Some(mut user) = state.users.find_user(user_id).await? else {
        return Ok(html_page(
            StatusCode::NOT_FOUND,
            "User Not Found",
            "<p>We could not find an account for this link.</p>",
            frontend,
        ));
    };

    if user.verified {
        return Ok(html_page(
            StatusCode::BAD_REQUEST,
            "Already Verified",
            "<p>Your email address has already been verified. You can log in.</p>",
            frontend,
        ));
    }

    user.verified = true;
    user.updated_at = Utc::now();
    state.users.update_user(&user).await?;
    info!("Verified email for user {}", user.id);

    Ok(html_page(
        StatusCode::OK,
        "Email Verified",
        "<p>Your email address has been verified. You can now log in.</p>",
        frontend,
    ))
}

// POST /api/users/forgot-password
pub async fn forgot_password(
    state: web::Data<AppState>,
    req: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    if let Some(user) = state.users.find_user_by_email(&normalize_email(&req.email)).await? {
        let token = state.tokens.issue_action(user.id, TokenPurpose::Reset)?;
        let link = format!(
            "{}/api/users/reset-password?token={}",
            state.settings.public_base_url, token
        );
        if let Err(e) = send_password_reset_email(state.mailer.as_ref(), &user.email, &link).await {
            error!("Failed to send password reset email to user {}: {}", user.id, e);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": RESET_REQUESTED })))
}

// GET /api/users/reset-password?token=
pub async fn reset_password_form(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
) -> HttpResponse {
    let frontend = state.settings.frontend_url.as_str();
    let token = query.token.as_deref().unwrap_or_default();

    if state.tokens.verify_action(token, TokenPurpose::Reset).is_err() {
        return html_page(
            StatusCode::BAD_REQUEST,
            "Invalid or Expired Link",
            "<p>This password reset link is invalid or has expired.</p>",
            frontend,
        );
    }

    let form = format!(
        r#"<form method="POST" action="/api/users/reset-password?token={token}">
<label for="newPassword">New password</label><br>
<input type="password" id="newPassword" name="newPassword" required maxlength="72"><br><br>
<button type="submit">Reset Password</button>
</form>"#
    );
    html_page(StatusCode::OK, "Reset Your Password", &form, frontend)
}

// POST /api/users/reset-password?token=
pub async fn reset_password(
    state: web::Data<AppState>,
    query: web::Query<TokenQuery>,
    body: web::Either<web::Json<ResetPasswordRequest>, web::Form<ResetPasswordRequest>>,
) -> Result<HttpResponse, AppError> {
    let req = match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };
    validate_payload(&req)?;

    let token = query.token.as_deref().unwrap_or_default();
    let user_id = state
        .tokens
        .verify_action(token, TokenPurpose::Reset)
        .map_err(|e| {
            warn!("Rejected password reset token: {}", e);
            AppError::BadRequest("Invalid or expired token".to_string())
        })?;

    let mut user = state
        .users
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    user.password = hash_password(&req.new_password).await?;
    user.updated_at = Utc::now();
    state.users.update_user(&user).await?;
    info!("Password reset for user {}", user.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Password has been reset successfully" })))
}

// POST /api/users/recover-email
pub async fn recover_email(
    state: web::Data<AppState>,
    req: web::Json<RecoverEmailRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;

    let user = state
        .users
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    send_email_recovery_notice(state.mailer.as_ref(), &user.email, &user.username)
        .await
        .map_err(|e| AppError::internal("Error sending recovery email", e))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "An email with your account address has been sent.",
        "email": mask_email(&user.email),
    })))
}
