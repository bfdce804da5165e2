use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::errors::AppError;
use crate::models::user::User;
use crate::services::intake::image_key;
use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::password::hash_password;
use crate::utils::validation::{normalize_email, validate_not_blank, validate_payload, USERNAME_RE};

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(
        custom = "validate_not_blank",
        length(min = 1, max = 50, message = "First name must be between 1 and 50 characters")
    )]
    first_name: Option<String>,

    #[validate(
        custom = "validate_not_blank",
        length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters")
    )]
    last_name: Option<String>,

    #[validate(regex(
        path = "USERNAME_RE",
        message = "Username must be 3-32 letters, digits, '.', '_' or '-'"
    ))]
    username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    email: Option<String>,

    #[validate(length(min = 1, max = 72, message = "Password must be between 1 and 72 characters"))]
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteAccountRequest {
    username: Option<String>,
}

async fn load_user(state: &AppState, auth: &AuthUser) -> Result<User, AppError> {
    state
        .users
        .find_user(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

// GET /api/users/profile
pub async fn get_profile(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(&state, &auth).await?;
    Ok(HttpResponse::Ok().json(user))
}

// PUT /api/users/profile
pub async fn update_profile(
    auth: AuthUser,
    state: web::Data<AppState>,
    updates: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*updates)?;
    let updates = updates.into_inner();
    let mut user = load_user(&state, &auth).await?;

    let username = updates.username.unwrap_or_else(|| user.username.clone());
    let email = updates
        .email
        .as_deref()
        .map(normalize_email)
        .unwrap_or_else(|| user.email.clone());

    if (username != user.username || email != user.email)
        && state.users.identity_taken(&username, &email, Some(user.id)).await?
    {
        return Err(AppError::Conflict("Username or email already exists".to_string()));
    }

    if let Some(first) = updates.first_name {
        user.name.first = first.trim().to_string();
    }
    if let Some(last) = updates.last_name {
        user.name.last = last.trim().to_string();
    }
    if let Some(password) = updates.password {
        user.password = hash_password(&password).await?;
    }
    user.username = username;
    user.email = email;
    user.updated_at = Utc::now();

    state.users.update_user(&user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

// DELETE /api/users/delete
pub async fn delete_account(
    auth: AuthUser,
    state: web::Data<AppState>,
    body: Option<web::Json<DeleteAccountRequest>>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(&state, &auth).await?;

    // Compare against the stored name; the token may predate a rename.
    if let Some(requested) = body.and_then(|b| b.into_inner().username) {
        if requested != user.username {
            return Err(AppError::Forbidden(
                "You can only delete your own account".to_string(),
            ));
        }
    }

    if let Some(closet) = state.closets.find_closet(user.id).await? {
        let removed = state.clothing.delete_items(&closet.items).await?;
        for item_id in &closet.items {
            if let Err(e) = state.image_store.delete(&image_key(*item_id)).await {
                warn!("Could not delete image for clothing item {}: {}", item_id, e);
            }
        }
        state.closets.delete_closet(user.id).await?;
        info!("Deleted closet of user {} with {} items", user.id, removed);
    }
    state.outfits.delete_outfits(user.id).await?;

    if !state.users.delete_user(user.id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    info!("Deleted user {} ({})", user.username, user.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted successfully" })))
}

// GET /api/users/weather
pub async fn weather(
    auth: AuthUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = load_user(&state, &auth).await?;
    let point = user.geolocation;

    let report = state
        .weather
        .current_weather(point.latitude(), point.longitude())
        .await
        .map_err(|e| AppError::internal("Error fetching weather data", e))?;

    Ok(HttpResponse::Ok().json(report))
}
