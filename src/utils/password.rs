use actix_web::rt::task::spawn_blocking;
use bcrypt::{hash, verify};

use crate::errors::AppError;

pub const BCRYPT_COST: u32 = 10;

/// Hashes off the async workers; bcrypt at cost 10 takes tens of milliseconds.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_string();
    spawn_blocking(move || hash(&password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::internal("Hashing failed", e))?
        .map_err(|e| AppError::internal("Hashing failed", e))
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();
    spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::internal("Password verification error", e))?
        .map_err(|e| AppError::internal("Password verification error", e))
}
