use lazy_static::lazy_static;
use regex::Regex;
use validator::{Validate, ValidationError};

use crate::errors::AppError;
use crate::models::clothing::ClothingType;
use crate::models::user::GeoPoint;

lazy_static! {
    pub static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
}

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate()
        .map_err(|err| AppError::BadRequest(err.to_string()))
}

pub fn validate_geolocation(point: &GeoPoint) -> Result<(), ValidationError> {
    if !point.in_range() {
        let mut err = ValidationError::new("geolocation");
        err.message = Some("Coordinates must be [longitude, latitude] within range".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub fn parse_clothing_type(value: &str) -> Result<ClothingType, AppError> {
    value.parse().map_err(|_| {
        AppError::BadRequest(
            "Type must be one of HEADWEAR, TOP, OUTERWEAR, BOTTOM or FOOTWEAR".to_string(),
        )
    })
}

/// Lower-cases and trims so lookups and uniqueness ignore case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// `alice@example.com` becomes `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}
