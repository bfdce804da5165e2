use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use log::{error, info};
use std::io::ErrorKind;
use std::path::Path;

use crate::errors::AppError;
use crate::services::intake::{intake_clothing, UploadedImage};
use crate::state::AppState;
use crate::utils::auth::VerifiedUser;

pub const IMAGE_FIELD: &str = "image";
pub const NO_IMAGE: &str = "No image file provided";
const ALLOWED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Reads the single `image` part into memory, enforcing the size limit.
async fn read_image_field(
    req: &HttpRequest,
    payload: web::Payload,
    max_bytes: usize,
) -> Result<Vec<u8>, AppError> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut file_data = Vec::new();
    let mut seen_image = false;

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|err| {
            error!("Invalid multipart field: {:?}", err);
            AppError::BadRequest("Invalid multipart field".to_string())
        })?;

        if field.name() != IMAGE_FIELD {
            error!("Unexpected multipart field '{}'", field.name());
            return Err(AppError::BadRequest(format!(
                "Unexpected field '{}', expected '{}'",
                field.name(),
                IMAGE_FIELD
            )));
        }
        if seen_image {
            error!("Multipart body carries more than one '{}' part", IMAGE_FIELD);
            return Err(AppError::BadRequest(format!(
                "Only one '{}' file may be uploaded",
                IMAGE_FIELD
            )));
        }
        seen_image = true;

        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|err| {
                error!("Failed to read chunk: {:?}", err);
                AppError::BadRequest("Failed to read chunk".to_string())
            })?;
            if file_data.len() + chunk.len() > max_bytes {
                return Err(AppError::BadRequest(format!(
                    "File size exceeds {}MB limit",
                    max_bytes / (1024 * 1024)
                )));
            }
            file_data.extend_from_slice(&chunk);
        }
    }

    Ok(file_data)
}

// POST /api/clothing
pub async fn upload_clothing(
    req: HttpRequest,
    payload: web::Payload,
    user: VerifiedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let bytes = read_image_field(&req, payload, state.settings.max_upload_bytes).await?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest(NO_IMAGE.to_string()));
    }

    let kind = infer::get(&bytes)
        .filter(|kind| ALLOWED_TYPES.contains(&kind.mime_type()))
        .ok_or_else(|| {
            AppError::BadRequest("Only JPEG, PNG and WEBP images are allowed".to_string())
        })?;
    info!("Received {} upload of {} bytes", kind.mime_type(), bytes.len());

    let image = UploadedImage {
        bytes,
        mime_type: kind.mime_type().to_string(),
        extension: kind.extension().to_string(),
    };
    let item = intake_clothing(&state, user.0.id, image).await?;

    Ok(HttpResponse::Created().json(item))
}

fn is_bare_file_name(key: &str) -> bool {
    !key.starts_with('.') && Path::new(key).file_name().and_then(|n| n.to_str()) == Some(key)
}

// GET /uploads/{key}
pub async fn serve_upload(
    key: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let not_found = || AppError::NotFound("Image not found".to_string());

    let upload_dir = state.settings.upload_dir.as_ref().ok_or_else(not_found)?;
    if !is_bare_file_name(&key) {
        return Err(not_found());
    }

    let bytes = match tokio::fs::read(upload_dir.join(key.as_str())).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(AppError::internal("Error reading image", e)),
    };
    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0190a1b2.png", true)]
    #[case("../secret.png", false)]
    #[case("nested/item.png", false)]
    #[case(".env", false)]
    #[case("", false)]
    fn only_bare_file_names_are_served(#[case] key: &str, #[case] ok: bool) {
        assert_eq!(is_bare_file_name(key), ok);
    }
}
