use actix_web::{web, HttpResponse};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::clothing::ClothingFilter;
use crate::services::intake::image_key;
use crate::state::AppState;
use crate::utils::auth::VerifiedUser;
use crate::utils::validation::{parse_clothing_type, validate_payload};

pub const ITEM_NOT_FOUND: &str = "Clothing item not found";

#[derive(Deserialize)]
pub struct ClothingQuery {
    #[serde(rename = "type", alias = "clothingType")]
    clothing_type: Option<String>,
    color: Option<String>,
    material: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct ReclassifyRequest {
    #[serde(rename = "type")]
    #[validate(required(message = "Type is required"))]
    clothing_type: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ClothingQuery {
    fn into_filter(self) -> Result<ClothingFilter, AppError> {
        let clothing_type = non_blank(self.clothing_type)
            .map(|t| parse_clothing_type(&t))
            .transpose()?;
        Ok(ClothingFilter {
            clothing_type,
            color: non_blank(self.color),
            material: non_blank(self.material),
        })
    }
}

// GET /api/clothing
pub async fn list_clothing(
    user: VerifiedUser,
    state: web::Data<AppState>,
    query: web::Query<ClothingQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().into_filter()?;

    let Some(closet) = state.closets.find_closet(user.0.id).await? else {
        return Ok(HttpResponse::Ok().json(Vec::<()>::new()));
    };

    let items: Vec<_> = state
        .clothing
        .find_items(&closet.items)
        .await?
        .into_iter()
        .filter(|item| filter.matches(item))
        .collect();

    Ok(HttpResponse::Ok().json(items))
}

// PUT /api/clothing/{id}/reclassify
pub async fn reclassify_clothing(
    user: VerifiedUser,
    state: web::Data<AppState>,
    item_id: web::Path<Uuid>,
    req: web::Json<ReclassifyRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;
    let clothing_type = parse_clothing_type(req.clothing_type.as_deref().unwrap_or_default())?;
    let item_id = item_id.into_inner();

    let owned = state
        .closets
        .find_closet(user.0.id)
        .await?
        .is_some_and(|closet| closet.contains(item_id));
    if !owned {
        return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
    }

    let item = state
        .clothing
        .set_item_type(item_id, clothing_type)
        .await?
        .ok_or_else(|| AppError::NotFound(ITEM_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Clothing item reclassified successfully",
        "clothing": item,
    })))
}

// DELETE /api/clothing/{id}
pub async fn delete_clothing(
    user: VerifiedUser,
    state: web::Data<AppState>,
    item_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let item_id = item_id.into_inner();

    if !state.closets.remove_from_closet(user.0.id, item_id).await? {
        return Err(AppError::NotFound(ITEM_NOT_FOUND.to_string()));
    }
    state.clothing.delete_item(item_id).await?;

    if let Err(e) = state.image_store.delete(&image_key(item_id)).await {
        warn!("Could not delete image for clothing item {}: {}", item_id, e);
    }
    info!("Deleted clothing item {} for user {}", item_id, user.0.id);

    Ok(HttpResponse::Ok().json(json!({ "message": "Clothing item deleted successfully" })))
}
