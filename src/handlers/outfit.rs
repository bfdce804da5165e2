use actix_web::{web, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::outfit::Outfit;
use crate::state::AppState;
use crate::utils::auth::VerifiedUser;
use crate::utils::validation::validate_payload;

pub const EMPTY_CLOSET: &str =
    "Your closet is empty. Add clothing items before generating an outfit.";

#[derive(Deserialize, Validate)]
pub struct GenerateOutfitRequest {
    #[validate(
        required(message = "Prompt is required"),
        length(min = 1, max = 1000, message = "Prompt must be between 1 and 1000 characters")
    )]
    prompt: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOutfit {
    outfit_item_ids: Vec<String>,
}

#[derive(Deserialize, Validate)]
pub struct SaveOutfitRequest {
    #[validate(
        required(message = "Items are required"),
        length(min = 1, message = "An outfit needs at least one item")
    )]
    items: Option<Vec<Uuid>>,
}

// POST /api/clothing/generateOutfit
pub async fn generate_outfit(
    user: VerifiedUser,
    state: web::Data<AppState>,
    req: web::Json<GenerateOutfitRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;
    let prompt = req.into_inner().prompt.unwrap_or_default();

    let item_ids = state
        .closets
        .find_closet(user.0.id)
        .await?
        .map(|closet| closet.items)
        .unwrap_or_default();
    let items = state.clothing.find_items(&item_ids).await?;
    if items.is_empty() {
        return Err(AppError::BadRequest(EMPTY_CLOSET.to_string()));
    }

    let inventory: Vec<String> = items.iter().map(|item| item.inventory_line()).collect();
    let outfit_item_ids = state
        .stylist
        .suggest_outfit(&prompt, &inventory)
        .await
        .map_err(|e| AppError::internal("Error generating outfit", e))?;

    Ok(HttpResponse::Ok().json(GeneratedOutfit { outfit_item_ids }))
}

// POST /api/clothing/saveOutfit
pub async fn save_outfit(
    user: VerifiedUser,
    state: web::Data<AppState>,
    req: web::Json<SaveOutfitRequest>,
) -> Result<HttpResponse, AppError> {
    validate_payload(&*req)?;
    let items = req.into_inner().items.unwrap_or_default();

    let outfit = Outfit::new(user.0.id, items);
    state.outfits.insert_outfit(&outfit).await?;
    info!("Saved outfit {} for user {}", outfit.id, user.0.id);

    Ok(HttpResponse::Created().json(outfit))
}

// GET /api/clothing/outfit
pub async fn list_outfits(
    user: VerifiedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let outfits = state.outfits.list_outfits(user.0.id).await?;
    Ok(HttpResponse::Ok().json(outfits))
}

// DELETE /api/clothing/outfit/{id}
pub async fn delete_outfit(
    user: VerifiedUser,
    state: web::Data<AppState>,
    outfit_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    if !state.outfits.delete_outfit(user.0.id, *outfit_id).await? {
        return Err(AppError::NotFound("Outfit not found".to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({ "message": "Outfit deleted successfully" })))
}
