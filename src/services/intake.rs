//! Clothing intake: strip the background, store the cut-out, classify the
//! original photo, then persist the item and link it into the owner's closet.
//!
//! The steps run strictly one after another. Nothing is written to the
//! database until every external call has succeeded, and a stored cut-out
//! is removed again when classification fails.

use log::{error, info, warn};
use std::io::Write;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::clothing::Clothing;
use crate::state::AppState;

pub const INTAKE_FAILED: &str = "Error adding clothing item";

/// A validated upload held in memory.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub extension: String,
}

/// Object key of the processed image for clothing item `id`.
pub fn image_key(id: Uuid) -> String {
    format!("{}.png", id)
}

fn failed(step: &str, detail: impl std::fmt::Display) -> AppError {
    error!("Clothing intake failed while {}: {}", step, detail);
    AppError::InternalServerError(INTAKE_FAILED.to_string())
}

pub async fn intake_clothing(
    state: &AppState,
    user_id: Uuid,
    image: UploadedImage,
) -> Result<Clothing, AppError> {
    let id = Uuid::now_v7();
    let key = image_key(id);
    let upload_name = format!("{}.{}", id, image.extension);

    let processed = state
        .background_remover
        .remove_background(&image.bytes, &upload_name)
        .await
        .map_err(|e| failed("removing the background", e))?;

    // Scratch file is removed when `scratch` drops, on every path out of here.
    let mut scratch = tempfile::Builder::new()
        .prefix("clothing-")
        .suffix(".png")
        .tempfile_in(&state.settings.scratch_dir)
        .map_err(|e| failed("creating the scratch file", e))?;
    scratch
        .write_all(&processed)
        .and_then(|_| scratch.flush())
        .map_err(|e| failed("writing the scratch file", e))?;

    let image_path = state
        .image_store
        .store(&key, scratch.path(), "image/png")
        .await
        .map_err(|e| failed("storing the image", e))?;

    let classification = match state.classifier.classify(&image.bytes, &image.mime_type).await {
        Ok(classification) => classification,
        Err(e) => {
            if let Err(cleanup) = state.image_store.delete(&key).await {
                warn!("Could not remove orphaned image {}: {}", key, cleanup);
            }
            return Err(failed("classifying the image", e));
        }
    };

    if let Err(e) = scratch.close() {
        warn!("Could not remove scratch file: {}", e);
    }

    let item = Clothing::from_classification(id, image_path, classification);
    state.clothing.insert_item(&item).await?;
    state.closets.add_to_closet(user_id, item.id).await?;

    info!(
        "Added {} clothing item {} to closet of user {}",
        item.clothing_type, item.id, user_id
    );
    Ok(item)
}
