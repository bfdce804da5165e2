use std::path::PathBuf;
use std::sync::Arc;

use crate::db::{ClosetRepository, ClothingRepository, OutfitRepository, UserRepository};
use crate::services::{
    BackgroundRemover, ClothingClassifier, ImageStore, Mailer, OutfitStylist, WeatherProvider,
};
use crate::utils::jwt::TokenKeys;

/// Shared handles injected into every handler through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub clothing: Arc<dyn ClothingRepository>,
    pub closets: Arc<dyn ClosetRepository>,
    pub outfits: Arc<dyn OutfitRepository>,
    pub background_remover: Arc<dyn BackgroundRemover>,
    pub image_store: Arc<dyn ImageStore>,
    pub classifier: Arc<dyn ClothingClassifier>,
    pub stylist: Arc<dyn OutfitStylist>,
    pub mailer: Arc<dyn Mailer>,
    pub weather: Arc<dyn WeatherProvider>,
    pub tokens: TokenKeys,
    pub settings: Settings,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Base for links mailed to users, without a trailing slash.
    pub public_base_url: String,
    pub frontend_url: String,
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Set when images live on local disk and `/uploads/{key}` serves them.
    pub upload_dir: Option<PathBuf>,
}

/// The four repositories, usually backed by one store.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub clothing: Arc<dyn ClothingRepository>,
    pub closets: Arc<dyn ClosetRepository>,
    pub outfits: Arc<dyn OutfitRepository>,
}

impl Repositories {
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + ClothingRepository + ClosetRepository + OutfitRepository + 'static,
    {
        Repositories {
            users: store.clone(),
            clothing: store.clone(),
            closets: store.clone(),
            outfits: store,
        }
    }
}

pub struct ExternalServices {
    pub background_remover: Arc<dyn BackgroundRemover>,
    pub image_store: Arc<dyn ImageStore>,
    pub classifier: Arc<dyn ClothingClassifier>,
    pub stylist: Arc<dyn OutfitStylist>,
    pub mailer: Arc<dyn Mailer>,
    pub weather: Arc<dyn WeatherProvider>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        services: ExternalServices,
        tokens: TokenKeys,
        settings: Settings,
    ) -> Self {
        AppState {
            users: repositories.users,
            clothing: repositories.clothing,
            closets: repositories.closets,
            outfits: repositories.outfits,
            background_remover: services.background_remover,
            image_store: services.image_store,
            classifier: services.classifier,
            stylist: services.stylist,
            mailer: services.mailer,
            weather: services.weather,
            tokens,
            settings,
        }
    }
}
