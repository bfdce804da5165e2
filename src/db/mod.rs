//! Storage ports and their PostgreSQL / in-memory implementations.
//!
//! Handlers only see the traits in this module, so the HTTP layer can run
//! against [`MemoryStore`] in tests and [`PgStore`] in production.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::closet::Closet;
use crate::models::clothing::{Clothing, ClothingType};
use crate::models::outfit::Outfit;
use crate::models::user::User;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0} already exists")]
    Conflict(String),

    #[error("stored row is invalid: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`DbError::Conflict`] when the username or email is taken.
    async fn create_user(&self, user: &User) -> Result<(), DbError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DbError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
    /// True when another user (not `excluding`) already owns the username or email.
    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, DbError>;
    async fn update_user(&self, user: &User) -> Result<(), DbError>;
    async fn delete_user(&self, id: Uuid) -> Result<bool, DbError>;
}

#[async_trait]
pub trait ClothingRepository: Send + Sync {
    async fn insert_item(&self, item: &Clothing) -> Result<(), DbError>;
    /// Returns the items that exist, in the order of `ids`.
    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<Clothing>, DbError>;
    async fn set_item_type(
        &self,
        id: Uuid,
        clothing_type: ClothingType,
    ) -> Result<Option<Clothing>, DbError>;
    async fn delete_item(&self, id: Uuid) -> Result<bool, DbError>;
    async fn delete_items(&self, ids: &[Uuid]) -> Result<u64, DbError>;
}

#[async_trait]
pub trait ClosetRepository: Send + Sync {
    async fn find_closet(&self, user_id: Uuid) -> Result<Option<Closet>, DbError>;
    /// Appends `item_id`, creating the closet on first use.
    async fn add_to_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<Closet, DbError>;
    /// Returns false, changing nothing, when `item_id` is not in the user's closet.
    async fn remove_from_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DbError>;
    async fn delete_closet(&self, user_id: Uuid) -> Result<bool, DbError>;
}

#[async_trait]
pub trait OutfitRepository: Send + Sync {
    async fn insert_outfit(&self, outfit: &Outfit) -> Result<(), DbError>;
    async fn list_outfits(&self, user_id: Uuid) -> Result<Vec<Outfit>, DbError>;
    async fn delete_outfit(&self, user_id: Uuid, outfit_id: Uuid) -> Result<bool, DbError>;
    async fn delete_outfits(&self, user_id: Uuid) -> Result<u64, DbError>;
}
