use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::{ClosetRepository, ClothingRepository, DbError, OutfitRepository, UserRepository};
use crate::models::closet::Closet;
use crate::models::clothing::{Clothing, ClothingType, Temperature};
use crate::models::outfit::Outfit;
use crate::models::user::{GeoPoint, PersonName, User};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

fn map_unique(err: sqlx::Error, what: &str) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict(what.to_string()),
        _ => DbError::Sqlx(err),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
    password: String,
    longitude: f64,
    latitude: f64,
    verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.user_id,
            name: PersonName {
                first: row.first_name,
                last: row.last_name,
            },
            username: row.username,
            email: row.email,
            password: row.password,
            geolocation: GeoPoint::new(row.longitude, row.latitude),
            verified: row.verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "user_id, first_name, last_name, username, email, password, \
     longitude, latitude, verified, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ClothingRow {
    clothing_id: Uuid,
    image_path: String,
    clothing_type: String,
    primary_color: String,
    secondary_color: Option<String>,
    other_colors: Vec<String>,
    material: String,
    temperature: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClothingRow> for Clothing {
    type Error = DbError;

    fn try_from(row: ClothingRow) -> Result<Self, Self::Error> {
        Ok(Clothing {
            id: row.clothing_id,
            image_path: row.image_path,
            clothing_type: row
                .clothing_type
                .parse::<ClothingType>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            primary_color: row.primary_color,
            secondary_color: row.secondary_color,
            other_colors: row.other_colors,
            material: row.material,
            temperature: row
                .temperature
                .parse::<Temperature>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

const CLOTHING_COLUMNS: &str = "clothing_id, image_path, clothing_type, primary_color, \
     secondary_color, other_colors, material, temperature, description, created_at";

#[derive(sqlx::FromRow)]
struct ClosetRow {
    closet_id: Uuid,
    user_id: Uuid,
    items: Vec<Uuid>,
}

impl From<ClosetRow> for Closet {
    fn from(row: ClosetRow) -> Self {
        Closet {
            id: row.closet_id,
            user_id: row.user_id,
            items: row.items,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OutfitRow {
    outfit_id: Uuid,
    user_id: Uuid,
    items: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<OutfitRow> for Outfit {
    fn from(row: OutfitRow) -> Self {
        Outfit {
            id: row.outfit_id,
            user_id: row.user_id,
            items: row.items,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, user: &User) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO users (user_id, first_name, last_name, username, email, password, \
             longitude, latitude, verified, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(user.id)
        .bind(&user.name.first)
        .bind(&user.name.last)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.geolocation.longitude())
        .bind(user.geolocation.latitude())
        .bind(user.verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Username or email"))?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, DbError> {
        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users \
             WHERE (username = $1 OR email = $2) AND ($3::uuid IS NULL OR user_id <> $3))",
        )
        .bind(username)
        .bind(email)
        .bind(excluding)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken.0)
    }

    async fn update_user(&self, user: &User) -> Result<(), DbError> {
        sqlx::query(
            "UPDATE users SET first_name = $1, last_name = $2, username = $3, email = $4, \
             password = $5, longitude = $6, latitude = $7, verified = $8, updated_at = $9 \
             WHERE user_id = $10",
        )
        .bind(&user.name.first)
        .bind(&user.name.last)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.geolocation.longitude())
        .bind(user.geolocation.latitude())
        .bind(user.verified)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, "Username or email"))?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ClothingRepository for PgStore {
    async fn insert_item(&self, item: &Clothing) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO clothing (clothing_id, image_path, clothing_type, primary_color, \
             secondary_color, other_colors, material, temperature, description, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(item.id)
        .bind(&item.image_path)
        .bind(item.clothing_type.as_str())
        .bind(&item.primary_color)
        .bind(&item.secondary_color)
        .bind(&item.other_colors)
        .bind(&item.material)
        .bind(item.temperature.as_str())
        .bind(&item.description)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<Clothing>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ClothingRow>(&format!(
            "SELECT {} FROM clothing WHERE clothing_id = ANY($1)",
            CLOTHING_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items = rows
            .into_iter()
            .map(Clothing::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        items.sort_by_key(|item| ids.iter().position(|id| *id == item.id));
        Ok(items)
    }

    async fn set_item_type(
        &self,
        id: Uuid,
        clothing_type: ClothingType,
    ) -> Result<Option<Clothing>, DbError> {
        let row = sqlx::query_as::<_, ClothingRow>(&format!(
            "UPDATE clothing SET clothing_type = $1 WHERE clothing_id = $2 RETURNING {}",
            CLOTHING_COLUMNS
        ))
        .bind(clothing_type.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Clothing::try_from).transpose()
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM clothing WHERE clothing_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_items(&self, ids: &[Uuid]) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM clothing WHERE clothing_id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ClosetRepository for PgStore {
    async fn find_closet(&self, user_id: Uuid) -> Result<Option<Closet>, DbError> {
        let row = sqlx::query_as::<_, ClosetRow>(
            "SELECT closet_id, user_id, items FROM closets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Closet::from))
    }

    async fn add_to_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<Closet, DbError> {
        let row = sqlx::query_as::<_, ClosetRow>(
            "INSERT INTO closets (closet_id, user_id, items) VALUES ($1, $2, ARRAY[$3]::uuid[]) \
             ON CONFLICT (user_id) DO UPDATE SET items = array_append(closets.items, $3) \
             RETURNING closet_id, user_id, items",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn remove_from_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE closets SET items = array_remove(items, $2) \
             WHERE user_id = $1 AND $2 = ANY(items)",
        )
        .bind(user_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_closet(&self, user_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM closets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OutfitRepository for PgStore {
    async fn insert_outfit(&self, outfit: &Outfit) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO outfits (outfit_id, user_id, items, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(outfit.id)
        .bind(outfit.user_id)
        .bind(&outfit.items)
        .bind(outfit.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_outfits(&self, user_id: Uuid) -> Result<Vec<Outfit>, DbError> {
        let rows = sqlx::query_as::<_, OutfitRow>(
            "SELECT outfit_id, user_id, items, created_at FROM outfits \
             WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Outfit::from).collect())
    }

    async fn delete_outfit(&self, user_id: Uuid, outfit_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM outfits WHERE outfit_id = $1 AND user_id = $2")
            .bind(outfit_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_outfits(&self, user_id: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM outfits WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
