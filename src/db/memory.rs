use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ClosetRepository, ClothingRepository, DbError, OutfitRepository, UserRepository};
use crate::models::closet::Closet;
use crate::models::clothing::{Clothing, ClothingType};
use crate::models::outfit::Outfit;
use crate::models::user::User;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    clothing: HashMap<Uuid, Clothing>,
    closets: HashMap<Uuid, Closet>,
    outfits: Vec<Outfit>,
}

/// Process-local store with the same contract as the PostgreSQL one.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means another test thread panicked mid-write.
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }

    pub fn clothing_count(&self) -> usize {
        self.tables().clothing.len()
    }
}

fn clashes(existing: &User, username: &str, email: &str) -> bool {
    existing.username == username || existing.email == email
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), DbError> {
        let mut tables = self.tables();
        if tables
            .users
            .values()
            .any(|u| clashes(u, &user.username, &user.email))
        {
            return Err(DbError::Conflict("Username or email".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn identity_taken(
        &self,
        username: &str,
        email: &str,
        excluding: Option<Uuid>,
    ) -> Result<bool, DbError> {
        Ok(self
            .tables()
            .users
            .values()
            .filter(|u| Some(u.id) != excluding)
            .any(|u| clashes(u, username, email)))
    }

    async fn update_user(&self, user: &User) -> Result<(), DbError> {
        let mut tables = self.tables();
        if tables
            .users
            .values()
            .filter(|u| u.id != user.id)
            .any(|u| clashes(u, &user.username, &user.email))
        {
            return Err(DbError::Conflict("Username or email".to_string()));
        }
        if let Some(existing) = tables.users.get_mut(&user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, DbError> {
        let mut tables = self.tables();
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.closets.remove(&id);
            tables.outfits.retain(|o| o.user_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ClothingRepository for MemoryStore {
    async fn insert_item(&self, item: &Clothing) -> Result<(), DbError> {
        self.tables().clothing.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_items(&self, ids: &[Uuid]) -> Result<Vec<Clothing>, DbError> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.clothing.get(id).cloned())
            .collect())
    }

    async fn set_item_type(
        &self,
        id: Uuid,
        clothing_type: ClothingType,
    ) -> Result<Option<Clothing>, DbError> {
        let mut tables = self.tables();
        Ok(tables.clothing.get_mut(&id).map(|item| {
            item.clothing_type = clothing_type;
            item.clone()
        }))
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, DbError> {
        Ok(self.tables().clothing.remove(&id).is_some())
    }

    async fn delete_items(&self, ids: &[Uuid]) -> Result<u64, DbError> {
        let mut tables = self.tables();
        Ok(ids
            .iter()
            .filter(|id| tables.clothing.remove(id).is_some())
            .count() as u64)
    }
}

#[async_trait]
impl ClosetRepository for MemoryStore {
    async fn find_closet(&self, user_id: Uuid) -> Result<Option<Closet>, DbError> {
        Ok(self.tables().closets.get(&user_id).cloned())
    }

    async fn add_to_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<Closet, DbError> {
        let mut tables = self.tables();
        let closet = tables
            .closets
            .entry(user_id)
            .or_insert_with(|| Closet::new(user_id));
        closet.items.push(item_id);
        Ok(closet.clone())
    }

    async fn remove_from_closet(&self, user_id: Uuid, item_id: Uuid) -> Result<bool, DbError> {
        let mut tables = self.tables();
        match tables.closets.get_mut(&user_id) {
            Some(closet) if closet.contains(item_id) => {
                closet.items.retain(|id| *id != item_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_closet(&self, user_id: Uuid) -> Result<bool, DbError> {
        Ok(self.tables().closets.remove(&user_id).is_some())
    }
}

#[async_trait]
impl OutfitRepository for MemoryStore {
    async fn insert_outfit(&self, outfit: &Outfit) -> Result<(), DbError> {
        self.tables().outfits.push(outfit.clone());
        Ok(())
    }

    async fn list_outfits(&self, user_id: Uuid) -> Result<Vec<Outfit>, DbError> {
        Ok(self
            .tables()
            .outfits
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_outfit(&self, user_id: Uuid, outfit_id: Uuid) -> Result<bool, DbError> {
        let mut tables = self.tables();
        let before = tables.outfits.len();
        tables
            .outfits
            .retain(|o| !(o.id == outfit_id && o.user_id == user_id));
        Ok(tables.outfits.len() < before)
    }

    async fn delete_outfits(&self, user_id: Uuid) -> Result<u64, DbError> {
        let mut tables = self.tables();
        let before = tables.outfits.len();
        tables.outfits.retain(|o| o.user_id != user_id);
        Ok((before - tables.outfits.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{GeoPoint, PersonName};
    use chrono::Utc;

    fn user(username: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            name: PersonName {
                first: "Test".to_string(),
                last: "User".to_string(),
            },
            username: username.to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            geolocation: GeoPoint::new(0.0, 0.0),
            verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(&user("alice", "a@example.com")).await.unwrap();

        let same_name = store.create_user(&user("alice", "other@example.com")).await;
        let same_email = store.create_user(&user("bob", "a@example.com")).await;

        assert!(matches!(same_name, Err(DbError::Conflict(_))));
        assert!(matches!(same_email, Err(DbError::Conflict(_))));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn identity_check_ignores_excluded_user() {
        let store = MemoryStore::new();
        let alice = user("alice", "a@example.com");
        store.create_user(&alice).await.unwrap();

        assert!(store.identity_taken("alice", "x@example.com", None).await.unwrap());
        assert!(!store
            .identity_taken("alice", "a@example.com", Some(alice.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn closet_is_created_lazily_and_removal_reports_membership() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let first = Uuid::now_v7();
        let second = Uuid::now_v7();

        assert!(store.find_closet(owner).await.unwrap().is_none());
        store.add_to_closet(owner, first).await.unwrap();
        let closet = store.add_to_closet(owner, second).await.unwrap();
        assert_eq!(closet.items, vec![first, second]);

        assert!(!store.remove_from_closet(owner, Uuid::now_v7()).await.unwrap());
        assert!(store.remove_from_closet(owner, first).await.unwrap());
        assert_eq!(store.find_closet(owner).await.unwrap().unwrap().items, vec![second]);
    }

    #[tokio::test]
    async fn outfits_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::now_v7();
        let outfit = Outfit::new(owner, vec![Uuid::now_v7()]);
        store.insert_outfit(&outfit).await.unwrap();

        assert!(!store.delete_outfit(Uuid::now_v7(), outfit.id).await.unwrap());
        assert_eq!(store.list_outfits(owner).await.unwrap().len(), 1);
        assert!(store.delete_outfit(owner, outfit.id).await.unwrap());
        assert!(store.list_outfits(owner).await.unwrap().is_empty());
    }
}
