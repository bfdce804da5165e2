use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's closet; at most one per user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Closet {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<Uuid>,
}

impl Closet {
    pub fn new(user_id: Uuid) -> Self {
        Closet {
            id: Uuid::now_v7(),
            user_id,
            items: Vec::new(),
        }
    }

    pub fn contains(&self, item_id: Uuid) -> bool {
        self.items.contains(&item_id)
    }
}
