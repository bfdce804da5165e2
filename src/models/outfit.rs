use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Saved selection of clothing ids. The ids are not checked against the clothing table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Outfit {
    pub fn new(user_id: Uuid, items: Vec<Uuid>) -> Self {
        Outfit {
            id: Uuid::now_v7(),
            user_id,
            items,
            created_at: Utc::now(),
        }
    }
}
