use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::permissions::Owned;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: String,
    /// Storage key of the uploaded image.
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Owned for Recipe {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Validated column values for insert and update.
#[derive(Debug, Clone)]
pub struct RecipeFields {
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}
