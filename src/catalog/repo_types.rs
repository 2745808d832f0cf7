use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::permissions::Owned;

/// Row shape shared by the `tags` and `ingredients` tables.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CatalogItem {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Owned for CatalogItem {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl std::fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
