use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::CatalogItem;
use crate::error::{AppError, AppResult};

pub const MAX_NAME_LEN: usize = 255;

/// Create and update body. The owner never comes from the client.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemRequest {
    pub name: String,
}

impl ItemRequest {
    pub fn validated_name(&self) -> AppResult<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFilter {
    /// Only the caller's own records.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Whether the caller may edit or delete this record.
    pub can_edit: bool,
}

impl ItemResponse {
    pub fn new(item: CatalogItem, can_edit: bool) -> Self {
        Self {
            id: item.id,
            name: item.name,
            user_id: item.user_id,
            created_at: item.created_at,
            can_edit,
        }
    }
}

/// Compact form embedded in recipe details.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ItemSummary {
    pub id: Uuid,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str) -> ItemRequest {
        ItemRequest { name: name.into() }
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(req("  Vegan ").validated_name().unwrap(), "Vegan");
    }

    #[test]
    fn blank_or_long_names_are_rejected() {
        assert!(req("   ").validated_name().is_err());
        assert!(req(&"x".repeat(MAX_NAME_LEN)).validated_name().is_ok());
        assert!(req(&"x".repeat(MAX_NAME_LEN + 1)).validated_name().is_err());
    }

    #[test]
    fn owner_cannot_be_supplied() {
        let body = r#"{"name": "Salt", "user_id": "6f2c1a9e-4c1b-4f7e-9a55-0d3f5d8f3b10"}"#;
        assert!(serde_json::from_str::<ItemRequest>(body).is_err());
    }
}
