use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeFields};
use crate::catalog::dto::ItemSummary;
use crate::error::{AppError, AppResult};

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_LINK_LEN: usize = 255;
/// Column is NUMERIC(5, 2).
pub const PRICE_DECIMAL_PLACES: u32 = 2;

pub fn max_price() -> Decimal {
    Decimal::new(99_999, PRICE_DECIMAL_PLACES)
}

/// Create and update body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeRequest {
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    #[serde(default)]
    pub link: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

impl RecipeRequest {
    pub fn validate(self) -> AppResult<RecipeFields> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }

        let price = self.price.normalize();
        if price.is_sign_negative() && !price.is_zero() {
            return Err(AppError::Validation("price must not be negative".into()));
        }
        if price.scale() > PRICE_DECIMAL_PLACES {
            return Err(AppError::Validation(format!(
                "price must have at most {PRICE_DECIMAL_PLACES} decimal places"
            )));
        }
        if price > max_price() {
            return Err(AppError::Validation(format!("price must be at most {}", max_price())));
        }

        if self.time_minutes < 0 {
            return Err(AppError::Validation("time_minutes must not be negative".into()));
        }

        let link = self.link.unwrap_or_default().trim().to_string();
        if link.chars().count() > MAX_LINK_LEN {
            return Err(AppError::Validation(format!(
                "link must be at most {MAX_LINK_LEN} characters"
            )));
        }

        let tags = dedup(self.tags);
        if tags.is_empty() {
            return Err(AppError::Validation("at least one tag is required".into()));
        }
        let ingredients = dedup(self.ingredients);
        if ingredients.is_empty() {
            return Err(AppError::Validation("at least one ingredient is required".into()));
        }

        let mut price = price;
        price.rescale(PRICE_DECIMAL_PLACES);
        Ok(RecipeFields {
            title,
            price,
            time_minutes: self.time_minutes,
            link,
            tags,
            ingredients,
        })
    }
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out: Vec<Uuid> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[derive(Debug, Serialize)]
pub struct RecipeListItem {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub price: Decimal,
    pub time_minutes: i32,
    pub has_image: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub can_edit: bool,
}

impl RecipeListItem {
    pub fn new(r: Recipe, can_edit: bool) -> Self {
        Self {
            id: r.id,
            title: r.title,
            user_id: r.user_id,
            price: r.price,
            time_minutes: r.time_minutes,
            has_image: r.image.is_some(),
            created_at: r.created_at,
            can_edit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    pub id: Uuid,
    pub title: String,
    pub user_id: Uuid,
    pub price: Decimal,
    pub time_minutes: i32,
    pub link: String,
    pub tags: Vec<ItemSummary>,
    pub ingredients: Vec<ItemSummary>,
    /// Presigned, short-lived URL.
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub can_edit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(price: &str) -> RecipeRequest {
        RecipeRequest {
            title: "  First Recipe ".into(),
            price: Decimal::from_str(price).unwrap(),
            time_minutes: 15,
            link: None,
            tags: vec![Uuid::new_v4()],
            ingredients: vec![Uuid::new_v4()],
        }
    }

    #[test]
    fn valid_request_is_normalized() {
        let fields = request("10.5").validate().unwrap();
        assert_eq!(fields.title, "First Recipe");
        assert_eq!(fields.price.to_string(), "10.50");
        assert_eq!(fields.link, "");
    }

    #[test]
    fn price_bounds() {
        assert!(request("0").validate().is_ok());
        assert!(request("999.99").validate().is_ok());
        assert!(request("1000").validate().is_err());
        assert!(request("-1").validate().is_err());
        assert!(request("1.005").validate().is_err());
        // trailing zeros do not count as extra places
        assert!(request("1.500").validate().is_ok());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut r = request("1");
        r.time_minutes = -5;
        assert!(r.validate().is_err());
    }

    #[test]
    fn tags_and_ingredients_are_required_and_deduplicated() {
        let mut r = request("1");
        r.tags.clear();
        assert!(r.validate().is_err());

        let mut r = request("1");
        r.ingredients.clear();
        assert!(r.validate().is_err());

        let mut r = request("1");
        let t = r.tags[0];
        r.tags = vec![t, t, t];
        assert_eq!(r.validate().unwrap().tags, vec![t]);
    }

    #[test]
    fn long_link_is_rejected() {
        let mut r = request("1");
        r.link = Some("h".repeat(MAX_LINK_LEN + 1));
        assert!(r.validate().is_err());
    }

    #[test]
    fn price_accepts_json_number_or_string() {
        let tag = Uuid::new_v4();
        let ing = Uuid::new_v4();
        let body = format!(
            r#"{{"title":"Soup","price":"12.30","time_minutes":20,"tags":["{tag}"],"ingredients":["{ing}"]}}"#
        );
        let r: RecipeRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(r.price, Decimal::new(1230, 2));

        let body = format!(
            r#"{{"title":"Soup","price":12,"time_minutes":20,"tags":["{tag}"],"ingredients":["{ing}"]}}"#
        );
        let r: RecipeRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(r.price, Decimal::new(12, 0));
    }

    #[test]
    fn owner_and_image_are_not_accepted_in_body() {
        let body = r#"{"title":"Soup","price":"1","time_minutes":1,"tags":[],"ingredients":[],"user_id":"x"}"#;
        assert!(serde_json::from_str::<RecipeRequest>(body).is_err());
        let body = r#"{"title":"Soup","price":"1","time_minutes":1,"tags":[],"ingredients":[],"image":"k"}"#;
        assert!(serde_json::from_str::<RecipeRequest>(body).is_err());
    }
}
