use anyhow::Context;
use uuid::Uuid;

use super::{
    dto::RecipeDetails,
    repo,
    repo_types::{Recipe, RecipeFields},
};
use crate::{
    catalog::{repo as catalog_repo, CatalogKind},
    error::{AppError, AppResult},
    images::services::presign_image,
    ingredients::Ingredients,
    state::AppState,
    tags::Tags,
};

/// Every referenced tag and ingredient must exist.
async fn check_links(st: &AppState, fields: &RecipeFields) -> AppResult<()> {
    ensure_all_exist::<Tags>(st, &fields.tags).await?;
    ensure_all_exist::<Ingredients>(st, &fields.ingredients).await
}

async fn ensure_all_exist<K: CatalogKind>(st: &AppState, ids: &[Uuid]) -> AppResult<()> {
    let found = catalog_repo::existing_ids::<K>(&st.db, ids).await?;
    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| id.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "unknown {} id(s): {}",
            K::LABEL.to_lowercase(),
            missing.join(", ")
        )))
    }
}

pub async fn create_recipe(st: &AppState, user_id: Uuid, fields: RecipeFields) -> AppResult<Recipe> {
    check_links(st, &fields).await?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    let recipe = repo::insert_tx(&mut tx, user_id, &fields).await?;
    repo::set_links_tx(&mut tx, recipe.id, &fields.tags, &fields.ingredients).await?;
    tx.commit().await.context("commit tx")?;
    Ok(recipe)
}

pub async fn update_recipe(st: &AppState, id: Uuid, fields: RecipeFields) -> AppResult<Recipe> {
    check_links(st, &fields).await?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    let recipe = repo::update_tx(&mut tx, id, &fields)
        .await?
        .ok_or(AppError::NotFound("Recipe"))?;
    repo::set_links_tx(&mut tx, id, &fields.tags, &fields.ingredients).await?;
    tx.commit().await.context("commit tx")?;
    Ok(recipe)
}

pub async fn recipe_details(st: &AppState, recipe: Recipe, can_edit: bool) -> AppResult<RecipeDetails> {
    let tags = repo::tags_for(&st.db, recipe.id).await?;
    let ingredients = repo::ingredients_for(&st.db, recipe.id).await?;
    let image_url = match recipe.image.as_deref() {
        Some(key) => Some(presign_image(st, key).await?),
        None => None,
    };
    Ok(RecipeDetails {
        id: recipe.id,
        title: recipe.title,
        user_id: recipe.user_id,
        price: recipe.price,
        time_minutes: recipe.time_minutes,
        link: recipe.link,
        tags,
        ingredients,
        image_url,
        created_at: recipe.created_at,
        can_edit,
    })
}
