use anyhow::Context;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeFields};
use crate::catalog::dto::ItemSummary;

const RECIPE_COLUMNS: &str = "id, title, user_id, price, time_minutes, link, image, created_at";

pub async fn count(db: &PgPool, owner: Option<Uuid>) -> anyhow::Result<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes WHERE ($1::uuid IS NULL OR user_id = $1)")
        .bind(owner)
        .fetch_one(db)
        .await?;
    Ok(n)
}

/// Newest first.
pub async fn list(db: &PgPool, owner: Option<Uuid>, limit: i64, offset: i64) -> anyhow::Result<Vec<Recipe>> {
    let rows = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes
        WHERE ($1::uuid IS NULL OR user_id = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let row = sqlx::query_as::<_, Recipe>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<Recipe> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        INSERT INTO recipes (id, title, user_id, price, time_minutes, link)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&fields.title)
    .bind(user_id)
    .bind(fields.price)
    .bind(fields.time_minutes)
    .bind(&fields.link)
    .fetch_one(&mut **tx)
    .await
    .context("insert recipe")?;
    Ok(recipe)
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    fields: &RecipeFields,
) -> anyhow::Result<Option<Recipe>> {
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        r#"
        UPDATE recipes
           SET title = $2, price = $3, time_minutes = $4, link = $5
         WHERE id = $1
        RETURNING {RECIPE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&fields.title)
    .bind(fields.price)
    .bind(fields.time_minutes)
    .bind(&fields.link)
    .fetch_optional(&mut **tx)
    .await
    .context("update recipe")?;
    Ok(recipe)
}

/// Replaces the recipe's tag and ingredient sets.
pub async fn set_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tags: &[Uuid],
    ingredients: &[Uuid],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe tags")?;
    sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(recipe_id)
        .bind(tags)
        .execute(&mut **tx)
        .await
        .context("link recipe tags")?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe ingredients")?;
    sqlx::query("INSERT INTO recipe_ingredients (recipe_id, ingredient_id) SELECT $1, UNNEST($2::uuid[])")
        .bind(recipe_id)
        .bind(ingredients)
        .execute(&mut **tx)
        .await
        .context("link recipe ingredients")?;
    Ok(())
}

/// Stores a new image key under a row lock and returns the updated row with
/// the key it replaced.
pub async fn replace_image(
    db: &PgPool,
    id: Uuid,
    key: &str,
) -> anyhow::Result<Option<(Recipe, Option<String>)>> {
    let mut tx = db.begin().await.context("begin tx")?;
    let previous: Option<Option<String>> =
        sqlx::query_scalar("SELECT image FROM recipes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .context("lock recipe")?;
    let Some(previous) = previous else {
        return Ok(None);
    };
    let recipe = sqlx::query_as::<_, Recipe>(&format!(
        "UPDATE recipes SET image = $2 WHERE id = $1 RETURNING {RECIPE_COLUMNS}"
    ))
    .bind(id)
    .bind(key)
    .fetch_one(&mut *tx)
    .await
    .context("set recipe image")?;
    tx.commit().await.context("commit tx")?;
    Ok(Some((recipe, previous)))
}

/// Deletes the recipe (links cascade) and returns the removed row.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
    let row = sqlx::query_as::<_, Recipe>(&format!("DELETE FROM recipes WHERE id = $1 RETURNING {RECIPE_COLUMNS}"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn tags_for(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<ItemSummary>> {
    let rows = sqlx::query_as::<_, ItemSummary>(
        r#"
        SELECT t.id, t.name
          FROM tags t
          JOIN recipe_tags rt ON rt.tag_id = t.id
         WHERE rt.recipe_id = $1
         ORDER BY t.name ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn ingredients_for(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<ItemSummary>> {
    let rows = sqlx::query_as::<_, ItemSummary>(
        r#"
        SELECT i.id, i.name
          FROM ingredients i
          JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
         WHERE ri.recipe_id = $1
         ORDER BY i.name ASC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
