use sqlx::PgPool;
use uuid::Uuid;

use super::{repo_types::CatalogItem, CatalogKind};

pub async fn count<K: CatalogKind>(db: &PgPool, owner: Option<Uuid>) -> anyhow::Result<i64> {
    let n: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM {} WHERE ($1::uuid IS NULL OR user_id = $1)",
        K::TABLE
    ))
    .bind(owner)
    .fetch_one(db)
    .await?;
    Ok(n)
}

/// Newest first.
pub async fn list<K: CatalogKind>(
    db: &PgPool,
    owner: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<CatalogItem>> {
    let rows = sqlx::query_as::<_, CatalogItem>(&format!(
        r#"
        SELECT id, name, user_id, created_at
        FROM {}
        WHERE ($1::uuid IS NULL OR user_id = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
        K::TABLE
    ))
    .bind(owner)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find<K: CatalogKind>(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CatalogItem>> {
    let row = sqlx::query_as::<_, CatalogItem>(&format!(
        "SELECT id, name, user_id, created_at FROM {} WHERE id = $1",
        K::TABLE
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert<K: CatalogKind>(db: &PgPool, user_id: Uuid, name: &str) -> anyhow::Result<CatalogItem> {
    let row = sqlx::query_as::<_, CatalogItem>(&format!(
        r#"
        INSERT INTO {} (id, name, user_id)
        VALUES ($1, $2, $3)
        RETURNING id, name, user_id, created_at
        "#,
        K::TABLE
    ))
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn rename<K: CatalogKind>(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Option<CatalogItem>> {
    let row = sqlx::query_as::<_, CatalogItem>(&format!(
        r#"
        UPDATE {} SET name = $2
        WHERE id = $1
        RETURNING id, name, user_id, created_at
        "#,
        K::TABLE
    ))
    .bind(id)
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete<K: CatalogKind>(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", K::TABLE))
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

/// Which of `ids` exist in the table.
pub async fn existing_ids<K: CatalogKind>(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<Uuid> = sqlx::query_scalar(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        K::TABLE
    ))
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
