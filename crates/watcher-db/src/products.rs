use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `products`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub canonical_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub vendor: Option<String>,
    pub images: serde_json::Value,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a product by `canonical_url`, returning its id. Safe to call
/// inside a transaction via `&mut *tx`. On conflict, every identity field is
/// overwritten with the freshly observed values, matching the "update any
/// changed identity fields" rule for subsequent observations.
pub async fn upsert_product<'e, E>(
    executor: E,
    canonical_url: &str,
    title: Option<&str>,
    description: Option<&str>,
    vendor: Option<&str>,
    images: &serde_json::Value,
    metadata: &serde_json::Value,
) -> Result<Uuid, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (id, canonical_url, title, description, vendor, images, metadata, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
        ON CONFLICT (canonical_url) DO UPDATE
        SET title = EXCLUDED.title,
            description = EXCLUDED.description,
            vendor = EXCLUDED.vendor,
            images = EXCLUDED.images,
            metadata = EXCLUDED.metadata,
            updated_at = now()
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(canonical_url)
    .bind(title)
    .bind(description)
    .bind(vendor)
    .bind(images)
    .bind(metadata)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Fetches a product by its canonical URL.
pub async fn get_product_by_url<'e, E>(
    executor: E,
    canonical_url: &str,
) -> Result<Option<ProductRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        r#"SELECT id, canonical_url, title, description, vendor, images, metadata, created_at, updated_at
           FROM products WHERE canonical_url = $1"#,
    )
    .bind(canonical_url)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Fetches a product by id.
pub async fn get_product<'e, E>(executor: E, id: Uuid) -> Result<Option<ProductRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ProductRow>(
        r#"SELECT id, canonical_url, title, description, vendor, images, metadata, created_at, updated_at
           FROM products WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}
