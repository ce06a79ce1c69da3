use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `product_variants`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: Option<String>,
    pub attributes: serde_json::Value,
    pub current_price: Option<Decimal>,
    pub current_currency: Option<String>,
    pub current_stock_status: Option<String>,
    pub is_available: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Finds a variant by SKU within a product, when the SKU is known.
pub async fn find_by_sku<'e, E>(
    executor: E,
    product_id: Uuid,
    sku: &str,
) -> Result<Option<VariantRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VariantRow>(
        r#"SELECT id, product_id, sku, attributes, current_price, current_currency,
                  current_stock_status, is_available, created_at, updated_at
           FROM product_variants WHERE product_id = $1 AND sku = $2"#,
    )
    .bind(product_id)
    .bind(sku)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Finds a variant by its normalized attribute map, used when no SKU is
/// present. Relies on the `UNIQUE (product_id, attributes)` constraint for
/// jsonb deep-equality matching regardless of key order.
pub async fn find_by_attributes<'e, E>(
    executor: E,
    product_id: Uuid,
    attributes: &serde_json::Value,
) -> Result<Option<VariantRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, VariantRow>(
        r#"SELECT id, product_id, sku, attributes, current_price, current_currency,
                  current_stock_status, is_available, created_at, updated_at
           FROM product_variants WHERE product_id = $1 AND attributes = $2"#,
    )
    .bind(product_id)
    .bind(attributes)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Inserts a new variant row, returning its id.
pub async fn insert_variant<'e, E>(
    executor: E,
    product_id: Uuid,
    sku: Option<&str>,
    attributes: &serde_json::Value,
) -> Result<Uuid, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO product_variants (id, product_id, sku, attributes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, now(), now())
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(sku)
    .bind(attributes)
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Updates the current-value columns on a variant after a new observation.
/// Always the last write of a check, once history has been appended.
/// `is_available` is the caller's pre-derived value (per spec: `true` for
/// `in_stock`, `false` for `out_of_stock`, `null` otherwise) rather than
/// something this layer derives from `stock_status` itself, keeping the
/// status-vocabulary logic in one place (`watcher_core::stock`).
pub async fn update_current_values<'e, E>(
    executor: E,
    variant_id: Uuid,
    price: Option<Decimal>,
    currency: Option<&str>,
    stock_status: Option<&str>,
    is_available: Option<bool>,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE product_variants
        SET current_price = $2,
            current_currency = $3,
            current_stock_status = $4,
            is_available = $5,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(variant_id)
    .bind(price)
    .bind(currency)
    .bind(stock_status)
    .bind(is_available)
    .execute(executor)
    .await?;

    Ok(())
}
