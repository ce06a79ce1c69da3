use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `stock_history`. `status` is nullable: the first observation of
/// a variant is recorded even when no stock signal could be recovered for
/// that check, so a channel's history always has at least one row once the
/// variant has been checked.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StockHistoryRow {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub status: Option<String>,
    pub quantity: Option<i32>,
    pub source: String,
    pub captured_at: DateTime<Utc>,
}

/// Inserts a stock observation if it differs from the most recent one for
/// this variant (by status or quantity, `NULL`-aware), mirroring
/// [`crate::price_history::insert_if_changed`]'s atomic CTE shape. A variant
/// with no prior history always inserts, even when `status` is `None`, so
/// the first observation is never silently dropped.
pub async fn insert_if_changed<'e, E>(
    executor: E,
    variant_id: Uuid,
    status: Option<&str>,
    quantity: Option<i32>,
    source: &str,
) -> Result<bool, DbError>
where
    E: PgExecutor<'e>,
{
    let inserted_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        WITH last AS (
            SELECT status, quantity
            FROM stock_history
            WHERE variant_id = $1
            ORDER BY captured_at DESC, id DESC
            LIMIT 1
        )
        INSERT INTO stock_history (id, variant_id, status, quantity, source, captured_at)
        SELECT $2, $1, $3, $4, $5, now()
        WHERE NOT EXISTS (
            SELECT 1 FROM last
            WHERE last.status IS NOT DISTINCT FROM $3
              AND last.quantity IS NOT DISTINCT FROM $4
        )
        RETURNING id
        "#,
    )
    .bind(variant_id)
    .bind(Uuid::new_v4())
    .bind(status)
    .bind(quantity)
    .bind(source)
    .fetch_optional(executor)
    .await?;

    Ok(inserted_id.is_some())
}

/// Returns the most recent stock observation for a variant, if any.
pub async fn get_last<'e, E>(
    executor: E,
    variant_id: Uuid,
) -> Result<Option<StockHistoryRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, StockHistoryRow>(
        r#"SELECT id, variant_id, status, quantity, source, captured_at
           FROM stock_history
           WHERE variant_id = $1
           ORDER BY captured_at DESC, id DESC
           LIMIT 1"#,
    )
    .bind(variant_id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}
