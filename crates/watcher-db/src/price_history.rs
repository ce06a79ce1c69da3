use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `price_history`. `amount`/`currency` are nullable: the first
/// observation of a variant is recorded even when no price could be
/// recovered for that check, so a channel's history always has at least
/// one row once the variant has been checked.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// Inserts a price observation if it differs from the most recent one for
/// this variant (by amount or currency, `NULL`-aware), via a single atomic
/// CTE. This avoids a separate read-then-compare-then-write race: two
/// concurrent checks for the same variant cannot both decide "unchanged"
/// against a stale read and then both insert. A variant with no prior
/// history always inserts, even when `amount`/`currency` are both `None`,
/// so the first observation is never silently dropped.
pub async fn insert_if_changed<'e, E>(
    executor: E,
    variant_id: Uuid,
    amount: Option<Decimal>,
    currency: Option<&str>,
) -> Result<bool, DbError>
where
    E: PgExecutor<'e>,
{
    let inserted_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        WITH last AS (
            SELECT amount, currency
            FROM price_history
            WHERE variant_id = $1
            ORDER BY captured_at DESC, id DESC
            LIMIT 1
        )
        INSERT INTO price_history (id, variant_id, amount, currency, captured_at)
        SELECT $2, $1, $3, $4, now()
        WHERE NOT EXISTS (
            SELECT 1 FROM last
            WHERE last.amount IS NOT DISTINCT FROM $3
              AND last.currency IS NOT DISTINCT FROM $4
        )
        RETURNING id
        "#,
    )
    .bind(variant_id)
    .bind(Uuid::new_v4())
    .bind(amount)
    .bind(currency)
    .fetch_optional(executor)
    .await?;

    Ok(inserted_id.is_some())
}

/// Returns the most recent price observation for a variant, if any.
pub async fn get_last<'e, E>(
    executor: E,
    variant_id: Uuid,
) -> Result<Option<PriceHistoryRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, PriceHistoryRow>(
        r#"SELECT id, variant_id, amount, currency, captured_at
           FROM price_history
           WHERE variant_id = $1
           ORDER BY captured_at DESC, id DESC
           LIMIT 1"#,
    )
    .bind(variant_id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}
