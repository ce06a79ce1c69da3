use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `tracked_items`. This table is owned externally (by whatever
/// configures which products to watch); this crate only ever reads from it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrackedItemRow {
    pub id: Uuid,
    pub url: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Lists every enabled tracked item, the working set for a sweep.
pub async fn list_enabled<'e, E>(executor: E) -> Result<Vec<TrackedItemRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, TrackedItemRow>(
        r#"SELECT id, url, enabled, created_at
           FROM tracked_items
           WHERE enabled = true
           ORDER BY created_at ASC"#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Fetches a single tracked item by id, for the manual `runCheck(productId)`
/// trigger path.
pub async fn get<'e, E>(executor: E, id: Uuid) -> Result<Option<TrackedItemRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, TrackedItemRow>(
        r#"SELECT id, url, enabled, created_at FROM tracked_items WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn list_enabled_excludes_disabled_rows(pool: sqlx::PgPool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO tracked_items (id, url, enabled, created_at) VALUES ($1, $2, true, now())",
        )
        .bind(Uuid::new_v4())
        .bind("https://example.com/a")
        .execute(&pool)
        .await?;
        sqlx::query(
            "INSERT INTO tracked_items (id, url, enabled, created_at) VALUES ($1, $2, false, now())",
        )
        .bind(Uuid::new_v4())
        .bind("https://example.com/b")
        .execute(&pool)
        .await?;

        let rows = list_enabled(&pool).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].url, "https://example.com/a");
        Ok(())
    }

    #[sqlx::test]
    async fn get_returns_none_for_unknown_id(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let row = get(&pool, Uuid::new_v4()).await.unwrap();
        assert!(row.is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn get_returns_the_matching_row(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO tracked_items (id, url, enabled, created_at) VALUES ($1, $2, true, now())",
        )
        .bind(id)
        .bind("https://example.com/a")
        .execute(&pool)
        .await?;

        let row = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(row.url, "https://example.com/a");
        Ok(())
    }
}
