use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// A row in `scheduler_logs` — one entry per sweep, independent of any
/// individual product's `check_runs` rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SchedulerLogRow {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub products_checked: i32,
    pub items_checked: i32,
    pub products_failed: i32,
    pub skipped_reentrant: bool,
    pub metadata: serde_json::Value,
}

/// Records the start of a sweep.
pub async fn start_sweep<'e, E>(executor: E) -> Result<Uuid, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO scheduler_logs (id, started_at, skipped_reentrant)
        VALUES ($1, now(), false)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Records a sweep that was skipped because a previous sweep was still
/// running, per the reentrancy-guard invariant.
pub async fn log_skipped_reentrant<'e, E>(executor: E) -> Result<Uuid, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO scheduler_logs (id, started_at, finished_at, skipped_reentrant)
        VALUES ($1, now(), now(), true)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Closes out a sweep with its final counts. `items_checked` is the total
/// number of tracked items attempted (successes plus failures);
/// `products_checked` is the subset that succeeded. `metadata` carries the
/// per-sweep product ids and error list.
pub async fn finish_sweep<'e, E>(
    executor: E,
    id: Uuid,
    products_checked: i32,
    items_checked: i32,
    products_failed: i32,
    metadata: &serde_json::Value,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE scheduler_logs
        SET finished_at = now(), products_checked = $2, items_checked = $3,
            products_failed = $4, metadata = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(products_checked)
    .bind(items_checked)
    .bind(products_failed)
    .bind(metadata)
    .execute(executor)
    .await?;

    Ok(())
}

/// Lists the most recent sweeps, newest first.
pub async fn list_recent<'e, E>(executor: E, limit: i64) -> Result<Vec<SchedulerLogRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, SchedulerLogRow>(
        r#"SELECT id, started_at, finished_at, products_checked, items_checked,
                  products_failed, skipped_reentrant, metadata
           FROM scheduler_logs
           ORDER BY started_at DESC
           LIMIT $1"#,
    )
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test]
    async fn start_then_finish_records_counts(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let id = start_sweep(&pool).await.unwrap();
        let metadata = serde_json::json!({"productIds": ["a", "b", "c", "d"], "errors": ["d"]});
        finish_sweep(&pool, id, 3, 4, 1, &metadata).await.unwrap();

        let rows = list_recent(&pool, 10).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].products_checked, 3);
        assert_eq!(rows[0].items_checked, 4);
        assert_eq!(rows[0].products_failed, 1);
        assert!(rows[0].finished_at.is_some());
        assert!(!rows[0].skipped_reentrant);
        assert_eq!(rows[0].metadata, metadata);
        Ok(())
    }

    #[sqlx::test]
    async fn skipped_reentrant_sweep_is_closed_immediately(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let id = log_skipped_reentrant(&pool).await.unwrap();

        let rows = list_recent(&pool, 10).await.unwrap();
        assert_eq!(rows[0].id, id);
        assert!(rows[0].skipped_reentrant);
        assert!(rows[0].finished_at.is_some());
        Ok(())
    }

    #[sqlx::test]
    async fn list_recent_orders_newest_first(pool: sqlx::PgPool) -> sqlx::Result<()> {
        let empty_metadata = serde_json::json!({});
        let first = start_sweep(&pool).await.unwrap();
        finish_sweep(&pool, first, 1, 1, 0, &empty_metadata).await.unwrap();
        let second = start_sweep(&pool).await.unwrap();
        finish_sweep(&pool, second, 2, 2, 0, &empty_metadata).await.unwrap();

        let rows = list_recent(&pool, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second);
        assert_eq!(rows[1].id, first);
        Ok(())
    }
}
