use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::DbError;

/// Lifecycle state of a `check_runs` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl CheckRunStatus {
    fn as_str(self) -> &'static str {
        match self {
            CheckRunStatus::Pending => "pending",
            CheckRunStatus::Running => "running",
            CheckRunStatus::Succeeded => "succeeded",
            CheckRunStatus::Failed => "failed",
        }
    }
}

/// A row in `check_runs`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CheckRunRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub status: String,
    pub fetch_mode: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Opens a new check run in `pending` state, returning its id.
pub async fn create_check_run<'e, E>(executor: E, product_id: Uuid) -> Result<Uuid, DbError>
where
    E: PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO check_runs (id, product_id, status, created_at)
        VALUES ($1, $2, $3, now())
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(CheckRunStatus::Pending.as_str())
    .fetch_one(executor)
    .await?;

    Ok(id)
}

/// Transitions a run from `pending` to `running`, stamping `started_at`.
/// Guards the transition with a `WHERE status = 'pending'` predicate and
/// treats zero affected rows as a state-machine violation, rather than
/// reading the row first and writing separately.
pub async fn start_check_run<'e, E>(executor: E, id: Uuid) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE check_runs
        SET status = $2, started_at = now()
        WHERE id = $1 AND status = $3
        "#,
    )
    .bind(id)
    .bind(CheckRunStatus::Running.as_str())
    .bind(CheckRunStatus::Pending.as_str())
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a run `succeeded`, stamping `finished_at`. Does not require the run
/// to still be `running` — a guard's `Drop` path may race with an explicit
/// completion call, and completion should win either way. `metadata` carries
/// the mode used, variants found, and extraction notes for this check.
pub async fn complete_check_run<'e, E>(
    executor: E,
    id: Uuid,
    fetch_mode: &str,
    metadata: &serde_json::Value,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE check_runs
        SET status = $2, fetch_mode = $3, metadata = $4, finished_at = now()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(CheckRunStatus::Succeeded.as_str())
    .bind(fetch_mode)
    .bind(metadata)
    .execute(executor)
    .await?;

    Ok(())
}

/// Marks a run `failed` with a structured error code and message.
pub async fn fail_check_run<'e, E>(
    executor: E,
    id: Uuid,
    error_code: &str,
    error_message: &str,
) -> Result<(), DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE check_runs
        SET status = $2, error_code = $3, error_message = $4, finished_at = now()
        WHERE id = $1 AND finished_at IS NULL
        "#,
    )
    .bind(id)
    .bind(CheckRunStatus::Failed.as_str())
    .bind(error_code)
    .bind(error_message)
    .execute(executor)
    .await?;

    Ok(())
}

/// Fetches a single check run by id.
pub async fn get_check_run<'e, E>(executor: E, id: Uuid) -> Result<Option<CheckRunRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, CheckRunRow>(
        r#"SELECT id, product_id, status, fetch_mode, error_code, error_message,
                  started_at, finished_at, metadata, created_at
           FROM check_runs WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Lists the most recent check runs for a product, newest first.
pub async fn list_check_runs<'e, E>(
    executor: E,
    product_id: Uuid,
    limit: i64,
) -> Result<Vec<CheckRunRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, CheckRunRow>(
        r#"SELECT id, product_id, status, fetch_mode, error_code, error_message,
                  started_at, finished_at, metadata, created_at
           FROM check_runs
           WHERE product_id = $1
           ORDER BY created_at DESC
           LIMIT $2"#,
    )
    .bind(product_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
