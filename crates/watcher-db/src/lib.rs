//! Postgres access for the watcher workspace: pool bootstrap, embedded
//! migrations, and one module per table family. Every query function is
//! generic over `impl sqlx::PgExecutor<'_>` so it can run against a bare
//! pool or inside an open transaction.

pub mod check_runs;
pub mod price_history;
pub mod products;
pub mod scheduler_logs;
pub mod stock_history;
pub mod tracked_items;
pub mod variants;

pub use check_runs::{CheckRunRow, CheckRunStatus};
pub use price_history::PriceHistoryRow;
pub use products::ProductRow;
pub use scheduler_logs::SchedulerLogRow;
pub use stock_history::StockHistoryRow;
pub use tracked_items::TrackedItemRow;
pub use variants::VariantRow;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Errors raised by the database layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[source] sqlx::migrate::MigrateError),
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("expected row not found or already transitioned")]
    NotFound,
}

impl DbError {
    /// Stable machine-readable error code for logs and downstream consumers.
    pub fn code(&self) -> &'static str {
        match self {
            DbError::Connect(_) | DbError::Migrate(_) => "INTERNAL_ERROR",
            DbError::Query(_) | DbError::NotFound => "INGESTION_FAILED",
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Query(err)
    }
}

/// Pool sizing knobs, separated from [`watcher_core::AppConfig`] so this
/// crate stays decoupled from the rest of the workspace's configuration
/// surface.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// Opens a connection pool against `database_url`.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(DbError::Connect)
}

/// Opens a connection pool using `DATABASE_URL` from the environment.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = std::env::var("DATABASE_URL").map_err(|_| {
        DbError::Connect(sqlx::Error::Configuration(
            "DATABASE_URL is not set".into(),
        ))
    })?;
    connect_pool(&database_url, PoolConfig::default()).await
}

/// Applies all embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await.map_err(DbError::Migrate)
}

/// Lightweight connectivity check (`SELECT 1`).
pub async fn ping(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(DbError::Query)?;
    Ok(())
}

/// Returns `true` when the pool can serve a trivial query.
pub async fn health_check(pool: &PgPool) -> bool {
    ping(pool).await.is_ok()
}
