use sqlx::PgPool;
use uuid::Uuid;
use watcher_core::shell::ProductShell;
use watcher_db::DbError;
use watcher_extractor::{extract, ExtractionReport};
use watcher_fetcher::{FetchError, Fetcher};
use watcher_ingestion::{IngestionError, IngestionService};

/// Errors surfaced by a single check, already mapped onto the shared error
/// code taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl CheckError {
    pub fn code(&self) -> &'static str {
        match self {
            CheckError::Fetch(err) => err.code(),
            CheckError::Ingestion(err) => err.code(),
            CheckError::Db(err) => err.code(),
        }
    }
}

/// Opens and always closes a `check_runs` row around one product check.
/// Guarantees the row is never left `running` forever: if the coordinator
/// returns early without calling [`CheckRunGuard::complete`], `Drop` spawns
/// a best-effort task to mark the row failed.
struct CheckRunGuard {
    pool: PgPool,
    id: Uuid,
    closed: bool,
}

impl CheckRunGuard {
    async fn open(pool: PgPool, product_id: Uuid) -> Result<Self, CheckError> {
        let id = watcher_db::check_runs::create_check_run(&pool, product_id).await?;
        watcher_db::check_runs::start_check_run(&pool, id).await?;
        Ok(Self {
            pool,
            id,
            closed: false,
        })
    }

    async fn complete(
        mut self,
        fetch_mode: &str,
        metadata: &serde_json::Value,
    ) -> Result<(), CheckError> {
        watcher_db::check_runs::complete_check_run(&self.pool, self.id, fetch_mode, metadata)
            .await?;
        self.closed = true;
        Ok(())
    }

    async fn fail(mut self, code: &str, message: &str) -> Result<(), CheckError> {
        watcher_db::check_runs::fail_check_run(&self.pool, self.id, code, message).await?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for CheckRunGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let pool = self.pool.clone();
        let id = self.id;
        tokio::spawn(async move {
            let _ = watcher_db::check_runs::fail_check_run(
                &pool,
                id,
                "INTERNAL_ERROR",
                "check coordinator dropped without closing the run",
            )
            .await;
        });
    }
}

/// Runs one product check end to end: fetch, extract, ingest, and record
/// the outcome on the run's `check_runs` row.
pub struct CheckCoordinator {
    pool: PgPool,
    fetcher: Fetcher,
}

impl CheckCoordinator {
    pub fn new(pool: PgPool, fetcher: Fetcher) -> Self {
        Self { pool, fetcher }
    }

    /// Runs one product check. On success returns the number of items
    /// (variants) ingested, so a sweep can report `items_checked` for only
    /// the products that actually succeeded.
    pub async fn run_check(&self, product_id: Uuid, url: &str) -> Result<usize, CheckError> {
        let guard = CheckRunGuard::open(self.pool.clone(), product_id).await?;

        match self.run_pipeline(url).await {
            Ok((shell, fetch_mode, report)) => {
                let metadata = serde_json::json!({
                    "modeUsed": fetch_mode,
                    "variantsFound": shell.variants.len(),
                    "notes": report.notes,
                });
                let ingestion = IngestionService::new(self.pool.clone());
                match ingestion.ingest(&shell).await {
                    Ok(outcome) => {
                        let items = outcome.variant_changes.len();
                        guard.complete(fetch_mode, &metadata).await?;
                        Ok(items)
                    }
                    Err(err) => {
                        guard.fail(err.code(), &err.to_string()).await?;
                        Err(CheckError::Ingestion(err))
                    }
                }
            }
            Err(err) => {
                guard.fail(err.code(), &err.to_string()).await?;
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        url: &str,
    ) -> Result<(ProductShell, &'static str, ExtractionReport), CheckError> {
        let fetched = self.fetcher.fetch(url).await?;
        let (shell, report) = extract(&fetched.html, url);

        if report.degraded {
            tracing::warn!(
                url,
                title_source = ?report.title_source,
                price_source = ?report.price_source,
                stock_source = ?report.stock_source,
                "extraction degraded: one or more fields could not be recovered"
            );
        }

        Ok((shell, fetched.metadata.mode.as_str(), report))
    }
}
