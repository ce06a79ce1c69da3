use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::{mpsc, watch, Mutex};
use uuid::Uuid;

use crate::coordinator::CheckCoordinator;
use crate::state::{SchedulerCommand, SchedulerStatus};
use watcher_fetcher::Fetcher;

/// Errors raised while driving the scheduler itself (as opposed to errors
/// from an individual check, which are recorded on that check's run and do
/// not stop the sweep).
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("database error: {0}")]
    Db(#[from] watcher_db::DbError),
}

/// Handle used by callers (e.g. an HTTP/CLI surface) to interact with a
/// running scheduler without touching its internal state directly.
#[derive(Clone)]
pub struct SchedulerHandle {
    status_rx: watch::Receiver<SchedulerStatus>,
    commands_tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    pub fn status(&self) -> SchedulerStatus {
        self.status_rx.borrow().clone()
    }

    /// Triggers a full sweep immediately, independent of the interval timer.
    pub async fn run_now(&self) {
        let _ = self.commands_tx.send(SchedulerCommand::RunNow).await;
    }

    /// Triggers a single tracked item's check immediately.
    pub async fn run_check(&self, tracked_item_id: Uuid) {
        let _ = self
            .commands_tx
            .send(SchedulerCommand::RunCheck(tracked_item_id))
            .await;
    }
}

/// The long-lived scheduler task. Owns the interval timer, the reentrancy
/// guard, and the channels a [`SchedulerHandle`] talks to it through.
pub struct Scheduler {
    pool: PgPool,
    coordinator: Arc<CheckCoordinator>,
    check_interval: Duration,
    sweep_lock: Arc<Mutex<()>>,
    status_tx: watch::Sender<SchedulerStatus>,
    commands_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    pub fn new(
        pool: PgPool,
        fetcher: Fetcher,
        check_interval: Duration,
    ) -> (Self, SchedulerHandle) {
        let (status_tx, status_rx) = watch::channel(SchedulerStatus::default());
        let (commands_tx, commands_rx) = mpsc::channel(32);

        let coordinator = Arc::new(CheckCoordinator::new(pool.clone(), fetcher));

        let scheduler = Self {
            pool,
            coordinator,
            check_interval,
            sweep_lock: Arc::new(Mutex::new(())),
            status_tx,
            commands_rx,
        };

        let handle = SchedulerHandle {
            status_rx,
            commands_tx,
        };

        (scheduler, handle)
    }

    /// Runs the scheduler loop until `shutdown` resolves. Ticks the
    /// interval timer and drains manual-trigger commands concurrently; a
    /// tick that finds a sweep still in progress logs and skips rather than
    /// queuing.
    pub async fn run(mut self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.spawn_sweep().await;
                }
                Some(command) = self.commands_rx.recv() => {
                    self.handle_command(command).await;
                }
                _ = &mut shutdown => {
                    tracing::info!("scheduler shutting down");
                    break;
                }
            }
        }
    }

    async fn handle_command(&self, command: SchedulerCommand) {
        match command {
            SchedulerCommand::RunNow => self.spawn_sweep().await,
            SchedulerCommand::RunCheck(tracked_item_id) => {
                self.spawn_single_check(tracked_item_id).await;
            }
        }
    }

    async fn spawn_sweep(&self) {
        let Ok(guard) = self.sweep_lock.clone().try_lock_owned() else {
            tracing::warn!("sweep skipped: previous sweep still running");
            let _ = watcher_db::scheduler_logs::log_skipped_reentrant(&self.pool).await;
            return;
        };

        let pool = self.pool.clone();
        let coordinator = self.coordinator.clone();
        let status_tx = self.status_tx.clone();
        let check_interval = self.check_interval;

        tokio::spawn(async move {
            let _guard = guard;
            run_sweep(pool, coordinator, status_tx, check_interval).await;
        });
    }

    async fn spawn_single_check(&self, tracked_item_id: Uuid) {
        let pool = self.pool.clone();
        let coordinator = self.coordinator.clone();

        tokio::spawn(async move {
            match watcher_db::tracked_items::get(&pool, tracked_item_id).await {
                Ok(Some(item)) if item.enabled => {
                    if let Err(err) = coordinator.run_check(item.id, &item.url).await {
                        tracing::error!(tracked_item_id = %tracked_item_id, error = %err, "manual check failed");
                    }
                }
                Ok(_) => {
                    tracing::warn!(tracked_item_id = %tracked_item_id, "manual check requested for unknown or disabled item");
                }
                Err(err) => {
                    tracing::error!(tracked_item_id = %tracked_item_id, error = %err, "failed to load tracked item for manual check");
                }
            }
        });
    }
}

async fn run_sweep(
    pool: PgPool,
    coordinator: Arc<CheckCoordinator>,
    status_tx: watch::Sender<SchedulerStatus>,
    check_interval: Duration,
) {
    let sweep_id = match watcher_db::scheduler_logs::start_sweep(&pool).await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(error = %err, "failed to open scheduler_logs row");
            return;
        }
    };

    status_tx.send_modify(|status| {
        status.is_running = true;
        status.current_sweep_id = Some(sweep_id);
    });

    let items = match watcher_db::tracked_items::list_enabled(&pool).await {
        Ok(items) => items,
        Err(err) => {
            tracing::error!(error = %err, "failed to list tracked items for sweep");
            Vec::new()
        }
    };

    let mut checked = 0i32;
    let mut failed = 0i32;
    let mut items_checked = 0i32;
    let mut product_ids = Vec::new();
    let mut errors = Vec::new();

    for item in items {
        product_ids.push(item.id.to_string());
        match coordinator.run_check(item.id, &item.url).await {
            Ok(item_count) => {
                checked += 1;
                items_checked += item_count as i32;
            }
            Err(err) => {
                failed += 1;
                errors.push(serde_json::json!({
                    "productId": item.id.to_string(),
                    "error": err.to_string(),
                }));
                tracing::error!(product_id = %item.id, error = %err, "check failed during sweep");
            }
        }
    }

    let metadata = serde_json::json!({ "productIds": product_ids, "errors": errors });

    if let Err(err) = watcher_db::scheduler_logs::finish_sweep(
        &pool,
        sweep_id,
        checked,
        items_checked,
        failed,
        &metadata,
    )
    .await
    {
        tracing::error!(error = %err, "failed to close scheduler_logs row");
    }

    let now = Utc::now();
    status_tx.send_modify(|status| {
        status.is_running = false;
        status.current_sweep_id = None;
        status.last_sweep_at = Some(now);
        status.next_sweep_at = chrono::Duration::from_std(check_interval)
            .ok()
            .map(|d| now + d);
    });
}
