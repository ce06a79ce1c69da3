use std::time::Duration;

use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;
use watcher_core::config::load_app_config_from_env;
use watcher_fetcher::Fetcher;
use watcher_scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_app_config_from_env()?;
    tracing::info!(?config, "starting watcher daemon");

    let pool = watcher_db::connect_pool(&config.database_url, watcher_db::PoolConfig::default())
        .await?;
    watcher_db::run_migrations(&pool).await?;

    if !config.scheduler_enabled {
        tracing::warn!("scheduler disabled via configuration; daemon will idle until shutdown");
        shutdown_signal().await;
        return Ok(());
    }

    let fetcher = Fetcher::new(
        config.http_user_agent.clone(),
        Duration::from_secs(config.http_timeout_seconds),
        Duration::from_secs(config.render_timeout_seconds),
    )?;

    let check_interval = Duration::from_secs(u64::from(config.check_interval_minutes) * 60);
    let (scheduler, _handle) = Scheduler::new(pool.clone(), fetcher, check_interval);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    shutdown_signal().await;
    tracing::info!("shutdown signal received, stopping scheduler");
    let _ = shutdown_tx.send(());
    let _ = scheduler_task.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
