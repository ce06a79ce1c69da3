use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Atomic snapshot of the scheduler's state, published over a
/// `tokio::sync::watch` channel rather than read from shared fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub last_sweep_at: Option<DateTime<Utc>>,
    pub next_sweep_at: Option<DateTime<Utc>>,
    pub current_sweep_id: Option<Uuid>,
}

/// Commands accepted over the scheduler's manual-trigger channel.
#[derive(Debug, Clone)]
pub enum SchedulerCommand {
    /// Runs a full sweep immediately, independent of the interval timer.
    RunNow,
    /// Runs a single tracked item's check immediately.
    RunCheck(Uuid),
}
