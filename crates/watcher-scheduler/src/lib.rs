//! The Scheduler and Check Coordinator: a single long-lived task that
//! sweeps tracked items on an interval, guarded against reentrancy, plus a
//! per-check pipeline that always closes its `check_runs` row.

pub mod coordinator;
pub mod scheduler;
pub mod state;

pub use coordinator::{CheckCoordinator, CheckError};
pub use scheduler::{Scheduler, SchedulerError, SchedulerHandle};
pub use state::{SchedulerCommand, SchedulerStatus};
