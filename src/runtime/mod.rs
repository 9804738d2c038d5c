//! Admin command surface and the runtime driver for the scheduling tick.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod ticker;

pub use api::{execute, health, list_tasks, parse_command, task_status, AdminCommand, CommandOutcome, Health, TaskStatusResponse};
#[cfg(feature = "tokio-runtime")]
pub use ticker::{SharedOrchestrator, TickerHandle, TokioTicker};
