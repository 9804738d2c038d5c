//! Tokio driver for the scheduling tick.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::core::{CancelFlag, TaskOrchestrator};

/// Orchestrator shared between the ticker and command handlers.
pub type SharedOrchestrator = Arc<Mutex<TaskOrchestrator>>;

/// Calls [`TaskOrchestrator::tick`] on a fixed period with the measured
/// elapsed time.
#[derive(Clone)]
pub struct TokioTicker {
    handle: Arc<tokio::runtime::Handle>,
    period: Duration,
}

/// A running ticker.
pub struct TickerHandle {
    cancel: CancelFlag,
    join: JoinHandle<u64>,
}

impl TickerHandle {
    /// Request a stop at the next period boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait; returns how many ticks ran.
    pub async fn stop(self) -> u64 {
        self.cancel.cancel();
        self.join.await.unwrap_or_default()
    }
}

impl TokioTicker {
    /// Create a ticker on a tokio runtime handle.
    pub fn new(handle: tokio::runtime::Handle, period: Duration) -> Self {
        Self {
            handle: Arc::new(handle),
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Create a ticker on the current runtime.
    pub fn current(period: Duration) -> Result<Self, tokio::runtime::TryCurrentError> {
        Ok(Self::new(tokio::runtime::Handle::try_current()?, period))
    }

    /// Tick period.
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking `orchestrator` until cancelled.
    pub fn start(&self, orchestrator: SharedOrchestrator) -> TickerHandle {
        let cancel = CancelFlag::new();
        let flag = cancel.clone();
        let period = self.period;
        let join = self.handle.spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last = Instant::now();
            let mut ticks = 0_u64;
            info!(period_ms = period.as_millis(), "ticker started");
            loop {
                timer.tick().await;
                if flag.is_cancelled() {
                    break;
                }
                let now = Instant::now();
                let delta = now.duration_since(last).as_secs_f32();
                last = now;
                orchestrator.lock().tick(delta);
                ticks += 1;
            }
            debug!(ticks, "ticker stopped");
            ticks
        });
        TickerHandle { cancel, join }
    }
}
