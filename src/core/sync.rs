//! Presentation sync sinks.
//!
//! The orchestrator mirrors task state outward through a [`SyncSink`]: state
//! changes and their progress pairs immediately, and a periodic snapshot of
//! every live task in between.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::task::{DestroyReason, PhaseProgress, TaskStatus};
use crate::core::vehicle_pool::{PoolEvent, PoolListener};
use crate::util::clock::now_ms;
use crate::util::geometry::Vec3;
use crate::util::serde::{RegionId, TaskId};

/// Something observers should mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A task was created or loaded.
    Spawned {
        /// Task id.
        task: TaskId,
        /// Owning region.
        region: RegionId,
        /// Task site.
        position: Vec3,
        /// Exempt from expiry.
        special: bool,
    },
    /// A task entered a new phase.
    StateChanged {
        /// Task id.
        task: TaskId,
        /// New phase.
        status: TaskStatus,
    },
    /// Progress pair of one task.
    Progress {
        /// Task id.
        task: TaskId,
        /// Current phase timers.
        progress: PhaseProgress,
    },
    /// A task was torn down.
    Removed {
        /// Task id.
        task: TaskId,
        /// Why.
        reason: DestroyReason,
    },
    /// The vehicle pool crossed an availability edge.
    PoolAvailability {
        /// Edge.
        event: PoolEvent,
        /// Vehicles free after the change.
        available: usize,
    },
    /// Progress of every live task.
    Snapshot {
        /// `(task, progress)` pairs in id order.
        tasks: Vec<(TaskId, PhaseProgress)>,
    },
}

/// A sync event with its wall-clock timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    /// Milliseconds since the Unix epoch.
    pub at_ms: u128,
    /// The event.
    pub event: SyncEvent,
}

impl SyncRecord {
    /// Stamp an event with the current time.
    pub fn now(event: SyncEvent) -> Self {
        Self { at_ms: now_ms(), event }
    }
}

/// Consumer of sync events.
pub trait SyncSink: Send + Sync {
    /// Record a sync event.
    fn record(&self, record: SyncRecord);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSyncSink;

impl SyncSink for NullSyncSink {
    fn record(&self, _record: SyncRecord) {}
}

/// Bounded in-memory sink for tests and tooling.
#[derive(Debug)]
pub struct InMemorySyncSink {
    records: Mutex<VecDeque<SyncRecord>>,
    max_records: usize,
}

impl InMemorySyncSink {
    /// Create a sink that keeps the newest `max_records` records.
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records)),
            max_records,
        }
    }

    /// Snapshot of stored records.
    pub fn records(&self) -> Vec<SyncRecord> {
        self.records.lock().iter().cloned().collect()
    }

    /// Snapshot of stored events without timestamps.
    pub fn events(&self) -> Vec<SyncEvent> {
        self.records.lock().iter().map(|r| r.event.clone()).collect()
    }

    /// Drop everything recorded so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl SyncSink for InMemorySyncSink {
    fn record(&self, record: SyncRecord) {
        if self.max_records == 0 {
            return;
        }
        let mut records = self.records.lock();
        if records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);
    }
}

/// Sink that writes each event to the `tracing` log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSyncSink;

impl SyncSink for TracingSyncSink {
    fn record(&self, record: SyncRecord) {
        match serde_json::to_string(&record.event) {
            Ok(json) => info!(target: "fleet_dispatch::sync", at_ms = %record.at_ms, event = %json, "sync"),
            Err(e) => info!(target: "fleet_dispatch::sync", at_ms = %record.at_ms, error = %e, "sync event not serializable"),
        }
    }
}

/// Forwards pool availability edges to a sink.
pub struct PoolSyncBridge {
    sink: Arc<dyn SyncSink>,
}

impl PoolSyncBridge {
    /// Forward to `sink`.
    pub fn new(sink: Arc<dyn SyncSink>) -> Self {
        Self { sink }
    }
}

impl PoolListener for PoolSyncBridge {
    fn on_availability_changed(&self, event: PoolEvent, available: usize) {
        self.sink
            .record(SyncRecord::now(SyncEvent::PoolAvailability { event, available }));
    }
}
