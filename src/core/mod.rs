//! Task lifecycle, vehicle pooling, placement and orchestration.

pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod placement;
pub mod receiver;
pub mod region;
pub mod sync;
pub mod task;
pub mod timer;
pub mod vehicle_pool;

pub use error::{AppResult, DispatchError, ErrorClass};
pub use generator::TaskGenerator;
pub use orchestrator::{
    LoadReport, OrchestratorSettings, SaveData, SpawnTarget, SpecialTaskHook, TaskOrchestrator,
};
pub use placement::{pick_unlocked_region, PlacementSampler};
pub use receiver::{
    Blocker, BlockerKind, IntakeLimit, LedgerTotals, ReceiverHandle, ReceiverList, ReceiverRegistry, RewardLedger,
    TaskReceiver,
};
pub use region::{AlphaMask, MaskShape, Polygon, Region, RegionSave, RegionShape};
pub use sync::{InMemorySyncSink, NullSyncSink, PoolSyncBridge, SyncEvent, SyncRecord, SyncSink, TracingSyncSink};
pub use task::{
    DestroyReason, PhaseProgress, Task, TaskEvent, TaskSave, TaskSpec, TaskStatus, TaskTimers, VehicleTiming,
};
pub use timer::{CancelFlag, RecurringTimer};
pub use vehicle_pool::{DispatchTicket, FleetLimits, PoolEvent, PoolListener, PoolStats, Vehicle, VehiclePool};
