//! Error types for dispatch, placement and orchestration.

use thiserror::Error;

use crate::core::receiver::Blocker;
use crate::core::task::TaskStatus;
use crate::nav::PathError;
use crate::util::serde::{RegionId, TaskId, VehicleId};

/// Broad category of a [`DispatchError`], used to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Out of vehicles or at the live-task limit.
    Capacity,
    /// No valid spawn point was found.
    Placement,
    /// No route between two points.
    Pathfinding,
    /// A receiver or the task's own state refused the request.
    Rejected,
    /// Misconfigured scene data; only the current operation is aborted.
    Integrity,
    /// Persistence backend failure.
    Backend,
}

/// Errors produced by the dispatch core.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every vehicle in the pool is out on a job.
    #[error("no vehicle available")]
    NoVehicleAvailable,
    /// The live-task limit has been reached.
    #[error("task limit reached: {live} live of {max}")]
    TaskLimitReached {
        /// Current live tasks.
        live: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Sampling exhausted its attempts without finding a valid point.
    #[error("no valid spawn point in region `{region}` after {attempts} attempts")]
    PlacementExhausted {
        /// Region sampled.
        region: RegionId,
        /// Attempts made.
        attempts: u32,
    },
    /// Random spawning found no unlocked region.
    #[error("no unlocked region to spawn in")]
    NoUnlockedRegion,
    /// Route planning failed.
    #[error("route planning failed: {0}")]
    Path(#[from] PathError),
    /// At least one receiver vetoed the dispatch.
    #[error("dispatch blocked by {} receiver(s)", .0.len())]
    Blocked(Vec<Blocker>),
    /// The task is not in a state that accepts this command.
    #[error("task {task} is {status:?}")]
    InvalidState {
        /// Task addressed.
        task: TaskId,
        /// Its current status.
        status: TaskStatus,
    },
    /// The vehicle is already flagged as returning.
    #[error("vehicle {0} is returning")]
    VehicleReturning(VehicleId),
    /// A return route was requested for a vehicle not flagged returning.
    #[error("vehicle {0} is not returning")]
    VehicleNotReturning(VehicleId),
    /// Release was requested for a vehicle that is already available.
    #[error("vehicle {0} is not dispatched")]
    VehicleNotDispatched(VehicleId),
    /// No region with this id.
    #[error("unknown region `{0}`")]
    UnknownRegion(RegionId),
    /// No live task with this id.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),
    /// No vehicle with this id.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),
    /// No preset or predefined task with this name.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
    /// The waypoint graph failed validation.
    #[error("invalid waypoint graph: {0}")]
    InvalidGraph(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Persistence backend failure with context.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DispatchError {
    /// Category of this error.
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NoVehicleAvailable | Self::TaskLimitReached { .. } => ErrorClass::Capacity,
            Self::PlacementExhausted { .. } | Self::NoUnlockedRegion => ErrorClass::Placement,
            Self::Path(_) => ErrorClass::Pathfinding,
            Self::Blocked(_)
            | Self::InvalidState { .. }
            | Self::VehicleReturning(_)
            | Self::VehicleNotReturning(_)
            | Self::VehicleNotDispatched(_) => ErrorClass::Rejected,
            Self::UnknownRegion(_)
            | Self::UnknownTask(_)
            | Self::UnknownVehicle(_)
            | Self::UnknownPreset(_)
            | Self::InvalidGraph(_)
            | Self::InvalidConfig(_) => ErrorClass::Integrity,
            Self::Persistence(_) => ErrorClass::Backend,
        }
    }

    /// True for failures that clear up on their own; retry on a later cycle.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::Capacity | ErrorClass::Placement | ErrorClass::Pathfinding
        )
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
