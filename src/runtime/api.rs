//! Admin command surface and status responses.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::{DispatchError, PhaseProgress, PoolStats, SpawnTarget, TaskOrchestrator, TaskStatus};
use crate::util::geometry::Vec3;
use crate::util::serde::{RegionId, TaskId, VehicleId};

/// Debug/admin command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Remove every Idle task.
    RemoveIdleTasks,
    /// Remove one task in any phase.
    RemoveTask {
        /// Task id.
        task: TaskId,
    },
    /// Spawn a random task, in a random unlocked region if none is given.
    SpawnRandom {
        /// Target region.
        #[serde(default)]
        region: Option<RegionId>,
    },
    /// Spawn a predefined task in a region.
    SpawnPredefined {
        /// Predefined task name.
        task: String,
        /// Target region.
        region: RegionId,
    },
    /// Send a vehicle to a task.
    SendVehicle {
        /// Task id.
        task: TaskId,
    },
    /// Start the spawn loop.
    StartSpawning {
        /// Fixed region; random unlocked regions if absent.
        #[serde(default)]
        region: Option<RegionId>,
    },
    /// Stop the spawn loop.
    StopSpawning,
    /// Unlock a region.
    UnlockRegion {
        /// Region id.
        region: RegionId,
    },
    /// Set the view zoom.
    SetZoom {
        /// New zoom factor.
        zoom: f32,
    },
}

/// Result of an [`AdminCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Tasks removed.
    Removed {
        /// How many.
        count: usize,
    },
    /// A task was spawned.
    Spawned {
        /// New task id.
        task: TaskId,
    },
    /// A vehicle was sent.
    Dispatched {
        /// Task served.
        task: TaskId,
        /// Vehicle sent.
        vehicle: VehicleId,
    },
    /// Spawn loop state after the command.
    Spawning {
        /// True if a loop is running.
        active: bool,
    },
    /// Region unlock result.
    Unlocked {
        /// Region id.
        region: RegionId,
        /// False if it was already unlocked.
        changed: bool,
    },
    /// Zoom in effect after the command.
    Zoom {
        /// Zoom factor.
        zoom: f32,
    },
}

/// Task status response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusResponse {
    /// Task identifier.
    pub task_id: TaskId,
    /// Owning region.
    pub region: RegionId,
    /// Task site.
    pub position: Vec3,
    /// Current status.
    pub status: TaskStatus,
    /// Current phase timers.
    pub progress: PhaseProgress,
    /// Serving vehicle.
    pub vehicle: Option<VehicleId>,
    /// Blockers seen at the last poll.
    pub blockers: Vec<String>,
}

/// Health response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
    /// Live tasks.
    pub tasks: usize,
    /// Vehicle pool utilization.
    pub pool: PoolStats,
}

/// Parse a JSON admin command.
pub fn parse_command(input: &str) -> Result<AdminCommand, String> {
    serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))
}

/// Run an admin command against the orchestrator.
pub fn execute(orchestrator: &mut TaskOrchestrator, command: AdminCommand) -> Result<CommandOutcome, DispatchError> {
    info!(?command, "admin command");
    let outcome = match command {
        AdminCommand::RemoveIdleTasks => CommandOutcome::Removed {
            count: orchestrator.remove_all_idle(),
        },
        AdminCommand::RemoveTask { task } => {
            orchestrator.remove_task(task)?;
            CommandOutcome::Removed { count: 1 }
        }
        AdminCommand::SpawnRandom { region } => {
            let task = match region {
                Some(region) => orchestrator.try_spawn_in(&region)?,
                None => orchestrator.try_spawn_random()?,
            };
            CommandOutcome::Spawned { task }
        }
        AdminCommand::SpawnPredefined { task, region } => CommandOutcome::Spawned {
            task: orchestrator.spawn_predefined(&task, &region)?,
        },
        AdminCommand::SendVehicle { task } => CommandOutcome::Dispatched {
            task,
            vehicle: orchestrator.dispatch(task)?,
        },
        AdminCommand::StartSpawning { region } => {
            if let Some(id) = &region {
                if orchestrator.region(id).is_none() {
                    return Err(DispatchError::UnknownRegion(id.clone()));
                }
            }
            let target = region.map_or(SpawnTarget::Random, SpawnTarget::Region);
            orchestrator.start_spawning(target);
            CommandOutcome::Spawning { active: true }
        }
        AdminCommand::StopSpawning => {
            orchestrator.stop_spawning();
            CommandOutcome::Spawning { active: false }
        }
        AdminCommand::UnlockRegion { region } => {
            let changed = orchestrator.unlock_region(&region)?;
            CommandOutcome::Unlocked { region, changed }
        }
        AdminCommand::SetZoom { zoom } => {
            orchestrator.set_zoom(zoom);
            CommandOutcome::Zoom {
                zoom: orchestrator.zoom(),
            }
        }
    };
    Ok(outcome)
}

/// Status of one live task.
pub fn task_status(orchestrator: &TaskOrchestrator, id: TaskId) -> Option<TaskStatusResponse> {
    orchestrator.task(id).map(|task| TaskStatusResponse {
        task_id: task.id(),
        region: task.region().clone(),
        position: task.position(),
        status: task.status(),
        progress: task.progress(),
        vehicle: task.vehicle(),
        blockers: task.cached_blockers().iter().map(ToString::to_string).collect(),
    })
}

/// Status of every live task in id order.
pub fn list_tasks(orchestrator: &TaskOrchestrator) -> Vec<TaskStatusResponse> {
    orchestrator
        .tasks()
        .filter_map(|t| task_status(orchestrator, t.id()))
        .collect()
}

/// Return a health payload.
pub fn health(orchestrator: &TaskOrchestrator) -> Health {
    Health {
        ok: true,
        tasks: orchestrator.task_count(),
        pool: orchestrator.pool().stats(),
    }
}
