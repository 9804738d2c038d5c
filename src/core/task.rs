//! Per-task lifecycle state machine.
//!
//! A task moves strictly forward through
//! `Idle -> Dispatching -> Working -> Returning` and is then removed. Each
//! tick advances only the timer of the current phase; crossing a phase
//! boundary emits exactly one [`TaskEvent::StateChanged`]. The machine never
//! touches the vehicle pool or regions directly: it reports what happened
//! through the returned events and leaves the side effects to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::DispatchError;
use crate::core::receiver::{Blocker, ReceiverList};
use crate::core::timer::RecurringTimer;
use crate::util::geometry::Vec3;
use crate::util::serde::{RegionId, TaskId, TaskPayload, VehicleId};

/// Lifecycle phase of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for a vehicle; the lifetime timer runs down.
    Idle,
    /// A vehicle is driving to the task site.
    Dispatching,
    /// The vehicle is working on site.
    Working,
    /// The vehicle is driving back home.
    Returning,
}

impl TaskStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Dispatching => 1,
            Self::Working => 2,
            Self::Returning => 3,
        }
    }

    /// True if `next` is the single legal successor of `self`.
    pub const fn can_advance_to(self, next: Self) -> bool {
        next.rank() == self.rank() + 1
    }
}

/// Why a task was torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyReason {
    /// The idle lifetime ran out before a vehicle was sent.
    Expired,
    /// The full round trip finished and the task was claimed.
    Completed,
    /// Removed by an admin command.
    Removed,
}

/// Something that happened to a task during a call.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// The task entered a new phase.
    StateChanged {
        /// Task id.
        task: TaskId,
        /// New phase.
        status: TaskStatus,
    },
    /// The vehicle arrived back home and can be released.
    VehicleReturned {
        /// Task id.
        task: TaskId,
        /// Vehicle that served the task.
        vehicle: Option<VehicleId>,
    },
    /// The task was claimed; its region earns the experience.
    Claimed {
        /// Task id.
        task: TaskId,
        /// Owning region.
        region: RegionId,
        /// Experience awarded to the region.
        experience: u32,
    },
    /// The task is finished and must be removed.
    Destroyed {
        /// Task id.
        task: TaskId,
        /// Why.
        reason: DestroyReason,
    },
}

/// All phase timers of a task, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskTimers {
    /// Idle lifetime left.
    pub lifetime_remaining: f32,
    /// Idle lifetime at creation; non-positive for special tasks.
    pub base_duration: f32,
    /// Outbound travel time captured at dispatch.
    pub travel_initial: f32,
    /// Outbound travel time left.
    pub travel_remaining: f32,
    /// Work time captured at dispatch.
    pub work_base: f32,
    /// Work time left.
    pub work_remaining: f32,
    /// Time spent returning; counts up to `travel_initial`.
    pub return_elapsed: f32,
}

/// Timing of the vehicle assigned to a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleTiming {
    /// Seconds to reach the task site.
    pub travel_time: f32,
    /// Seconds of work on site.
    pub work_time: f32,
}

/// Everything needed to create a fresh task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Idle lifetime in seconds.
    pub base_duration: f32,
    /// Exempt from idle expiry. Implied by a non-positive duration.
    pub special: bool,
    /// What completing the task awards.
    pub payload: TaskPayload,
}

/// `(remaining, base)` pair of the current phase, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseProgress {
    /// Phase the pair belongs to.
    pub status: TaskStatus,
    /// Time left in the phase.
    pub remaining: f32,
    /// Full length of the phase.
    pub base: f32,
}

impl PhaseProgress {
    /// Remaining fraction in `0..=1`; a zero-length phase reads as full.
    pub fn ratio(&self) -> f32 {
        if self.base <= 0.0 {
            return 1.0;
        }
        (self.remaining / self.base).clamp(0.0, 1.0)
    }
}

/// Persisted form of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSave {
    /// Task id.
    pub id: TaskId,
    /// Owning region.
    pub region: RegionId,
    /// World position of the task site.
    pub position: Vec3,
    /// Phase at save time.
    pub status: TaskStatus,
    /// Timer values at save time.
    pub timers: TaskTimers,
    /// Special flag.
    #[serde(default)]
    pub special: bool,
    /// Payload.
    pub payload: TaskPayload,
}

/// One live task and its state machine.
pub struct Task {
    id: TaskId,
    region: RegionId,
    position: Vec3,
    status: TaskStatus,
    timers: TaskTimers,
    special: bool,
    payload: TaskPayload,
    receivers: ReceiverList,
    vehicle: Option<VehicleId>,
    blockers: Vec<Blocker>,
    poll: RecurringTimer,
    finished: bool,
}

impl Task {
    /// Create an Idle task.
    pub fn new(
        id: TaskId,
        region: RegionId,
        position: Vec3,
        spec: TaskSpec,
        receivers: ReceiverList,
        poll_interval: f32,
    ) -> Self {
        let timers = TaskTimers {
            lifetime_remaining: spec.base_duration,
            base_duration: spec.base_duration,
            ..TaskTimers::default()
        };
        let mut task = Self {
            id,
            region,
            position,
            status: TaskStatus::Idle,
            timers,
            special: spec.special || spec.base_duration <= 0.0,
            payload: spec.payload,
            receivers,
            vehicle: None,
            blockers: Vec::new(),
            poll: RecurringTimer::new(poll_interval),
            finished: false,
        };
        task.refresh_blockers();
        task
    }

    /// Rebuild a task mid-phase from its saved form. No events are emitted;
    /// call [`Task::on_loaded`] once the vehicle binding is restored.
    pub fn from_save(save: TaskSave, receivers: ReceiverList, poll_interval: f32) -> Self {
        let poll = RecurringTimer::new(poll_interval);
        if save.status != TaskStatus::Idle {
            poll.cancel();
        }
        let mut task = Self {
            id: save.id,
            region: save.region,
            position: save.position,
            status: save.status,
            special: save.special || save.timers.base_duration <= 0.0,
            timers: save.timers,
            payload: save.payload,
            receivers,
            vehicle: None,
            blockers: Vec::new(),
            poll,
            finished: false,
        };
        if task.status == TaskStatus::Idle {
            task.refresh_blockers();
        }
        task
    }

    /// Persisted form of this task.
    pub fn to_save(&self) -> TaskSave {
        TaskSave {
            id: self.id,
            region: self.region.clone(),
            position: self.position,
            status: self.status,
            timers: self.timers.clone(),
            special: self.special,
            payload: self.payload.clone(),
        }
    }

    /// Task id.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Owning region.
    pub const fn region(&self) -> &RegionId {
        &self.region
    }

    /// Task site.
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Current phase.
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Timer values.
    pub const fn timers(&self) -> &TaskTimers {
        &self.timers
    }

    /// Exempt from idle expiry.
    pub const fn is_special(&self) -> bool {
        self.special
    }

    /// Payload.
    pub const fn payload(&self) -> &TaskPayload {
        &self.payload
    }

    /// Vehicle serving the task, if any.
    pub const fn vehicle(&self) -> Option<VehicleId> {
        self.vehicle
    }

    /// Receivers wired to this task.
    pub fn receivers(&self) -> &ReceiverList {
        &self.receivers
    }

    /// True once the task emitted `Destroyed`.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Blockers seen at the last poll. For display only; dispatch always
    /// polls fresh.
    pub fn cached_blockers(&self) -> &[Blocker] {
        &self.blockers
    }

    /// Ask every receiver whether it accepts this task right now.
    pub fn poll_blockers(&self) -> Vec<Blocker> {
        self.receivers
            .iter()
            .filter_map(|r| r.can_accept_task(self))
            .collect()
    }

    fn refresh_blockers(&mut self) {
        self.blockers = self.poll_blockers();
    }

    /// `Ok` if a vehicle could be sent right now.
    pub fn check_dispatch(&self) -> Result<(), DispatchError> {
        if self.finished || self.status != TaskStatus::Idle || self.vehicle.is_some() {
            return Err(DispatchError::InvalidState {
                task: self.id,
                status: self.status,
            });
        }
        let blockers = self.poll_blockers();
        if !blockers.is_empty() {
            return Err(DispatchError::Blocked(blockers));
        }
        Ok(())
    }

    /// True if [`Task::check_dispatch`] passes.
    pub fn can_dispatch(&self) -> bool {
        self.check_dispatch().is_ok()
    }

    /// Send a vehicle to this task.
    ///
    /// Blockers are polled first; if any receiver vetoes, `assign` is not
    /// called and the task is left untouched. `assign` reserves a vehicle and
    /// returns its id and timing; its error is passed through and the task
    /// stays Idle.
    pub fn try_dispatch<F>(&mut self, assign: F) -> Result<Vec<TaskEvent>, DispatchError>
    where
        F: FnOnce(&Self) -> Result<(VehicleId, VehicleTiming), DispatchError>,
    {
        self.check_dispatch()?;
        let (vehicle, timing) = assign(self)?;

        self.vehicle = Some(vehicle);
        self.timers.travel_initial = timing.travel_time;
        self.timers.travel_remaining = timing.travel_time;
        self.timers.work_base = timing.work_time;
        self.timers.work_remaining = timing.work_time;
        self.timers.return_elapsed = 0.0;
        self.blockers.clear();

        let mut events = Vec::with_capacity(1);
        self.switch_state(TaskStatus::Dispatching, &mut events);
        self.inform_receivers();
        info!(task = self.id, vehicle, travel = timing.travel_time, "vehicle dispatched");
        Ok(events)
    }

    /// Attach the vehicle restored for a loaded non-Idle task.
    pub fn bind_vehicle(&mut self, vehicle: VehicleId) {
        self.vehicle = Some(vehicle);
    }

    /// Re-announce a loaded in-flight task to its receivers.
    pub fn on_loaded(&self) {
        if self.status == TaskStatus::Idle {
            return;
        }
        self.inform_receivers();
    }

    fn inform_receivers(&self) {
        for receiver in self.receivers.iter() {
            receiver.on_task_incoming(self);
        }
    }

    fn switch_state(&mut self, next: TaskStatus, events: &mut Vec<TaskEvent>) {
        debug_assert!(self.status.can_advance_to(next), "illegal transition");
        debug!(task = self.id, from = ?self.status, to = ?next, "task state changed");
        self.status = next;
        if next != TaskStatus::Idle {
            self.poll.cancel();
        }
        events.push(TaskEvent::StateChanged {
            task: self.id,
            status: next,
        });
    }

    /// Advance the current phase by `delta` seconds.
    pub fn tick(&mut self, delta: f32) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        match self.status {
            TaskStatus::Idle => {
                if self.poll.advance(delta) > 0 {
                    self.refresh_blockers();
                }
                if self.special {
                    return events;
                }
                self.timers.lifetime_remaining -= delta;
                if self.timers.lifetime_remaining <= 0.0 {
                    info!(task = self.id, "task expired");
                    self.finish(DestroyReason::Expired, &mut events);
                }
            }
            TaskStatus::Dispatching => {
                self.timers.travel_remaining -= delta;
                if self.timers.travel_remaining <= 0.0 {
                    self.switch_state(TaskStatus::Working, &mut events);
                }
            }
            TaskStatus::Working => {
                self.timers.work_remaining -= delta;
                if self.timers.work_remaining <= 0.0 {
                    self.switch_state(TaskStatus::Returning, &mut events);
                }
            }
            TaskStatus::Returning => {
                self.timers.return_elapsed += delta;
                if self.timers.return_elapsed >= self.timers.travel_initial {
                    events.push(TaskEvent::VehicleReturned {
                        task: self.id,
                        vehicle: self.vehicle,
                    });
                    self.claim(&mut events);
                }
            }
        }
        events
    }

    fn claim(&mut self, events: &mut Vec<TaskEvent>) {
        events.push(TaskEvent::Claimed {
            task: self.id,
            region: self.region.clone(),
            experience: self.payload.experience,
        });
        for receiver in self.receivers.iter() {
            receiver.on_task_received(self);
        }
        info!(task = self.id, region = %self.region, "task claimed");
        self.finish(DestroyReason::Completed, events);
    }

    fn finish(&mut self, reason: DestroyReason, events: &mut Vec<TaskEvent>) {
        self.finished = true;
        self.poll.cancel();
        events.push(TaskEvent::Destroyed {
            task: self.id,
            reason,
        });
    }

    /// Tear the task down outside the normal lifecycle.
    ///
    /// Receivers of an in-flight task are told it will never arrive.
    pub fn force_remove(&mut self) -> Vec<TaskEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }
        if self.status != TaskStatus::Idle {
            for receiver in self.receivers.iter() {
                receiver.on_task_cancelled(self);
            }
        }
        self.finish(DestroyReason::Removed, &mut events);
        events
    }

    /// `(remaining, base)` of the current phase.
    pub fn progress(&self) -> PhaseProgress {
        let t = &self.timers;
        let (remaining, base) = match self.status {
            TaskStatus::Idle => (t.lifetime_remaining, t.base_duration),
            TaskStatus::Dispatching => (t.travel_remaining, t.travel_initial),
            TaskStatus::Working => (t.work_remaining, t.work_base),
            TaskStatus::Returning => ((t.travel_initial - t.return_elapsed).max(0.0), t.travel_initial),
        };
        PhaseProgress {
            status: self.status,
            remaining: remaining.max(0.0),
            base,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("region", &self.region)
            .field("position", &self.position)
            .field("status", &self.status)
            .field("timers", &self.timers)
            .field("special", &self.special)
            .field("payload", &self.payload)
            .field("vehicle", &self.vehicle)
            .field("receivers", &self.receivers.len())
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}
