//! Fixed-size vehicle pool with availability accounting and routing.
//!
//! All pool state sits behind one `parking_lot::Mutex`, so availability is
//! checked and updated inside the same critical section as the dispatch that
//! consumes it. Availability edges (`>=1 -> 0` and `0 -> >=1`) are reported
//! to listeners after the lock is released.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::DispatchError;
use crate::core::receiver::{Blocker, BlockerKind, TaskReceiver};
use crate::core::task::{Task, VehicleTiming};
use crate::nav::{PathFinder, RoutePath};
use crate::util::geometry::{point_along, Vec3};
use crate::util::serde::VehicleId;

/// Availability edge of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEvent {
    /// The available count rose from zero.
    Available,
    /// The available count dropped to zero.
    Unavailable,
}

/// Observer of pool availability edges.
pub trait PoolListener: Send + Sync {
    /// Called once per edge with the available count after the change.
    fn on_availability_changed(&self, event: PoolEvent, available: usize);
}

/// Fleet-wide movement parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetLimits {
    /// Driving speed in world units per second.
    pub speed: f32,
    /// Work time each vehicle starts with, in seconds.
    pub work_time: f32,
}

/// A pooled vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Index in the pool.
    pub id: VehicleId,
    /// Free to take a task.
    pub available: bool,
    /// Outbound travel time of the current job.
    pub initial_travel_time: f32,
    /// Work time of the current job.
    pub time_of_work: f32,
    /// Flagged for the drive home.
    pub is_returning: bool,
    /// Points of the route being driven.
    pub path: Vec<Vec3>,
    /// Index of the path segment the vehicle is on.
    pub cursor: usize,
    /// Garage position; routes start and end here.
    pub home: Vec3,
    /// Current position.
    pub position: Vec3,
}

impl Vehicle {
    fn parked(id: VehicleId, home: Vec3, work_time: f32) -> Self {
        Self {
            id,
            available: true,
            initial_travel_time: 0.0,
            time_of_work: work_time,
            is_returning: false,
            path: Vec::new(),
            cursor: 0,
            home,
            position: home,
        }
    }

    fn reset(&mut self, work_time: f32) {
        self.available = true;
        self.initial_travel_time = 0.0;
        self.time_of_work = work_time;
        self.is_returning = false;
        self.path.clear();
        self.cursor = 0;
        self.position = self.home;
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTicket {
    /// Vehicle sent.
    pub vehicle: VehicleId,
    /// Timing captured by the task.
    pub timing: VehicleTiming,
    /// Route being driven.
    pub route: RoutePath,
}

/// Pool utilization snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Vehicles in the pool.
    pub total: usize,
    /// Vehicles free to take a task.
    pub available: usize,
    /// Vehicles out on a job.
    pub dispatched: usize,
    /// Dispatched vehicles driving home.
    pub returning: usize,
}

struct PoolState {
    vehicles: Vec<Vehicle>,
    available: usize,
}

/// Fixed-size vehicle pool.
pub struct VehiclePool {
    name: String,
    limits: FleetLimits,
    finder: PathFinder,
    state: Mutex<PoolState>,
    listeners: Vec<Arc<dyn PoolListener>>,
}

impl VehiclePool {
    /// Create a pool with one vehicle per home position.
    pub fn new(homes: &[Vec3], limits: FleetLimits, finder: PathFinder) -> Self {
        let vehicles: Vec<Vehicle> = homes
            .iter()
            .enumerate()
            .map(|(id, &home)| Vehicle::parked(id, home, limits.work_time))
            .collect();
        let available = vehicles.len();
        Self {
            name: "vehicle_pool".into(),
            limits,
            finder,
            state: Mutex::new(PoolState { vehicles, available }),
            listeners: Vec::new(),
        }
    }

    /// Attach an availability listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn PoolListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    fn notify(&self, event: Option<PoolEvent>, available: usize) {
        let Some(event) = event else {
            return;
        };
        info!(?event, available, "vehicle pool availability changed");
        for listener in &self.listeners {
            listener.on_availability_changed(event, available);
        }
    }

    /// Route planner used by the pool.
    pub const fn finder(&self) -> &PathFinder {
        &self.finder
    }

    /// Fleet parameters.
    pub const fn limits(&self) -> FleetLimits {
        self.limits
    }

    /// Number of vehicles.
    pub fn len(&self) -> usize {
        self.state.lock().vehicles.len()
    }

    /// True if the pool has no vehicles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vehicles currently free.
    pub fn available_count(&self) -> usize {
        self.state.lock().available
    }

    /// Snapshot of one vehicle.
    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.state.lock().vehicles.get(id).cloned()
    }

    /// Snapshot of all vehicles.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.state.lock().vehicles.clone()
    }

    /// Utilization snapshot.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            total: state.vehicles.len(),
            available: state.available,
            dispatched: state.vehicles.len() - state.available,
            returning: state.vehicles.iter().filter(|v| v.is_returning).count(),
        }
    }

    /// First available vehicle in pool order. Does not reserve it.
    pub fn acquire(&self) -> Option<VehicleId> {
        let state = self.state.lock();
        let found = state.vehicles.iter().find(|v| v.available).map(|v| v.id);
        if found.is_none() {
            debug!("there is no free vehicle");
        }
        found
    }

    /// `Some` blocker while no vehicle is free.
    pub fn can_accept_task(&self) -> Option<Blocker> {
        (self.available_count() == 0)
            .then(|| Blocker::new(BlockerKind::NoVehicleAvailable, self.name.clone()))
    }

    /// Send `id` from its home toward `target`.
    ///
    /// Fails without side effects if the vehicle is flagged returning, is
    /// no longer available, or no route exists.
    pub fn dispatch(&self, id: VehicleId, target: Vec3) -> Result<DispatchTicket, DispatchError> {
        let (ticket, edge, available) = {
            let mut state = self.state.lock();
            let vehicle = state.vehicles.get(id).ok_or(DispatchError::UnknownVehicle(id))?;
            if vehicle.is_returning {
                return Err(DispatchError::VehicleReturning(id));
            }
            if !vehicle.available {
                return Err(DispatchError::NoVehicleAvailable);
            }

            let route = self.finder.find_path(vehicle.home, target).inspect_err(|e| {
                warn!(vehicle = id, error = %e, "path not found");
            })?;
            let timing = VehicleTiming {
                travel_time: route.length() / self.limits.speed,
                work_time: vehicle.time_of_work,
            };

            let vehicle = &mut state.vehicles[id];
            vehicle.available = false;
            vehicle.initial_travel_time = timing.travel_time;
            vehicle.path.clone_from(&route.waypoints);
            vehicle.cursor = 0;

            state.available -= 1;
            let edge = (state.available == 0).then_some(PoolEvent::Unavailable);
            (
                DispatchTicket {
                    vehicle: id,
                    timing,
                    route,
                },
                edge,
                state.available,
            )
        };

        debug!(vehicle = id, available, "vehicle sent");
        self.notify(edge, available);
        Ok(ticket)
    }

    /// Flag a dispatched vehicle for the drive home.
    pub fn mark_returning(&self, id: VehicleId) -> Result<(), DispatchError> {
        let mut state = self.state.lock();
        let vehicle = state.vehicles.get_mut(id).ok_or(DispatchError::UnknownVehicle(id))?;
        if vehicle.available {
            return Err(DispatchError::VehicleNotDispatched(id));
        }
        vehicle.is_returning = true;
        Ok(())
    }

    /// Route a returning vehicle from where it stands to `target`.
    ///
    /// Only legal once [`VehiclePool::mark_returning`] was called. Does not
    /// change availability.
    pub fn return_vehicle(&self, id: VehicleId, target: Vec3) -> Result<RoutePath, DispatchError> {
        let mut state = self.state.lock();
        let vehicle = state.vehicles.get_mut(id).ok_or(DispatchError::UnknownVehicle(id))?;
        if !vehicle.is_returning {
            return Err(DispatchError::VehicleNotReturning(id));
        }

        let start = vehicle.path.last().copied().unwrap_or(vehicle.position);
        let route = self.finder.find_path(start, target).inspect_err(|e| {
            warn!(vehicle = id, error = %e, "return path not found");
        })?;
        vehicle.path.clone_from(&route.waypoints);
        vehicle.cursor = 0;
        vehicle.position = start;
        Ok(route)
    }

    /// Park a vehicle: reset its timers and make it available again.
    pub fn release(&self, id: VehicleId) -> Result<(), DispatchError> {
        let (edge, available) = {
            let mut state = self.state.lock();
            let work_time = self.limits.work_time;
            let vehicle = state.vehicles.get_mut(id).ok_or(DispatchError::UnknownVehicle(id))?;
            if vehicle.available {
                return Err(DispatchError::VehicleNotDispatched(id));
            }
            vehicle.reset(work_time);
            state.available += 1;
            let edge = (state.available == 1).then_some(PoolEvent::Available);
            (edge, state.available)
        };

        debug!(vehicle = id, available, "vehicle released");
        self.notify(edge, available);
        Ok(())
    }

    /// Move a vehicle to `progress` (0..=1) along its current path.
    pub fn set_progress(&self, id: VehicleId, progress: f32) {
        let mut state = self.state.lock();
        let Some(vehicle) = state.vehicles.get_mut(id) else {
            return;
        };
        if let Some((position, cursor)) = point_along(&vehicle.path, progress) {
            vehicle.position = position;
            vehicle.cursor = cursor;
        }
    }
}

impl fmt::Debug for VehiclePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VehiclePool")
            .field("name", &self.name)
            .field("limits", &self.limits)
            .field("stats", &self.stats())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl TaskReceiver for VehiclePool {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_accept_task(&self, _task: &Task) -> Option<Blocker> {
        VehiclePool::can_accept_task(self)
    }

    fn on_task_incoming(&self, task: &Task) {
        debug!(task = task.id(), vehicle = ?task.vehicle(), "vehicle assigned to task");
    }

    fn on_task_received(&self, task: &Task) {
        debug!(task = task.id(), "vehicle delivered task");
    }
}
