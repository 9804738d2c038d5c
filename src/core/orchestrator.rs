//! Top-level task scheduler.
//!
//! [`TaskOrchestrator`] owns the regions and live tasks, drives every task
//! once per tick, reacts to the events they emit (vehicle return, region
//! experience, teardown) and runs the cooperative spawn and sync timers.
//! Everything happens on the caller's thread inside [`TaskOrchestrator::tick`]
//! or an explicit command; the only state shared with other threads is the
//! vehicle pool, which serializes itself.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::error::DispatchError;
use crate::core::generator::TaskGenerator;
use crate::core::placement::{pick_unlocked_region, PlacementSampler};
use crate::core::receiver::{ReceiverHandle, ReceiverRegistry};
use crate::core::region::{Region, RegionSave};
use crate::core::sync::{NullSyncSink, SyncEvent, SyncRecord, SyncSink};
use crate::core::task::{DestroyReason, Task, TaskEvent, TaskSave, TaskSpec, TaskStatus};
use crate::core::timer::{CancelFlag, RecurringTimer};
use crate::core::vehicle_pool::VehiclePool;
use crate::util::geometry::Vec3;
use crate::util::serde::{PayloadKind, RegionId, TaskId, VehicleId};

/// Callback run when a special task is created or loaded.
pub type SpecialTaskHook = Arc<dyn Fn(&Task) + Send + Sync>;

/// Where the spawn loop places tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnTarget {
    /// A random unlocked region each cycle.
    Random,
    /// Always this region.
    Region(RegionId),
}

/// Timing and limits of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrchestratorSettings {
    /// Seconds between spawn cycles.
    pub spawn_interval_secs: f32,
    /// Live-task ceiling for the spawn loop.
    pub max_tasks: usize,
    /// Seconds between blocker re-polls of idle tasks.
    pub blocker_poll_secs: f32,
    /// Seconds between snapshot pushes.
    pub sync_interval_secs: f32,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            spawn_interval_secs: 5.0,
            max_tasks: 8,
            blocker_poll_secs: 1.0,
            sync_interval_secs: 1.0,
        }
    }
}

/// Everything needed to rebuild the orchestrator's state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Per-region unlock state and experience.
    pub regions: Vec<RegionSave>,
    /// Live tasks.
    pub tasks: Vec<TaskSave>,
    /// Next task id to hand out.
    #[serde(default)]
    pub next_id: TaskId,
}

/// Outcome of [`TaskOrchestrator::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tasks rebuilt.
    pub loaded: usize,
    /// Tasks dropped because their region or vehicle could not be restored.
    pub skipped: Vec<TaskId>,
}

struct SpawnLoop {
    target: SpawnTarget,
    timer: RecurringTimer,
}

/// Owns regions and tasks and drives them.
pub struct TaskOrchestrator {
    regions: BTreeMap<RegionId, Region>,
    tasks: BTreeMap<TaskId, Task>,
    pool: Arc<VehiclePool>,
    receivers: ReceiverRegistry,
    generator: TaskGenerator,
    sampler: PlacementSampler,
    settings: OrchestratorSettings,
    spawn_loop: Option<SpawnLoop>,
    sync_timer: RecurringTimer,
    sink: Arc<dyn SyncSink>,
    special_hooks: Vec<SpecialTaskHook>,
    zoom: f32,
    rng: StdRng,
    next_id: TaskId,
}

impl TaskOrchestrator {
    /// Create an orchestrator. The pool is registered as the first receiver
    /// of every task.
    pub fn new(
        regions: Vec<Region>,
        pool: Arc<VehiclePool>,
        generator: TaskGenerator,
        sampler: PlacementSampler,
        settings: OrchestratorSettings,
    ) -> Self {
        let mut receivers = ReceiverRegistry::new();
        let pool_receiver: ReceiverHandle = pool.clone();
        receivers.add_always(pool_receiver);

        Self {
            regions: regions.into_iter().map(|r| (r.id().clone(), r)).collect(),
            tasks: BTreeMap::new(),
            pool,
            receivers,
            generator,
            sampler,
            settings,
            spawn_loop: None,
            sync_timer: RecurringTimer::new(settings.sync_interval_secs),
            sink: Arc::new(NullSyncSink),
            special_hooks: Vec::new(),
            zoom: 1.0,
            rng: StdRng::from_os_rng(),
            next_id: 1,
        }
    }

    /// Use a deterministic RNG.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Replace the sync sink.
    pub fn set_sink(&mut self, sink: Arc<dyn SyncSink>) {
        self.sink = sink;
    }

    /// Wire a receiver to every task created from now on.
    pub fn add_receiver(&mut self, receiver: ReceiverHandle) {
        self.receivers.add_always(receiver);
    }

    /// Wire a receiver to tasks carrying `kind` created from now on.
    pub fn add_receiver_for(&mut self, kind: PayloadKind, receiver: ReceiverHandle) {
        self.receivers.add_for_kind(kind, receiver);
    }

    /// Subscribe to special-task creation.
    pub fn add_special_task_hook(&mut self, hook: SpecialTaskHook) {
        self.special_hooks.push(hook);
    }

    /// Shared vehicle pool.
    pub const fn pool(&self) -> &Arc<VehiclePool> {
        &self.pool
    }

    /// Settings in effect.
    pub const fn settings(&self) -> OrchestratorSettings {
        self.settings
    }

    /// Live task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Live tasks in id order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Number of live tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Region by id.
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    /// Regions in id order.
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Current view zoom.
    pub const fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the view zoom that scales task spacing. Non-positive values are
    /// ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        } else {
            warn!(zoom, "ignoring invalid zoom");
        }
    }

    /// Unlock a region for random spawns. Returns false if it already was.
    pub fn unlock_region(&mut self, id: &RegionId) -> Result<bool, DispatchError> {
        let region = self
            .regions
            .get_mut(id)
            .ok_or_else(|| DispatchError::UnknownRegion(id.clone()))?;
        let changed = region.unlock();
        if changed {
            info!(region = %id, "region unlocked");
        }
        Ok(changed)
    }

    fn publish(&self, event: SyncEvent) {
        self.sink.record(SyncRecord::now(event));
    }

    /// Advance the simulation by `delta` seconds.
    ///
    /// Every task is ticked first and the resulting events applied; then
    /// vehicle positions are projected; then the spawn and sync timers run.
    pub fn tick(&mut self, delta: f32) {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };

        let mut events = Vec::new();
        for task in self.tasks.values_mut() {
            events.extend(task.tick(delta));
        }
        for event in events {
            self.apply(event);
        }

        self.project_vehicles();
        self.run_spawn_loop(delta);

        if self.sync_timer.advance(delta) > 0 {
            self.push_snapshot();
        }
    }

    fn apply(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::StateChanged { task, status } => self.on_state_changed(task, status),
            TaskEvent::VehicleReturned { task, vehicle } => {
                let Some(vehicle) = vehicle else {
                    error!(task, "task returned without a vehicle");
                    return;
                };
                if let Err(e) = self.pool.release(vehicle) {
                    error!(task, vehicle, error = %e, "failed to release vehicle");
                }
            }
            TaskEvent::Claimed {
                task,
                region,
                experience,
            } => match self.regions.get_mut(&region) {
                Some(r) => {
                    r.add_experience(experience);
                    debug!(task, region = %region, experience, total = r.experience(), "experience added");
                }
                None => error!(task, region = %region, "claimed task has no region"),
            },
            TaskEvent::Destroyed { task, reason } => {
                let Some(removed) = self.tasks.remove(&task) else {
                    return;
                };
                if reason == DestroyReason::Removed {
                    if let Some(vehicle) = removed.vehicle() {
                        if let Err(e) = self.pool.release(vehicle) {
                            warn!(task, vehicle, error = %e, "vehicle of removed task not released");
                        }
                    }
                }
                info!(task, ?reason, "task removed");
                self.publish(SyncEvent::Removed { task, reason });
            }
        }
    }

    fn on_state_changed(&mut self, id: TaskId, status: TaskStatus) {
        let Some(task) = self.tasks.get(&id) else {
            return;
        };
        let progress = task.progress();
        let vehicle = task.vehicle();

        self.publish(SyncEvent::StateChanged { task: id, status });
        self.publish(SyncEvent::Progress { task: id, progress });
        self.sync_timer.reset();

        if status == TaskStatus::Returning {
            if let Some(vehicle) = vehicle {
                self.send_home(id, vehicle);
            }
        }
    }

    fn send_home(&self, task: TaskId, vehicle: VehicleId) {
        let result = self.pool.mark_returning(vehicle).and_then(|()| {
            let home = self
                .pool
                .vehicle(vehicle)
                .map(|v| v.home)
                .ok_or(DispatchError::UnknownVehicle(vehicle))?;
            self.pool.return_vehicle(vehicle, home)
        });
        match result {
            Ok(route) => debug!(task, vehicle, length = route.length(), "vehicle heading home"),
            Err(e) => warn!(task, vehicle, error = %e, "return route failed"),
        }
    }

    fn project_vehicles(&self) {
        for task in self.tasks.values() {
            let Some(vehicle) = task.vehicle() else {
                continue;
            };
            if matches!(task.status(), TaskStatus::Dispatching | TaskStatus::Returning) {
                let progress = task.progress();
                self.pool.set_progress(vehicle, 1.0 - progress.ratio());
            }
        }
    }

    fn push_snapshot(&self) {
        let tasks = self.tasks.values().map(|t| (t.id(), t.progress())).collect();
        self.publish(SyncEvent::Snapshot { tasks });
    }

    /// Send a vehicle to a task.
    ///
    /// Fails without side effects if a receiver blocks, the pool is empty or
    /// no route exists; the task stays Idle in every failure case.
    pub fn dispatch(&mut self, id: TaskId) -> Result<VehicleId, DispatchError> {
        let pool = Arc::clone(&self.pool);
        let task = self.tasks.get_mut(&id).ok_or(DispatchError::UnknownTask(id))?;
        let target = task.position();

        let events = task
            .try_dispatch(|_| {
                let vehicle = pool.acquire().ok_or(DispatchError::NoVehicleAvailable)?;
                let ticket = pool.dispatch(vehicle, target)?;
                Ok((ticket.vehicle, ticket.timing))
            })
            .inspect_err(|e| debug!(task = id, error = %e, "dispatch refused"))?;
        let vehicle = task.vehicle().ok_or(DispatchError::NoVehicleAvailable)?;

        for event in events {
            self.apply(event);
        }
        Ok(vehicle)
    }

    /// Spawn a random task in a random unlocked region.
    pub fn try_spawn_random(&mut self) -> Result<TaskId, DispatchError> {
        let region = pick_unlocked_region(self.regions.values(), &mut self.rng)
            .map(|r| r.id().clone())
            .ok_or(DispatchError::NoUnlockedRegion)?;
        self.try_spawn_in(&region)
    }

    /// Spawn a random task in `region`.
    pub fn try_spawn_in(&mut self, region: &RegionId) -> Result<TaskId, DispatchError> {
        let position = self.sample_in(region)?;
        let spec = self.generator.generate(&mut self.rng)?;
        Ok(self.insert_task(region.clone(), position, spec))
    }

    /// Spawn a predefined task in `region`, at its fixed position if it has
    /// one, bypassing the spawn interval and task limit.
    pub fn spawn_predefined(&mut self, name: &str, region: &RegionId) -> Result<TaskId, DispatchError> {
        let predefined = self.generator.predefined(name)?.clone();
        if !self.regions.contains_key(region) {
            return Err(DispatchError::UnknownRegion(region.clone()));
        }
        let position = match predefined.position {
            Some(p) => p,
            None => self.sample_in(region)?,
        };
        let spec = TaskGenerator::predefined_spec(&predefined);
        Ok(self.insert_task(region.clone(), position, spec))
    }

    fn sample_in(&mut self, id: &RegionId) -> Result<Vec3, DispatchError> {
        let region = self
            .regions
            .get(id)
            .ok_or_else(|| DispatchError::UnknownRegion(id.clone()))?;
        let occupied: Vec<Vec3> = self.tasks.values().map(Task::position).collect();
        self.sampler.sample(region, &occupied, self.zoom, &mut self.rng)
    }

    fn insert_task(&mut self, region: RegionId, position: Vec3, spec: TaskSpec) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        let receivers = self.receivers.receivers_for(&spec.payload.kinds);
        let task = Task::new(id, region, position, spec, receivers, self.settings.blocker_poll_secs);
        info!(
            task = id,
            region = %task.region(),
            x = position.x,
            y = position.y,
            special = task.is_special(),
            "task spawned"
        );
        self.announce(&task);
        self.tasks.insert(id, task);
        id
    }

    fn announce(&self, task: &Task) {
        self.publish(SyncEvent::Spawned {
            task: task.id(),
            region: task.region().clone(),
            position: task.position(),
            special: task.is_special(),
        });
        self.publish(SyncEvent::Progress {
            task: task.id(),
            progress: task.progress(),
        });
        if task.is_special() {
            for hook in &self.special_hooks {
                hook(task);
            }
        }
    }

    /// Remove one task regardless of phase. A vehicle it holds is released.
    pub fn remove_task(&mut self, id: TaskId) -> Result<(), DispatchError> {
        let task = self.tasks.get_mut(&id).ok_or(DispatchError::UnknownTask(id))?;
        for event in task.force_remove() {
            self.apply(event);
        }
        Ok(())
    }

    /// Remove every Idle task. Returns how many were removed.
    pub fn remove_all_idle(&mut self) -> usize {
        let idle: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status() == TaskStatus::Idle)
            .map(Task::id)
            .collect();
        for &id in &idle {
            if let Err(e) = self.remove_task(id) {
                warn!(task = id, error = %e, "idle task not removed");
            }
        }
        info!(removed = idle.len(), "idle tasks removed");
        idle.len()
    }

    /// Start the spawn loop, replacing any running one.
    pub fn start_spawning(&mut self, target: SpawnTarget) -> CancelFlag {
        if let Some(previous) = self.spawn_loop.take() {
            previous.timer.cancel();
        }
        let timer = RecurringTimer::new(self.settings.spawn_interval_secs);
        let flag = timer.cancel_flag();
        info!(?target, interval = timer.interval(), "spawn loop started");
        self.spawn_loop = Some(SpawnLoop { target, timer });
        flag
    }

    /// Stop the spawn loop. Returns false if none was running.
    pub fn stop_spawning(&mut self) -> bool {
        self.spawn_loop.take().is_some_and(|spawn| {
            spawn.timer.cancel();
            info!("spawn loop stopped");
            true
        })
    }

    /// True while a spawn loop is running.
    pub fn is_spawning(&self) -> bool {
        self.spawn_loop
            .as_ref()
            .is_some_and(|spawn| !spawn.timer.is_cancelled())
    }

    fn run_spawn_loop(&mut self, delta: f32) {
        let Some(spawn) = self.spawn_loop.as_mut() else {
            return;
        };
        if spawn.timer.is_cancelled() {
            self.spawn_loop = None;
            return;
        }
        let fires = spawn.timer.advance(delta);
        let target = spawn.target.clone();
        // A long frame can owe far more cycles than the task limit allows.
        let cycles = usize::try_from(fires)
            .unwrap_or(usize::MAX)
            .min(self.settings.max_tasks.max(1));
        for _ in 0..cycles {
            self.spawn_cycle(&target);
        }
    }

    fn spawn_cycle(&mut self, target: &SpawnTarget) {
        let live = self.tasks.len();
        if live >= self.settings.max_tasks {
            let skipped = DispatchError::TaskLimitReached {
                live,
                max: self.settings.max_tasks,
            };
            debug!(reason = %skipped, "spawn cycle skipped");
            return;
        }
        let result = match target {
            SpawnTarget::Random => self.try_spawn_random(),
            SpawnTarget::Region(region) => self.try_spawn_in(region),
        };
        match result {
            Ok(_) => {}
            Err(e) if e.is_retryable() => debug!(error = %e, "spawn cycle skipped"),
            Err(e) => warn!(error = %e, "spawn cycle failed"),
        }
    }

    /// Persisted form of regions and live tasks.
    pub fn save(&self) -> SaveData {
        SaveData {
            regions: self.regions.values().map(Region::to_save).collect(),
            tasks: self.tasks.values().map(Task::to_save).collect(),
            next_id: self.next_id,
        }
    }

    /// Replace the current state with `data`.
    ///
    /// Live tasks are removed first. Each in-flight task gets a vehicle bound
    /// and routed again with its timers untouched; Returning tasks get the
    /// vehicle flagged and routed home. Tasks whose region is unknown or for
    /// which no vehicle can be restored are skipped.
    pub fn load(&mut self, data: SaveData) -> LoadReport {
        let live: Vec<TaskId> = self.tasks.keys().copied().collect();
        for id in live {
            if let Err(e) = self.remove_task(id) {
                warn!(task = id, error = %e, "task not removed before load");
            }
        }

        for save in &data.regions {
            match self.regions.get_mut(&save.id) {
                Some(region) => region.restore(save),
                None => warn!(region = %save.id, "saved region no longer exists"),
            }
        }

        let mut report = LoadReport::default();
        let mut next_id = data.next_id.max(1);
        for save in data.tasks {
            let id = save.id;
            next_id = next_id.max(id + 1);
            match self.restore_task(save) {
                Ok(()) => report.loaded += 1,
                Err(e) => {
                    error!(task = id, error = %e, "saved task skipped");
                    report.skipped.push(id);
                }
            }
        }
        self.next_id = next_id;
        info!(loaded = report.loaded, skipped = report.skipped.len(), "state loaded");
        report
    }

    fn restore_task(&mut self, save: TaskSave) -> Result<(), DispatchError> {
        if !self.regions.contains_key(&save.region) {
            return Err(DispatchError::UnknownRegion(save.region));
        }
        if self.tasks.contains_key(&save.id) {
            return Err(DispatchError::InvalidState {
                task: save.id,
                status: save.status,
            });
        }

        let receivers = self.receivers.receivers_for(&save.payload.kinds);
        let mut task = Task::from_save(save, receivers, self.settings.blocker_poll_secs);

        if task.status() != TaskStatus::Idle {
            let vehicle = self.pool.acquire().ok_or(DispatchError::NoVehicleAvailable)?;
            self.pool.dispatch(vehicle, task.position())?;
            task.bind_vehicle(vehicle);
            if task.status() == TaskStatus::Returning {
                self.send_home(task.id(), vehicle);
            }
            task.on_loaded();
        }

        self.announce(&task);
        self.tasks.insert(task.id(), task);
        Ok(())
    }
}

impl fmt::Debug for TaskOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskOrchestrator")
            .field("regions", &self.regions.keys().collect::<Vec<_>>())
            .field("tasks", &self.tasks.len())
            .field("pool", &self.pool)
            .field("receivers", &self.receivers)
            .field("settings", &self.settings)
            .field("spawning", &self.is_spawning())
            .field("zoom", &self.zoom)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
