//! Builders to construct an orchestrator from configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::SimulationConfig;
use crate::core::{
    AppResult, DispatchError, FleetLimits, OrchestratorSettings, PlacementSampler, PoolListener, PoolSyncBridge,
    ReceiverHandle, Region, SpawnTarget, SpecialTaskHook, SyncSink, TaskGenerator, TaskOrchestrator, VehiclePool,
};
use crate::nav::{PathFinder, WaypointGraph};
use crate::util::serde::PayloadKind;

/// Assembles a [`TaskOrchestrator`] from configuration plus injected
/// collaborators.
pub struct OrchestratorBuilder {
    config: SimulationConfig,
    seed: Option<u64>,
    sink: Option<Arc<dyn SyncSink>>,
    receivers: Vec<(Option<PayloadKind>, ReceiverHandle)>,
    special_hooks: Vec<SpecialTaskHook>,
    pool_listeners: Vec<Arc<dyn PoolListener>>,
}

impl OrchestratorBuilder {
    /// Start from a configuration. It is validated in [`Self::build`].
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            seed: config.seed,
            config,
            sink: None,
            receivers: Vec::new(),
            special_hooks: Vec::new(),
            pool_listeners: Vec::new(),
        }
    }

    /// Seed the RNG, overriding the configured seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Mirror state to `sink`. Pool availability edges go there too.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn SyncSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Wire a receiver to every task.
    #[must_use]
    pub fn with_receiver(mut self, receiver: ReceiverHandle) -> Self {
        self.receivers.push((None, receiver));
        self
    }

    /// Wire a receiver to tasks carrying `kind`.
    #[must_use]
    pub fn with_receiver_for(mut self, kind: PayloadKind, receiver: ReceiverHandle) -> Self {
        self.receivers.push((Some(kind), receiver));
        self
    }

    /// Subscribe to special-task creation.
    #[must_use]
    pub fn with_special_task_hook(mut self, hook: SpecialTaskHook) -> Self {
        self.special_hooks.push(hook);
        self
    }

    /// Observe vehicle pool availability edges.
    #[must_use]
    pub fn with_pool_listener(mut self, listener: Arc<dyn PoolListener>) -> Self {
        self.pool_listeners.push(listener);
        self
    }

    /// Validate the configuration and assemble the orchestrator.
    pub fn build(self) -> Result<TaskOrchestrator, DispatchError> {
        let cfg = &self.config;
        cfg.validate()
            .map_err(|e| DispatchError::InvalidConfig(format!("config invalid: {e}")))?;

        let graph = WaypointGraph::from_data(&cfg.graph).map_err(|e| DispatchError::InvalidGraph(e.to_string()))?;
        let mut pool = VehiclePool::new(
            &cfg.fleet.homes,
            FleetLimits {
                speed: cfg.fleet.speed,
                work_time: cfg.fleet.work_time_secs,
            },
            PathFinder::new(Arc::new(graph)),
        );
        for listener in self.pool_listeners {
            pool = pool.with_listener(listener);
        }
        if let Some(sink) = &self.sink {
            pool = pool.with_listener(Arc::new(PoolSyncBridge::new(Arc::clone(sink))));
        }

        let mut regions = Vec::with_capacity(cfg.regions.len());
        for region in &cfg.regions {
            let shape = region
                .shape
                .build()
                .map_err(|e| DispatchError::InvalidConfig(format!("region `{}`: {e}", region.id)))?;
            regions.push(Region::new(region.id.clone(), shape, region.unlocked));
        }

        let settings = OrchestratorSettings {
            spawn_interval_secs: cfg.spawn.interval_secs,
            max_tasks: cfg.spawn.max_tasks,
            blocker_poll_secs: cfg.blocker_poll_secs,
            sync_interval_secs: cfg.sync_interval_secs,
        };
        let mut orchestrator = TaskOrchestrator::new(
            regions,
            Arc::new(pool),
            TaskGenerator::new(&cfg.generator),
            PlacementSampler::new(cfg.spawn.max_attempts, cfg.spawn.min_spacing),
            settings,
        );
        orchestrator.set_zoom(cfg.zoom);
        if let Some(seed) = self.seed {
            orchestrator.set_seed(seed);
        }
        if let Some(sink) = self.sink {
            orchestrator.set_sink(sink);
        }
        for (kind, receiver) in self.receivers {
            match kind {
                Some(kind) => orchestrator.add_receiver_for(kind, receiver),
                None => orchestrator.add_receiver(receiver),
            }
        }
        for hook in self.special_hooks {
            orchestrator.add_special_task_hook(hook);
        }
        if self.config.spawn.autostart {
            orchestrator.start_spawning(SpawnTarget::Random);
        }

        info!(
            regions = self.config.regions.len(),
            vehicles = self.config.fleet.homes.len(),
            nodes = self.config.graph.nodes.len(),
            "orchestrator built"
        );
        Ok(orchestrator)
    }
}

/// Build an orchestrator straight from configuration.
pub fn build_orchestrator(cfg: SimulationConfig) -> Result<TaskOrchestrator, DispatchError> {
    OrchestratorBuilder::new(cfg).build()
}

/// Read, validate and build from a JSON configuration file.
pub fn build_from_json_file(path: impl AsRef<Path>) -> AppResult<TaskOrchestrator> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let cfg = SimulationConfig::from_json_str(&raw)
        .map_err(anyhow::Error::msg)
        .with_context(|| format!("parsing config {}", path.display()))?;
    let orchestrator = build_orchestrator(cfg).with_context(|| format!("building from {}", path.display()))?;
    Ok(orchestrator)
}
