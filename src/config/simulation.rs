//! Simulation configuration structures.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::region::{AlphaMask, MaskShape, Polygon, RegionShape};
use crate::nav::{GraphData, WaypointGraph};
use crate::util::geometry::{Rect, Vec3};
use crate::util::serde::{PayloadKind, RegionId};

const fn default_interval() -> f32 {
    5.0
}

const fn default_max_tasks() -> usize {
    8
}

const fn default_min_spacing() -> f32 {
    10.0
}

const fn default_max_attempts() -> u32 {
    20
}

const fn default_speed() -> f32 {
    10.0
}

const fn default_work_time() -> f32 {
    3.0
}

const fn default_one() -> f32 {
    1.0
}

const fn default_money_reward() -> u32 {
    100
}

const fn default_true() -> bool {
    true
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

fn default_kinds() -> Vec<PayloadKind> {
    vec![PayloadKind::Entity]
}

/// Spawn loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Seconds between spawn attempts.
    #[serde(default = "default_interval")]
    pub interval_secs: f32,
    /// Live-task ceiling; cycles at or above it are skipped.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,
    /// Minimum distance between tasks at zoom 1.
    #[serde(default = "default_min_spacing")]
    pub min_spacing: f32,
    /// Sampling attempts per placement.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Start the random spawn loop when the orchestrator is built.
    #[serde(default)]
    pub autostart: bool,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_tasks: default_max_tasks(),
            min_spacing: default_min_spacing(),
            max_attempts: default_max_attempts(),
            autostart: false,
        }
    }
}

/// Vehicle fleet settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// One home position per vehicle.
    pub homes: Vec<Vec3>,
    /// Driving speed in world units per second.
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Work time per job in seconds.
    #[serde(default = "default_work_time")]
    pub work_time_secs: f32,
}

/// Weighted template for random tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPreset {
    /// Preset name.
    pub name: String,
    /// Idle lifetime; non-positive makes the task special.
    pub duration_secs: f32,
    /// Region experience on claim.
    #[serde(default)]
    pub experience: u32,
    /// Entities one is drawn from uniformly.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Relative pick weight.
    #[serde(default = "default_one")]
    pub weight: f32,
}

/// Hand-authored task spawned on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredefinedTask {
    /// Lookup name.
    pub name: String,
    /// Idle lifetime; non-positive makes the task special.
    pub duration_secs: f32,
    /// Payload kinds.
    #[serde(default = "default_kinds")]
    pub kinds: Vec<PayloadKind>,
    /// Currency granted on claim.
    #[serde(default)]
    pub money_reward: u32,
    /// Region experience on claim.
    #[serde(default)]
    pub experience: u32,
    /// Linked entity.
    #[serde(default)]
    pub entity: Option<String>,
    /// Fixed spawn position; sampled when absent.
    #[serde(default)]
    pub position: Option<Vec3>,
}

/// Random task generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Weighted presets.
    pub presets: Vec<TaskPreset>,
    /// Probability in `0..=1` that a task also carries money.
    #[serde(default = "default_one")]
    pub money_chance: f32,
    /// Money granted by tasks that carry it.
    #[serde(default = "default_money_reward")]
    pub money_reward: u32,
    /// Predefined tasks by name.
    #[serde(default)]
    pub predefined: Vec<PredefinedTask>,
}

/// Region boundary selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeConfig {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Simple polygon.
    Polygon {
        /// Vertices in order.
        points: Vec<Vec3>,
    },
    /// Alpha mask stretched over a rectangle.
    Mask {
        /// World-space placement.
        bounds: Rect,
        /// Alpha grid.
        mask: AlphaMask,
    },
}

impl ShapeConfig {
    /// Check shape data.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Rect(rect) if !rect.is_valid() => Err("rect must have positive area".into()),
            Self::Polygon { points } if points.len() < 3 => Err("polygon needs at least 3 points".into()),
            Self::Polygon { points } if !points.iter().all(|p| p.is_finite()) => {
                Err("polygon points must be finite".into())
            }
            Self::Mask { bounds, .. } if !bounds.is_valid() => Err("mask bounds must have positive area".into()),
            Self::Mask { mask, .. } if !mask.is_valid() => Err("mask size does not match alpha data".into()),
            _ => Ok(()),
        }
    }

    /// Build the runtime shape.
    pub fn build(&self) -> Result<Box<dyn RegionShape>, String> {
        self.validate()?;
        Ok(match self {
            Self::Rect(rect) => Box::new(*rect),
            Self::Polygon { points } => {
                Box::new(Polygon::new(points.clone()).ok_or("polygon needs at least 3 points")?)
            }
            Self::Mask { bounds, mask } => Box::new(MaskShape::new(*bounds, mask.clone())),
        })
    }
}

/// One spawn region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region id.
    pub id: RegionId,
    /// Unlocked at start.
    #[serde(default = "default_true")]
    pub unlocked: bool,
    /// Boundary.
    pub shape: ShapeConfig,
}

/// Root simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Spawn loop.
    #[serde(default)]
    pub spawn: SpawnConfig,
    /// Vehicles.
    pub fleet: FleetConfig,
    /// Task generation.
    pub generator: GeneratorConfig,
    /// Spawn regions.
    pub regions: Vec<RegionConfig>,
    /// Road network.
    pub graph: GraphData,
    /// Seconds between blocker re-polls of idle tasks.
    #[serde(default = "default_one")]
    pub blocker_poll_secs: f32,
    /// Seconds between presentation snapshots.
    #[serde(default = "default_one")]
    pub sync_interval_secs: f32,
    /// Initial view zoom that scales task spacing.
    #[serde(default = "default_one")]
    pub zoom: f32,
    /// RNG seed; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SpawnConfig {
    /// Validate spawn values.
    pub fn validate(&self) -> Result<(), String> {
        if !positive(self.interval_secs) {
            return Err("interval_secs must be greater than 0".into());
        }
        if self.max_tasks == 0 {
            return Err("max_tasks must be greater than 0".into());
        }
        if !non_negative(self.min_spacing) {
            return Err("min_spacing must not be negative".into());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".into());
        }
        Ok(())
    }
}

impl FleetConfig {
    /// Validate fleet values.
    pub fn validate(&self) -> Result<(), String> {
        if self.homes.is_empty() {
            return Err("at least one vehicle home must be defined".into());
        }
        if !self.homes.iter().all(|h| h.is_finite()) {
            return Err("vehicle homes must be finite".into());
        }
        if !positive(self.speed) {
            return Err("speed must be a positive number".into());
        }
        if !non_negative(self.work_time_secs) {
            return Err("work_time_secs must not be negative".into());
        }
        Ok(())
    }
}

impl GeneratorConfig {
    /// Validate generator values.
    pub fn validate(&self) -> Result<(), String> {
        if self.presets.is_empty() {
            return Err("at least one preset must be defined".into());
        }
        if !(0.0..=1.0).contains(&self.money_chance) {
            return Err("money_chance must be within 0..=1".into());
        }
        for preset in &self.presets {
            if !non_negative(preset.weight) {
                return Err(format!("preset `{}` has an invalid weight", preset.name));
            }
            if !preset.duration_secs.is_finite() {
                return Err(format!("preset `{}` has a non-finite duration", preset.name));
            }
        }
        if self.presets.iter().all(|p| p.weight <= 0.0) {
            return Err("at least one preset needs a positive weight".into());
        }
        let mut names = HashSet::new();
        for task in &self.predefined {
            if !names.insert(task.name.as_str()) {
                return Err(format!("predefined task `{}` is defined twice", task.name));
            }
            if !task.duration_secs.is_finite() {
                return Err(format!("predefined task `{}` has a non-finite duration", task.name));
            }
            if task.position.is_some_and(|p| !p.is_finite()) {
                return Err(format!("predefined task `{}` has a non-finite position", task.name));
            }
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Validate every section, the region set and the graph.
    pub fn validate(&self) -> Result<(), String> {
        self.spawn.validate().map_err(|e| format!("spawn invalid: {e}"))?;
        self.fleet.validate().map_err(|e| format!("fleet invalid: {e}"))?;
        self.generator
            .validate()
            .map_err(|e| format!("generator invalid: {e}"))?;

        if self.regions.is_empty() {
            return Err("at least one region must be defined".into());
        }
        let mut ids = HashSet::new();
        for region in &self.regions {
            if !ids.insert(region.id.as_str()) {
                return Err(format!("region `{}` is defined twice", region.id));
            }
            region
                .shape
                .validate()
                .map_err(|e| format!("region `{}` invalid: {e}", region.id))?;
        }

        if self.graph.nodes.is_empty() {
            return Err("graph must have at least one node".into());
        }
        WaypointGraph::from_data(&self.graph).map_err(|e| format!("graph invalid: {e}"))?;

        for (name, value) in [
            ("blocker_poll_secs", self.blocker_poll_secs),
            ("sync_interval_secs", self.sync_interval_secs),
            ("zoom", self.zoom),
        ] {
            if !positive(value) {
                return Err(format!("{name} must be greater than 0"));
            }
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
