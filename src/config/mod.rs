//! Configuration models for spawning, the fleet, generation and the map.

pub mod simulation;

pub use simulation::{
    FleetConfig, GeneratorConfig, PredefinedTask, RegionConfig, ShapeConfig, SimulationConfig, SpawnConfig,
    TaskPreset,
};
