//! # Fleet Dispatch
//!
//! Tick-driven scheduling of delivery tasks served by a fixed pool of
//! vehicles that travel over a waypoint graph.
//!
//! The crate answers two questions for a simulation host: *when* does a
//! task change state, and *where* may a new task legally spawn. It renders
//! nothing and owns no scene graph; hosts observe it through sync sinks,
//! receivers and status queries.
//!
//! ## Key Pieces
//!
//! - **Task state machine**: `Idle -> Dispatching -> Working -> Returning`,
//!   forward only, one event per phase boundary, with idle expiry for
//!   non-special tasks
//! - **Vehicle pool**: first-free acquisition, dispatch and release under a
//!   single mutex, with edge-triggered availability events
//! - **Routing**: A* over a sparse waypoint graph with the final waypoint
//!   refined onto the nearest edge
//! - **Placement**: rejection sampling inside rectangle, polygon or
//!   alpha-mask regions with zoom-scaled spacing
//! - **Orchestrator**: spawn loop, receiver wiring, claims, save/load and
//!   admin commands
//!
//! ```rust,ignore
//! use fleet_dispatch::builders::OrchestratorBuilder;
//! use fleet_dispatch::config::SimulationConfig;
//! use fleet_dispatch::core::SpawnTarget;
//!
//! let cfg = SimulationConfig::from_json_str(&std::fs::read_to_string("sim.json")?)?;
//! let mut orchestrator = OrchestratorBuilder::new(cfg).with_seed(7).build()?;
//! orchestrator.start_spawning(SpawnTarget::Random);
//! loop {
//!     orchestrator.tick(1.0 / 30.0);
//! }
//! ```
//!
//! For complete scenarios, see `tests/dispatch_cycle_test.rs`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Task lifecycle, vehicle pooling, placement and orchestration.
pub mod core;
/// Waypoint graph and route planning.
pub mod nav;
/// Configuration models for spawning, the fleet, generation and the map.
pub mod config;
/// Builders to construct the orchestrator from configuration.
pub mod builders;
/// Infrastructure adapters for persisting orchestrator state.
pub mod infra;
/// Admin command surface and the runtime driver for the scheduling tick.
pub mod runtime;
/// Shared utilities.
pub mod util;
