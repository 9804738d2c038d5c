//! Builders to construct the orchestrator from configuration.

pub mod orchestrator_builder;

pub use orchestrator_builder::{build_from_json_file, build_orchestrator, OrchestratorBuilder};
