//! Tests for the admin surface and the tokio ticker

use std::sync::Arc;
use std::time::Duration;

use fleet_dispatch::builders::build_orchestrator;
use fleet_dispatch::config::{
    FleetConfig, GeneratorConfig, RegionConfig, ShapeConfig, SimulationConfig, SpawnConfig, TaskPreset,
};
use fleet_dispatch::core::{DispatchError, TaskStatus};
use fleet_dispatch::nav::GraphData;
use fleet_dispatch::runtime::{execute, parse_command, AdminCommand, CommandOutcome, TokioTicker};
use fleet_dispatch::util::{Rect, RegionId, Vec3};
use parking_lot::Mutex;

fn config() -> SimulationConfig {
    SimulationConfig {
        spawn: SpawnConfig {
            interval_secs: 0.05,
            max_tasks: 3,
            min_spacing: 1.0,
            max_attempts: 20,
            autostart: false,
        },
        fleet: FleetConfig {
            homes: vec![Vec3::ZERO],
            speed: 10.0,
            work_time_secs: 1.0,
        },
        generator: GeneratorConfig {
            presets: vec![TaskPreset {
                name: "basic".into(),
                duration_secs: 600.0,
                experience: 1,
                entities: vec!["crate".into()],
                weight: 1.0,
            }],
            money_chance: 1.0,
            money_reward: 5,
            predefined: Vec::new(),
        },
        regions: vec![RegionConfig {
            id: RegionId::new("lot"),
            unlocked: true,
            shape: ShapeConfig::Rect(Rect::new(0.0, 0.0, 50.0, 50.0)),
        }],
        graph: GraphData {
            nodes: vec![Vec3::ZERO, Vec3::xy(50.0, 0.0), Vec3::xy(50.0, 50.0), Vec3::xy(0.0, 50.0)],
            edges: vec![(0, 1), (1, 2), (2, 3), (3, 0)],
        },
        blocker_poll_secs: 1.0,
        sync_interval_secs: 1.0,
        zoom: 1.0,
        seed: Some(4),
    }
}

#[test]
fn test_parse_command_variants() {
    assert_eq!(
        parse_command(r#"{"command":"stop_spawning"}"#).unwrap(),
        AdminCommand::StopSpawning
    );
    assert_eq!(
        parse_command(r#"{"command":"set_zoom","zoom":2.0}"#).unwrap(),
        AdminCommand::SetZoom { zoom: 2.0 }
    );
    assert_eq!(
        parse_command(r#"{"command":"start_spawning"}"#).unwrap(),
        AdminCommand::StartSpawning { region: None }
    );
    assert!(parse_command(r#"{"command":"launch_rockets"}"#)
        .unwrap_err()
        .starts_with("parse error"));
}

#[test]
fn test_execute_reports_errors() {
    let mut orchestrator = build_orchestrator(config()).unwrap();
    let err = execute(&mut orchestrator, AdminCommand::RemoveTask { task: 77 }).unwrap_err();
    assert!(matches!(err, DispatchError::UnknownTask(77)));

    let err = execute(&mut orchestrator, AdminCommand::SendVehicle { task: 77 }).unwrap_err();
    assert!(matches!(err, DispatchError::UnknownTask(77)));
}

#[test]
fn test_zoom_command_ignores_invalid_values() {
    let mut orchestrator = build_orchestrator(config()).unwrap();
    let outcome = execute(&mut orchestrator, AdminCommand::SetZoom { zoom: -3.0 }).unwrap();
    assert_eq!(outcome, CommandOutcome::Zoom { zoom: 1.0 });
    let outcome = execute(&mut orchestrator, AdminCommand::SetZoom { zoom: 0.5 }).unwrap();
    assert_eq!(outcome, CommandOutcome::Zoom { zoom: 0.5 });
}

#[test]
fn test_outcomes_serialize_tagged() {
    let json = serde_json::to_value(CommandOutcome::Dispatched { task: 4, vehicle: 0 }).unwrap();
    assert_eq!(json["outcome"], "dispatched");
    assert_eq!(json["vehicle"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ticker_drives_spawn_loop_and_dispatch() {
    let mut orchestrator = build_orchestrator(config()).unwrap();
    execute(&mut orchestrator, AdminCommand::StartSpawning { region: None }).unwrap();
    let shared = Arc::new(Mutex::new(orchestrator));

    let ticker = TokioTicker::current(Duration::from_millis(10)).unwrap();
    let handle = ticker.start(shared.clone());
    tokio::time::sleep(Duration::from_millis(400)).await;
    let ticks = handle.stop().await;

    assert!(ticks > 0);
    let mut orchestrator = shared.lock();
    assert_eq!(orchestrator.task_count(), 3);
    assert!(orchestrator.is_spawning());

    let first = orchestrator.tasks().next().unwrap().id();
    execute(&mut orchestrator, AdminCommand::SendVehicle { task: first }).unwrap();
    assert_eq!(orchestrator.task(first).unwrap().status(), TaskStatus::Dispatching);
}
