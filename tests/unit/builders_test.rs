//! Tests for builder modules

use std::sync::Arc;

use fleet_dispatch::builders::{build_from_json_file, build_orchestrator, OrchestratorBuilder};
use fleet_dispatch::config::{
    FleetConfig, GeneratorConfig, RegionConfig, ShapeConfig, SimulationConfig, SpawnConfig, TaskPreset,
};
use fleet_dispatch::core::{DispatchError, InMemorySyncSink, PoolEvent, SyncEvent};
use fleet_dispatch::nav::GraphData;
use fleet_dispatch::util::{now_ms, Rect, RegionId, Vec3};

fn config() -> SimulationConfig {
    SimulationConfig {
        spawn: SpawnConfig::default(),
        fleet: FleetConfig {
            homes: vec![Vec3::ZERO],
            speed: 20.0,
            work_time_secs: 1.0,
        },
        generator: GeneratorConfig {
            presets: vec![TaskPreset {
                name: "basic".into(),
                duration_secs: 60.0,
                experience: 1,
                entities: Vec::new(),
                weight: 1.0,
            }],
            money_chance: 0.0,
            money_reward: 0,
            predefined: Vec::new(),
        },
        regions: vec![RegionConfig {
            id: RegionId::new("yard"),
            unlocked: true,
            shape: ShapeConfig::Rect(Rect::new(0.0, 0.0, 100.0, 100.0)),
        }],
        graph: GraphData {
            nodes: vec![Vec3::ZERO, Vec3::xy(40.0, 0.0), Vec3::xy(40.0, 40.0)],
            edges: vec![(0, 1), (1, 2)],
        },
        blocker_poll_secs: 0.5,
        sync_interval_secs: 2.0,
        zoom: 1.5,
        seed: Some(1),
    }
}

#[test]
fn test_builder_applies_settings() {
    let orchestrator = build_orchestrator(config()).unwrap();
    let settings = orchestrator.settings();
    assert!((settings.spawn_interval_secs - 5.0).abs() < f32::EPSILON);
    assert_eq!(settings.max_tasks, 8);
    assert!((settings.blocker_poll_secs - 0.5).abs() < f32::EPSILON);
    assert!((settings.sync_interval_secs - 2.0).abs() < f32::EPSILON);
    assert!((orchestrator.zoom() - 1.5).abs() < f32::EPSILON);
    assert_eq!(orchestrator.pool().len(), 1);
}

#[test]
fn test_same_seed_same_spawns() {
    let mut a = OrchestratorBuilder::new(config()).with_seed(99).build().unwrap();
    let mut b = OrchestratorBuilder::new(config()).with_seed(99).build().unwrap();
    for _ in 0..3 {
        let ta = a.try_spawn_random().unwrap();
        let tb = b.try_spawn_random().unwrap();
        assert_eq!(a.task(ta).unwrap().position(), b.task(tb).unwrap().position());
    }
}

#[test]
fn test_sink_receives_pool_edges() {
    let sink = Arc::new(InMemorySyncSink::new(64));
    let mut orchestrator = OrchestratorBuilder::new(config()).with_sink(sink.clone()).build().unwrap();
    let id = orchestrator.try_spawn_random().unwrap();
    orchestrator.dispatch(id).unwrap();

    assert!(sink.events().contains(&SyncEvent::PoolAvailability {
        event: PoolEvent::Unavailable,
        available: 0
    }));
}

#[test]
fn test_invalid_graph_is_rejected() {
    let mut cfg = config();
    cfg.graph.edges.push((2, 7));
    assert!(matches!(
        OrchestratorBuilder::new(cfg).build(),
        Err(DispatchError::InvalidConfig(_))
    ));
}

#[test]
fn test_build_from_json_file() {
    let path = std::env::temp_dir().join(format!("fleet_dispatch_cfg_{}_{}.json", std::process::id(), now_ms()));
    std::fs::write(&path, serde_json::to_string(&config()).unwrap()).unwrap();

    let orchestrator = build_from_json_file(&path).unwrap();
    assert_eq!(orchestrator.regions().count(), 1);
    std::fs::remove_file(&path).ok();

    let err = build_from_json_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains("reading config"));
}
