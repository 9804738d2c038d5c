//! Tests for configuration validation

use fleet_dispatch::config::{
    FleetConfig, GeneratorConfig, PredefinedTask, RegionConfig, ShapeConfig, SimulationConfig, SpawnConfig,
    TaskPreset,
};
use fleet_dispatch::core::AlphaMask;
use fleet_dispatch::nav::GraphData;
use fleet_dispatch::util::{PayloadKind, Rect, RegionId, Vec3};

fn preset(name: &str, weight: f32) -> TaskPreset {
    TaskPreset {
        name: name.into(),
        duration_secs: 30.0,
        experience: 1,
        entities: vec!["crate".into()],
        weight,
    }
}

fn valid() -> SimulationConfig {
    SimulationConfig {
        spawn: SpawnConfig::default(),
        fleet: FleetConfig {
            homes: vec![Vec3::ZERO],
            speed: 10.0,
            work_time_secs: 3.0,
        },
        generator: GeneratorConfig {
            presets: vec![preset("basic", 1.0)],
            money_chance: 1.0,
            money_reward: 100,
            predefined: Vec::new(),
        },
        regions: vec![RegionConfig {
            id: RegionId::new("main"),
            unlocked: true,
            shape: ShapeConfig::Rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
        }],
        graph: GraphData {
            nodes: vec![Vec3::ZERO, Vec3::xy(10.0, 0.0)],
            edges: vec![(0, 1)],
        },
        blocker_poll_secs: 1.0,
        sync_interval_secs: 1.0,
        zoom: 1.0,
        seed: None,
    }
}

#[test]
fn test_simulation_config_validation() {
    assert!(valid().validate().is_ok());
}

#[test]
fn test_spawn_config_defaults() {
    let spawn = SpawnConfig::default();
    assert!((spawn.interval_secs - 5.0).abs() < f32::EPSILON);
    assert_eq!(spawn.max_tasks, 8);
    assert_eq!(spawn.max_attempts, 20);
    assert!(!spawn.autostart);
    assert!(spawn.validate().is_ok());
}

#[test]
fn test_spawn_config_invalid_interval() {
    let spawn = SpawnConfig {
        interval_secs: 0.0,
        ..SpawnConfig::default()
    };
    assert!(spawn.validate().is_err());

    let spawn = SpawnConfig {
        interval_secs: f32::NAN,
        ..SpawnConfig::default()
    };
    assert!(spawn.validate().is_err());
}

#[test]
fn test_spawn_config_invalid_limits() {
    let mut cfg = valid();
    cfg.spawn.max_tasks = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = valid();
    cfg.spawn.max_attempts = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_fleet_config_invalid_speed() {
    let mut cfg = valid();
    cfg.fleet.speed = -1.0;
    let err = cfg.validate().unwrap_err();
    assert!(err.starts_with("fleet invalid"));
}

#[test]
fn test_generator_config_invalid_chance_and_weights() {
    let mut cfg = valid();
    cfg.generator.money_chance = 1.5;
    assert!(cfg.validate().is_err());

    let mut cfg = valid();
    cfg.generator.presets = vec![preset("a", 0.0), preset("b", 0.0)];
    assert!(cfg.validate().is_err());

    let mut cfg = valid();
    cfg.generator.presets.clear();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_duplicate_predefined_names_rejected() {
    let task = PredefinedTask {
        name: "vip".into(),
        duration_secs: 0.0,
        kinds: vec![PayloadKind::Entity],
        money_reward: 0,
        experience: 0,
        entity: None,
        position: None,
    };
    let mut cfg = valid();
    cfg.generator.predefined = vec![task.clone(), task];
    assert!(cfg.validate().unwrap_err().contains("defined twice"));
}

#[test]
fn test_non_finite_timings_rejected() {
    let mut cfg = valid();
    cfg.generator.presets[0].duration_secs = f32::NAN;
    assert!(cfg.validate().unwrap_err().contains("non-finite duration"));

    let mut cfg = valid();
    cfg.generator.presets[0].duration_secs = f32::INFINITY;
    assert!(cfg.validate().is_err());

    let mut cfg = valid();
    cfg.generator.presets[0].duration_secs = 0.0;
    assert!(cfg.validate().is_ok());

    let mut cfg = valid();
    cfg.fleet.work_time_secs = f32::NAN;
    assert!(cfg.validate().unwrap_err().starts_with("fleet invalid"));

    let mut cfg = valid();
    cfg.generator.money_chance = f32::NAN;
    assert!(cfg.validate().is_err());

    for field in ["blocker_poll_secs", "sync_interval_secs"] {
        let mut cfg = valid();
        if field == "blocker_poll_secs" {
            cfg.blocker_poll_secs = f32::INFINITY;
        } else {
            cfg.sync_interval_secs = f32::NAN;
        }
        assert!(cfg.validate().unwrap_err().contains(field));
    }
}

#[test]
fn test_non_finite_coordinates_rejected() {
    let mut cfg = valid();
    cfg.fleet.homes.push(Vec3::xy(f32::NAN, 0.0));
    assert!(cfg.validate().is_err());

    let task = PredefinedTask {
        name: "vip".into(),
        duration_secs: f32::NAN,
        kinds: vec![PayloadKind::Entity],
        money_reward: 0,
        experience: 0,
        entity: None,
        position: None,
    };
    let mut cfg = valid();
    cfg.generator.predefined = vec![task.clone()];
    assert!(cfg.validate().unwrap_err().contains("non-finite duration"));

    let mut cfg = valid();
    cfg.generator.predefined = vec![PredefinedTask {
        duration_secs: 0.0,
        position: Some(Vec3::xy(1.0, f32::INFINITY)),
        ..task
    }];
    assert!(cfg.validate().unwrap_err().contains("non-finite position"));

    assert!(ShapeConfig::Polygon {
        points: vec![Vec3::ZERO, Vec3::xy(1.0, 0.0), Vec3::xy(0.0, f32::NAN)]
    }
    .validate()
    .is_err());
    assert!(ShapeConfig::Rect(Rect::new(f32::NAN, 0.0, 5.0, 5.0)).validate().is_err());
}

#[test]
fn test_duplicate_regions_rejected() {
    let mut cfg = valid();
    cfg.regions.push(cfg.regions[0].clone());
    assert!(cfg.validate().is_err());
}

#[test]
fn test_shape_validation() {
    assert!(ShapeConfig::Rect(Rect::new(0.0, 0.0, 0.0, 5.0)).validate().is_err());
    assert!(ShapeConfig::Polygon {
        points: vec![Vec3::ZERO, Vec3::xy(1.0, 0.0)]
    }
    .validate()
    .is_err());
    let mask = AlphaMask {
        width: 2,
        height: 2,
        alpha: vec![1, 2, 3],
    };
    assert!(ShapeConfig::Mask {
        bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
        mask
    }
    .validate()
    .is_err());
}

#[test]
fn test_graph_must_be_well_formed() {
    let mut cfg = valid();
    cfg.graph.edges.push((0, 9));
    assert!(cfg.validate().unwrap_err().starts_with("graph invalid"));

    let mut cfg = valid();
    cfg.graph = GraphData::default();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zoom_must_be_positive() {
    let mut cfg = valid();
    cfg.zoom = 0.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_from_json_applies_defaults() {
    let json = r#"{
        "fleet": { "homes": [ { "x": 1.0, "y": 2.0 } ] },
        "generator": { "presets": [ { "name": "p", "duration_secs": 10.0 } ] },
        "regions": [ { "id": "r", "shape": { "type": "rect", "x": 0.0, "y": 0.0, "width": 5.0, "height": 5.0 } } ],
        "graph": { "nodes": [ { "x": 0.0, "y": 0.0 } ] }
    }"#;
    let cfg = SimulationConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.spawn, SpawnConfig::default());
    assert!((cfg.fleet.speed - 10.0).abs() < f32::EPSILON);
    assert!((cfg.fleet.work_time_secs - 3.0).abs() < f32::EPSILON);
    assert!((cfg.generator.money_chance - 1.0).abs() < f32::EPSILON);
    assert_eq!(cfg.generator.money_reward, 100);
    assert!((cfg.generator.presets[0].weight - 1.0).abs() < f32::EPSILON);
    assert!(cfg.regions[0].unlocked);
    assert_eq!(cfg.fleet.homes[0], Vec3::xy(1.0, 2.0));
    assert!(cfg.seed.is_none());
}

#[test]
fn test_from_json_reports_parse_errors() {
    let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}
