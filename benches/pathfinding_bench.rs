//! Benchmarks for the dispatch core.
//!
//! Benchmarks cover:
//! - A* corner-to-corner searches on square grids
//! - Full route planning with endpoint refinement
//! - Rejection sampling with a crowded region
//! - Orchestrator ticks with many live tasks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use fleet_dispatch::builders::build_orchestrator;
use fleet_dispatch::config::{
    FleetConfig, GeneratorConfig, RegionConfig, ShapeConfig, SimulationConfig, SpawnConfig, TaskPreset,
};
use fleet_dispatch::core::{PlacementSampler, Region};
use fleet_dispatch::nav::{find_node_path, GraphData, PathFinder, WaypointGraph};
use fleet_dispatch::util::{Rect, RegionId, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Fixtures
// ============================================================================

fn grid_data(size: usize, spacing: f32) -> GraphData {
    let mut nodes = Vec::with_capacity(size * size);
    let mut edges = Vec::new();
    for row in 0..size {
        for col in 0..size {
            let id = row * size + col;
            nodes.push(Vec3::xy(col as f32 * spacing, row as f32 * spacing));
            if col > 0 {
                edges.push((id - 1, id));
            }
            if row > 0 {
                edges.push((id - size, id));
            }
        }
    }
    GraphData { nodes, edges }
}

fn grid(size: usize) -> WaypointGraph {
    WaypointGraph::from_data(&grid_data(size, 10.0)).unwrap()
}

fn sim_config(vehicles: usize, max_tasks: usize) -> SimulationConfig {
    SimulationConfig {
        spawn: SpawnConfig {
            interval_secs: 0.1,
            max_tasks,
            min_spacing: 2.0,
            max_attempts: 20,
            autostart: true,
        },
        fleet: FleetConfig {
            homes: vec![Vec3::ZERO; vehicles],
            speed: 20.0,
            work_time_secs: 2.0,
        },
        generator: GeneratorConfig {
            presets: vec![TaskPreset {
                name: "bench".into(),
                duration_secs: 1_000.0,
                experience: 1,
                entities: vec!["crate".into()],
                weight: 1.0,
            }],
            money_chance: 0.5,
            money_reward: 1,
            predefined: Vec::new(),
        },
        regions: vec![RegionConfig {
            id: RegionId::new("bench"),
            unlocked: true,
            shape: ShapeConfig::Rect(Rect::new(0.0, 0.0, 190.0, 190.0)),
        }],
        graph: grid_data(20, 10.0),
        blocker_poll_secs: 1.0,
        sync_interval_secs: 1.0,
        zoom: 1.0,
        seed: Some(1),
    }
}

// ============================================================================
// Routing
// ============================================================================

fn bench_astar_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("astar_grid");

    for size in [10_usize, 30, 60] {
        let g = grid(size);
        let target = size * size - 1;
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &g, |b, g| {
            b.iter(|| black_box(find_node_path(g, 0, target).unwrap()));
        });
    }
    group.finish();
}

fn bench_find_path_refined(c: &mut Criterion) {
    let finder = PathFinder::new(Arc::new(grid(30)));
    c.bench_function("find_path_refined", |b| {
        b.iter(|| {
            black_box(
                finder
                    .find_path(black_box(Vec3::xy(1.0, 2.0)), black_box(Vec3::xy(281.0, 144.0)))
                    .unwrap(),
            )
        });
    });
}

// ============================================================================
// Placement
// ============================================================================

fn bench_placement_crowded(c: &mut Criterion) {
    let region = Region::new(RegionId::new("square"), Box::new(Rect::new(0.0, 0.0, 100.0, 100.0)), true);
    let sampler = PlacementSampler::new(20, 5.0);
    let occupied: Vec<Vec3> = (0..100)
        .map(|i| Vec3::xy((i % 10) as f32 * 10.0 + 5.0, (i / 10) as f32 * 10.0 + 5.0))
        .collect();

    c.bench_function("placement_crowded", |b| {
        let mut rng = StdRng::seed_from_u64(3);
        b.iter(|| black_box(sampler.sample(&region, &occupied, 1.0, &mut rng).ok()));
    });
}

// ============================================================================
// Orchestrator
// ============================================================================

fn bench_orchestrator_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("orchestrator_tick");

    for tasks in [10_usize, 100] {
        let mut orchestrator = build_orchestrator(sim_config(tasks / 2, tasks)).unwrap();
        for _ in 0..tasks * 2 {
            orchestrator.tick(0.1);
        }
        let ids: Vec<u64> = orchestrator.tasks().map(|t| t.id()).collect();
        for id in ids {
            let _ = orchestrator.dispatch(id);
        }

        group.bench_function(BenchmarkId::from_parameter(tasks), |b| {
            b.iter(|| orchestrator.tick(black_box(1.0 / 60.0)));
        });
    }
    group.finish();
}

criterion_group!(routing_benches, bench_astar_grid, bench_find_path_refined);
criterion_group!(placement_benches, bench_placement_crowded);
criterion_group!(orchestrator_benches, bench_orchestrator_tick);

criterion_main!(routing_benches, placement_benches, orchestrator_benches);
