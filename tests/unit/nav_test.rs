//! Tests for the waypoint graph and route planning

use std::sync::Arc;

use fleet_dispatch::nav::{edge_cost, find_node_path, GraphData, GraphError, PathFinder, WaypointGraph, WaypointNode};
use fleet_dispatch::util::Vec3;

fn grid(size: usize, spacing: f32) -> WaypointGraph {
    let mut nodes = Vec::new();
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
    WaypointGraph::from_data(&GraphData { nodes, edges }).unwrap()
}

#[test]
fn test_edge_cost_rounds_ties_to_even() {
    assert_eq!(edge_cost(Vec3::ZERO, Vec3::xy(3.0, 4.0)), 5);
    assert_eq!(edge_cost(Vec3::ZERO, Vec3::xy(2.5, 0.0)), 2);
    assert_eq!(edge_cost(Vec3::ZERO, Vec3::xy(3.5, 0.0)), 4);
}

#[test]
fn test_grid_corner_to_corner_is_manhattan() {
    let g = grid(5, 10.0);
    let path = find_node_path(&g, 0, 24).unwrap();
    assert_eq!(path.len(), 9);
    assert_eq!(path.first(), Some(&0));
    assert_eq!(path.last(), Some(&24));
    for pair in path.windows(2) {
        assert!(g.neighbors(pair[0]).contains(&pair[1]));
    }
}

#[test]
fn test_search_is_deterministic() {
    let g = grid(6, 7.0);
    let first = find_node_path(&g, 3, 32).unwrap();
    for _ in 0..5 {
        assert_eq!(find_node_path(&g, 3, 32).unwrap(), first);
    }
}

#[test]
fn test_find_path_snaps_to_nearest_nodes() {
    let finder = PathFinder::new(Arc::new(grid(3, 10.0)));
    let route = finder.find_path(Vec3::xy(-1.0, -1.0), Vec3::xy(19.0, 14.0)).unwrap();

    assert_eq!(route.nodes.first(), Some(&0));
    let end = route.endpoint().unwrap();
    // Nearest node is (20, 10); the refined end sits on an edge leaving it.
    assert!((end.x - 20.0).abs() < 1e-4 || (end.y - 10.0).abs() < 1e-4);
    assert!(end.distance(Vec3::xy(19.0, 14.0)) <= Vec3::xy(20.0, 10.0).distance(Vec3::xy(19.0, 14.0)));
    assert!(route.length() > 0.0);
}

#[test]
fn test_from_data_rejects_dangling_edge() {
    let data = GraphData {
        nodes: vec![Vec3::ZERO],
        edges: vec![(0, 3)],
    };
    assert!(WaypointGraph::from_data(&data).is_err());
}

#[test]
fn test_new_rejects_one_way_link() {
    let nodes = vec![
        WaypointNode {
            position: Vec3::ZERO,
            neighbors: vec![1],
        },
        WaypointNode {
            position: Vec3::xy(1.0, 0.0),
            neighbors: vec![],
        },
    ];
    assert_eq!(WaypointGraph::new(nodes), Err(GraphError::Asymmetric { a: 0, b: 1 }));
}

#[test]
fn test_nearest_node_ties_go_to_lowest_id() {
    let g = grid(2, 10.0);
    assert_eq!(g.nearest_node(Vec3::xy(5.0, 5.0)), Some(0));
    assert_eq!(g.nearest_node(Vec3::xy(10.0, 5.0)), Some(1));
    assert_eq!(WaypointGraph::default().nearest_node(Vec3::ZERO), None);
}
