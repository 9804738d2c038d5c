//! Waypoint graph and route planning.

pub mod astar;
pub mod graph;

pub use astar::{edge_cost, find_node_path, PathError, PathFinder, RoutePath};
pub use graph::{GraphData, GraphError, NodeId, WaypointGraph, WaypointNode};
