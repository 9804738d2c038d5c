//! A* search over a [`WaypointGraph`] and route endpoint refinement.
//!
//! Edge costs and the heuristic are both rounded Euclidean distances
//! (ties to even). Rounding keeps f-scores integral so equal-cost candidates
//! compare stably, at the price of treating near-equal paths as equal. The
//! rounded heuristic is not provably admissible, so in rare layouts the
//! returned path can be slightly longer than optimal.
//!
//! The open set is a plain list scanned for the minimum f-score. Among equal
//! f-scores the earliest discovered node wins, which makes the search
//! deterministic for a given graph.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::nav::graph::{NodeId, WaypointGraph};
use crate::util::geometry::{closest_point_on_segment, polyline_length, Vec3};

/// Routing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The graph has no nodes to route over.
    #[error("waypoint graph is empty")]
    EmptyGraph,
    /// The open set emptied before the target node was reached.
    #[error("no path between node {from} and node {to}")]
    NoPath {
        /// Node nearest to the start point.
        from: NodeId,
        /// Node nearest to the target point.
        to: NodeId,
    },
}

/// Integer travel cost between two points.
pub fn edge_cost(a: Vec3, b: Vec3) -> i64 {
    // Distances in a scene graph are far below i64 range.
    #[allow(clippy::cast_possible_truncation)]
    let cost = a.distance(b).round_ties_even() as i64;
    cost
}

/// Run A* between two nodes and return the node sequence `from..=to`.
pub fn find_node_path(graph: &WaypointGraph, from: NodeId, to: NodeId) -> Result<Vec<NodeId>, PathError> {
    let count = graph.len();
    if from >= count || to >= count {
        return Err(PathError::EmptyGraph);
    }
    let pos = |id: NodeId| graph.position(id).unwrap_or_default();
    let target_pos = pos(to);

    let mut open: Vec<NodeId> = vec![from];
    let mut closed = vec![false; count];
    let mut came_from: Vec<Option<NodeId>> = vec![None; count];
    let mut g_score = vec![i64::MAX; count];
    let mut f_score = vec![i64::MAX; count];
    g_score[from] = 0;
    f_score[from] = edge_cost(pos(from), target_pos);

    while !open.is_empty() {
        let mut best_idx = 0;
        for (i, &node) in open.iter().enumerate().skip(1) {
            if f_score[node] < f_score[open[best_idx]] {
                best_idx = i;
            }
        }
        let current = open[best_idx];

        if current == to {
            return Ok(reconstruct(&came_from, current));
        }

        open.remove(best_idx);
        closed[current] = true;

        for &neighbor in graph.neighbors(current) {
            if closed[neighbor] {
                continue;
            }

            let tentative = g_score[current] + edge_cost(pos(current), pos(neighbor));
            if !open.contains(&neighbor) {
                open.push(neighbor);
            } else if tentative >= g_score[neighbor] {
                continue;
            }

            came_from[neighbor] = Some(current);
            g_score[neighbor] = tentative;
            f_score[neighbor] = tentative + edge_cost(pos(neighbor), target_pos);
        }
    }

    Err(PathError::NoPath { from, to })
}

fn reconstruct(came_from: &[Option<NodeId>], mut current: NodeId) -> Vec<NodeId> {
    let mut path = vec![current];
    while let Some(prev) = came_from[current] {
        current = prev;
        path.push(current);
    }
    path.reverse();
    path
}

/// A routed path ready for a vehicle to follow.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// Graph nodes the route passes through, after refinement trimming.
    pub nodes: Vec<NodeId>,
    /// Points to drive through; the last one may be off-graph.
    pub waypoints: Vec<Vec3>,
}

impl RoutePath {
    /// Final point of the route.
    pub fn endpoint(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    /// Total driving distance.
    pub fn length(&self) -> f32 {
        polyline_length(&self.waypoints)
    }
}

/// Route planner bound to a shared waypoint graph.
#[derive(Debug, Clone)]
pub struct PathFinder {
    graph: Arc<WaypointGraph>,
}

impl PathFinder {
    /// Create a planner over `graph`.
    pub fn new(graph: Arc<WaypointGraph>) -> Self {
        Self { graph }
    }

    /// The graph this planner routes over.
    pub fn graph(&self) -> &WaypointGraph {
        &self.graph
    }

    /// Route between two world points.
    ///
    /// Both points snap to their nearest nodes for the search. The resulting
    /// route then ends at the point closest to `target` on one of the edges
    /// leaving the last node, instead of on the node itself.
    pub fn find_path(&self, start: Vec3, target: Vec3) -> Result<RoutePath, PathError> {
        let graph = self.graph.as_ref();
        let from = graph.nearest_node(start).ok_or(PathError::EmptyGraph)?;
        let to = graph.nearest_node(target).ok_or(PathError::EmptyGraph)?;

        let nodes = find_node_path(graph, from, to)?;
        debug!(from, to, hops = nodes.len(), "node path found");
        Ok(self.refine_endpoint(nodes, target))
    }

    /// Replace the route's final waypoint with the projection of `target`
    /// onto the best edge leaving the last node.
    ///
    /// Single-node routes are returned as-is. When the best edge leads back to
    /// the second-to-last node the last node is dropped, so the vehicle does
    /// not overshoot and turn around.
    pub fn refine_endpoint(&self, mut nodes: Vec<NodeId>, target: Vec3) -> RoutePath {
        let graph = self.graph.as_ref();
        let to_points = |ids: &[NodeId]| -> Vec<Vec3> {
            ids.iter().filter_map(|&id| graph.position(id)).collect()
        };

        if nodes.len() <= 1 {
            let waypoints = to_points(&nodes);
            return RoutePath { nodes, waypoints };
        }

        let last = nodes[nodes.len() - 1];
        let last_pos = graph.position(last).unwrap_or_default();
        let mut best: Option<(NodeId, Vec3, f32)> = None;
        for &neighbor in graph.neighbors(last) {
            let Some(neighbor_pos) = graph.position(neighbor) else {
                continue;
            };
            let candidate = closest_point_on_segment(target, last_pos, neighbor_pos);
            let distance = (target - candidate).length();
            if best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((neighbor, candidate, distance));
            }
        }

        let Some((neighbor, refined, _)) = best else {
            let waypoints = to_points(&nodes);
            return RoutePath { nodes, waypoints };
        };

        if neighbor == nodes[nodes.len() - 2] {
            nodes.pop();
        }
        let mut waypoints = to_points(&nodes);
        waypoints.push(refined);
        RoutePath { nodes, waypoints }
    }
}
