//! Waypoint graph stored as an index arena.
//!
//! Nodes are addressed by their position in the arena and adjacency is kept as
//! index lists. The graph is immutable once built; symmetry of the adjacency
//! is checked once at load time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::geometry::Vec3;

/// Index of a node inside a [`WaypointGraph`].
pub type NodeId = usize;

/// Load-time integrity violations of a waypoint graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A neighbor index points outside the arena.
    #[error("node {node} references missing neighbor {neighbor}")]
    DanglingNeighbor {
        /// Node holding the bad reference.
        node: NodeId,
        /// Out-of-range neighbor index.
        neighbor: NodeId,
    },
    /// `a` lists `b` as a neighbor but `b` does not list `a`.
    #[error("asymmetric edge: {a} -> {b} has no reverse link")]
    Asymmetric {
        /// Node with the one-way link.
        a: NodeId,
        /// Node missing the reverse link.
        b: NodeId,
    },
    /// A node position is NaN or infinite.
    #[error("node {0} has a non-finite position")]
    NonFinite(NodeId),
}

/// A navigable waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointNode {
    /// World position.
    pub position: Vec3,
    /// Adjacent node indices.
    #[serde(default)]
    pub neighbors: Vec<NodeId>,
}

/// Serializable description of a graph: positions plus undirected edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// Node positions; the index is the node id.
    pub nodes: Vec<Vec3>,
    /// Undirected edges as index pairs.
    #[serde(default)]
    pub edges: Vec<(NodeId, NodeId)>,
}

/// Undirected waypoint graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointGraph {
    nodes: Vec<WaypointNode>,
}

impl WaypointGraph {
    /// Build a graph from explicit adjacency lists.
    ///
    /// Self-links and duplicate neighbors are dropped. Every link must have a
    /// matching reverse link; one-way links are rejected as an integrity error.
    pub fn new(mut nodes: Vec<WaypointNode>) -> Result<Self, GraphError> {
        let count = nodes.len();
        for (id, node) in nodes.iter_mut().enumerate() {
            if !(node.position.x.is_finite() && node.position.y.is_finite() && node.position.z.is_finite()) {
                return Err(GraphError::NonFinite(id));
            }
            let mut seen = Vec::with_capacity(node.neighbors.len());
            for &n in &node.neighbors {
                if n >= count {
                    return Err(GraphError::DanglingNeighbor { node: id, neighbor: n });
                }
                if n != id && !seen.contains(&n) {
                    seen.push(n);
                }
            }
            node.neighbors = seen;
        }

        let graph = Self { nodes };
        graph.validate_symmetry()?;
        Ok(graph)
    }

    /// Build a graph from positions and undirected edges. Both directions are
    /// linked, so the result is symmetric by construction.
    pub fn from_data(data: &GraphData) -> Result<Self, GraphError> {
        let mut nodes: Vec<WaypointNode> = data
            .nodes
            .iter()
            .map(|&position| WaypointNode {
                position,
                neighbors: Vec::new(),
            })
            .collect();

        let count = nodes.len();
        for &(a, b) in &data.edges {
            if a >= count {
                return Err(GraphError::DanglingNeighbor { node: b, neighbor: a });
            }
            if b >= count {
                return Err(GraphError::DanglingNeighbor { node: a, neighbor: b });
            }
            nodes[a].neighbors.push(b);
            nodes[b].neighbors.push(a);
        }

        Self::new(nodes)
    }

    fn validate_symmetry(&self) -> Result<(), GraphError> {
        for (a, node) in self.nodes.iter().enumerate() {
            for &b in &node.neighbors {
                if !self.nodes[b].neighbors.contains(&a) {
                    return Err(GraphError::Asymmetric { a, b });
                }
            }
        }
        Ok(())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a node.
    pub fn position(&self, id: NodeId) -> Option<Vec3> {
        self.nodes.get(id).map(|n| n.position)
    }

    /// Neighbors of a node; empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|n| n.neighbors.as_slice())
            .unwrap_or_default()
    }

    /// Nearest node to `point` by Euclidean distance.
    ///
    /// Ties go to the lowest node id (first encountered in arena order).
    pub fn nearest_node(&self, point: Vec3) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for (id, node) in self.nodes.iter().enumerate() {
            let d = node.position.distance(point);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((id, d)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Iterate `(id, node)` pairs in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &WaypointNode)> {
        self.nodes.iter().enumerate()
    }

    /// Convert back to the serializable description, one edge per pair.
    pub fn to_data(&self) -> GraphData {
        let mut edges = Vec::new();
        for (a, node) in self.iter() {
            for &b in &node.neighbors {
                if a < b {
                    edges.push((a, b));
                }
            }
        }
        GraphData {
            nodes: self.nodes.iter().map(|n| n.position).collect(),
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(x: f32, y: f32, neighbors: Vec<NodeId>) -> WaypointNode {
        WaypointNode {
            position: Vec3::xy(x, y),
            neighbors,
        }
    }

    #[test]
    fn test_rejects_asymmetric_links() {
        let err = WaypointGraph::new(vec![node(0.0, 0.0, vec![1]), node(1.0, 0.0, vec![])]).unwrap_err();
        assert_eq!(err, GraphError::Asymmetric { a: 0, b: 1 });
    }

    #[test]
    fn test_rejects_dangling_neighbor() {
        let err = WaypointGraph::new(vec![node(0.0, 0.0, vec![3])]).unwrap_err();
        assert!(matches!(err, GraphError::DanglingNeighbor { node: 0, neighbor: 3 }));
    }

    #[test]
    fn test_drops_self_links_and_duplicates() {
        let graph = WaypointGraph::new(vec![node(0.0, 0.0, vec![0, 1, 1]), node(1.0, 0.0, vec![0])]).unwrap();
        assert_eq!(graph.neighbors(0), &[1]);
    }

    #[test]
    fn test_from_data_links_both_directions() {
        let data = GraphData {
            nodes: vec![Vec3::xy(0.0, 0.0), Vec3::xy(5.0, 0.0), Vec3::xy(5.0, 5.0)],
            edges: vec![(0, 1), (1, 2)],
        };
        let graph = WaypointGraph::from_data(&data).unwrap();
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.to_data().edges, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_nearest_node_tie_breaks_to_first() {
        let data = GraphData {
            nodes: vec![Vec3::xy(-1.0, 0.0), Vec3::xy(1.0, 0.0)],
            edges: vec![(0, 1)],
        };
        let graph = WaypointGraph::from_data(&data).unwrap();
        assert_eq!(graph.nearest_node(Vec3::xy(0.0, 0.0)), Some(0));
        assert_eq!(graph.nearest_node(Vec3::xy(0.9, 0.0)), Some(1));
        assert_eq!(WaypointGraph::default().nearest_node(Vec3::ZERO), None);
    }
}
