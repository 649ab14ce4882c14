//! The visibility-graph traversal medium: an undirected graph (stored as
//! symmetric directed edge pairs) over detected obstacle vertices, with
//! support for inserting a transient start/goal node per query and
//! removing them again afterwards.
//!
//! Vertex *detection* (turning a rasterized map into the node set) is not
//! this module's concern — that lives with the map representation that
//! knows how to rasterize in the first place. This module only knows about
//! nodes-with-positions and a visibility oracle to connect them.

use geometry::Position;

use crate::engine::{Heuristic, SearchMedium};

pub type NodeId = usize;

/// Whatever can answer "are these two world points mutually visible" for
/// the purposes of connecting graph nodes. `exclusion_radius` lets the
/// caller ignore obstacle vertices immediately around either endpoint —
/// needed because a node sits *on* an obstacle vertex and would otherwise
/// always obstruct its own sightlines.
pub trait VisibilityOracle {
    fn is_visible(&self, a: Position, b: Position, exclusion_radius: f32) -> bool;
}

/// A visibility graph. Nodes `0..permanent_count` are the graph's
/// permanent vertex set (fixed at construction); any node at or beyond
/// `permanent_count` is a transient start/goal node added by [`prepare`]
/// and removed by [`close`][SearchMedium::close].
///
/// `visibility` is owned rather than borrowed: the core crate's
/// `DiscretizedMap` is an `Arc` clone plus a ratio, so owning one here
/// lets a whole `Graph` be built once and kept alive in a planner struct
/// without fighting a self-referential lifetime.
pub struct Graph<V> {
    positions: Vec<Position>,
    adjacency: Vec<Vec<(NodeId, f32)>>,
    permanent_count: usize,
    heuristic: Heuristic,
    exclusion_radius: f32,
    visibility: V,
}

impl<V: VisibilityOracle> Graph<V> {
    pub fn new(heuristic: Heuristic, visibility: V, exclusion_radius: f32) -> Self {
        Graph {
            positions: Vec::new(),
            adjacency: Vec::new(),
            permanent_count: 0,
            heuristic,
            exclusion_radius,
            visibility,
        }
    }

    /// Adds a bare node with no edges. Used by construction before edges
    /// are known for the whole vertex set.
    pub fn add_node(&mut self, pos: Position) -> NodeId {
        let id = self.positions.len();
        self.positions.push(pos);
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds `pos` as a new node and connects it to every node currently in
    /// the graph that is mutually visible. Inserting every vertex this way
    /// during one-time construction is equivalent to checking every
    /// unordered pair once, since each node connects to all nodes that
    /// came before it.
    pub fn insert_node_connected(&mut self, pos: Position) -> NodeId {
        let new_id = self.add_node(pos);
        let existing: Vec<NodeId> = (0..new_id).collect();
        self.connect_to(new_id, &existing);
        new_id
    }

    fn connect_to(&mut self, node: NodeId, candidates: &[NodeId]) {
        let node_pos = self.positions[node];
        for &other in candidates {
            if other == node {
                continue;
            }
            let other_pos = self.positions[other];
            if self.visibility.is_visible(node_pos, other_pos, self.exclusion_radius)
            {
                self.add_edge(node, other, node_pos.distance_to(&other_pos));
            }
        }
    }

    /// Adds a symmetric edge `u <-> v` with weight `weight`, unless `u ==
    /// v` (no self-loops) or the edge already exists.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId, weight: f32) {
        if u == v {
            return;
        }
        if !self.adjacency[u].iter().any(|&(n, _)| n == v) {
            self.adjacency[u].push((v, weight));
        }
        if !self.adjacency[v].iter().any(|&(n, _)| n == u) {
            self.adjacency[v].push((u, weight));
        }
    }

    /// Locks in the current node/edge set as the graph's permanent
    /// structure. Must be called exactly once, after one-time construction
    /// and before any query (`pathfinding::search`) runs.
    pub fn finalize_construction(&mut self) {
        self.permanent_count = self.positions.len();
    }

    pub fn permanent_node_count(&self) -> usize {
        self.permanent_count
    }

    pub fn position_at(&self, id: NodeId) -> Position {
        self.positions[id]
    }

    pub fn edges_from(&self, id: NodeId) -> &[(NodeId, f32)] {
        &self.adjacency[id]
    }

    /// Every stored edge `(u, v, w)` has its inverse `(v, u, w)` present —
    /// used by tests and by construction-time sanity checks.
    pub fn is_symmetric(&self) -> bool {
        for (u, edges) in self.adjacency.iter().enumerate() {
            for &(v, w) in edges {
                let back = self.adjacency[v].iter().any(|&(n, bw)| n == u && (bw - w).abs() < 1e-4);
                if !back {
                    return false;
                }
            }
        }
        true
    }
}

impl<V: VisibilityOracle> SearchMedium for Graph<V> {
    type Node = NodeId;

    fn path_is_clear(&self, start: Position, goal: Position) -> bool {
        self.visibility.is_visible(start, goal, 0.0)
    }

    fn position_of(&self, node: NodeId) -> Position {
        self.positions[node]
    }

    fn all_nodes(&self) -> Vec<NodeId> {
        (0..self.positions.len()).collect()
    }

    fn prepare(&mut self, start: Position, goal: Position) -> (NodeId, NodeId) {
        let existing: Vec<NodeId> = (0..self.positions.len()).collect();
        let start_id = self.add_node(start);
        self.connect_to(start_id, &existing);

        let existing_with_start: Vec<NodeId> = (0..self.positions.len()).collect();
        let goal_id = self.add_node(goal);
        self.connect_to(goal_id, &existing_with_start);

        (start_id, goal_id)
    }

    fn neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency[node].iter().map(|&(n, _)| n).collect()
    }

    fn edge_cost(&self, u: NodeId, v: NodeId) -> f32 {
        self.adjacency[u]
            .iter()
            .find(|&&(n, _)| n == v)
            .map(|&(_, w)| w)
            .unwrap_or_else(|| self.positions[u].distance_to(&self.positions[v]))
    }

    fn heuristic(&self, node: NodeId, goal: NodeId) -> f32 {
        self.heuristic.evaluate(self.positions[node], self.positions[goal])
    }

    fn close(&mut self, start: NodeId, goal: NodeId) {
        for &transient in &[goal, start] {
            if transient >= self.adjacency.len() {
                continue;
            }
            let neighbors: Vec<NodeId> = self.adjacency[transient].iter().map(|&(n, _)| n).collect();
            for n in neighbors {
                if n < self.adjacency.len() {
                    self.adjacency[n].retain(|&(id, _)| id != transient);
                }
            }
        }
        self.positions.truncate(self.permanent_count);
        self.adjacency.truncate(self.permanent_count);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::search;

    #[derive(Clone, Copy)]
    struct AlwaysVisible;
    impl VisibilityOracle for AlwaysVisible {
        fn is_visible(&self, _a: Position, _b: Position, _excl: f32) -> bool {
            true
        }
    }

    /// Visible unless the straight line between the two points would pass
    /// through x == 5 somewhere between y == 0 and y == 10 (a vertical
    /// wall with a node-sized gap at each end).
    #[derive(Clone, Copy)]
    struct WallAtX5;
    impl VisibilityOracle for WallAtX5 {
        fn is_visible(&self, a: Position, b: Position, _excl: f32) -> bool {
            if (a.x < 5.0 && b.x < 5.0) || (a.x > 5.0 && b.x > 5.0) {
                return true;
            }
            if (a.x - 5.0).abs() < 1e-3 || (b.x - 5.0).abs() < 1e-3 {
                return true;
            }
            let t = (5.0 - a.x) / (b.x - a.x);
            let y_at_wall = a.y + t * (b.y - a.y);
            !(0.0..=8.0).contains(&y_at_wall)
        }
    }

    #[test]
    fn test_blank_graph_two_point_path() {
        let vis = AlwaysVisible;
        let mut graph = Graph::new(Heuristic::Euclidean, vis, 2.0);
        graph.finalize_construction();
        assert_eq!(graph.permanent_node_count(), 0);
        let path = search(&mut graph, Position::new(0.0, 0.0), Position::new(50.0, 50.0)).unwrap();
        assert_eq!(path.points(), &[Position::new(0.0, 0.0), Position::new(50.0, 50.0)]);
    }

    #[test]
    fn test_edges_are_symmetric_after_construction() {
        let vis = AlwaysVisible;
        let mut graph = Graph::new(Heuristic::Zero, vis, 2.0);
        graph.insert_node_connected(Position::new(0.0, 0.0));
        graph.insert_node_connected(Position::new(1.0, 1.0));
        graph.insert_node_connected(Position::new(2.0, 2.0));
        graph.finalize_construction();
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_close_removes_transient_nodes_and_their_back_edges() {
        let vis = AlwaysVisible;
        let mut graph = Graph::new(Heuristic::Euclidean, vis, 2.0);
        graph.insert_node_connected(Position::new(9.0, 9.0));
        graph.finalize_construction();
        assert_eq!(graph.permanent_node_count(), 1);

        let (s, g) = graph.prepare(Position::new(0.0, 0.0), Position::new(20.0, 20.0));
        assert_eq!(graph.all_nodes().len(), 3);
        assert!(graph.is_symmetric());
        graph.close(s, g);
        assert_eq!(graph.all_nodes().len(), 1);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_search_routes_through_wall_gap() {
        let vis = WallAtX5;
        let mut graph = Graph::new(Heuristic::Euclidean, vis, 0.75);
        // Vertices flanking the gap at the top of the wall (y in [0, 8]).
        graph.insert_node_connected(Position::new(4.5, 8.5));
        graph.insert_node_connected(Position::new(5.5, 8.5));
        graph.finalize_construction();

        let path = search(&mut graph, Position::new(0.0, 10.0), Position::new(10.0, 10.0)).unwrap();
        assert!(path.points().len() >= 3);
        for w in path.points().windows(2) {
            assert!(vis.is_visible(w[0], w[1], 0.75));
        }
    }
}
