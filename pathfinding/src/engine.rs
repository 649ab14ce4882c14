//! The generic best-first search procedure, parameterized over an abstract
//! [`SearchMedium`]. Grid search and visibility-graph search are both just
//! this procedure running over a different `SearchMedium` impl with a
//! different heuristic — Dijkstra and A* are the same code with
//! `heuristic` returning `0.0` or a Euclidean estimate, respectively.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use geometry::Position;

use crate::path::Path;

/// The set of hooks a traversal medium must provide for [`search`] to run
/// over it. `Node` is the medium's internal coordinate type (an integer
/// grid cell, a visibility-graph node id, ...); the engine never looks
/// inside it.
pub trait SearchMedium {
    type Node: Copy + Eq + Hash;

    /// Whether a straight line from `start` to `goal` is traversable in
    /// this medium's representation. When this holds, `search` emits the
    /// trivial two-point path without running the relaxation loop.
    fn path_is_clear(&self, start: Position, goal: Position) -> bool;

    /// Maps a node back to world coordinates.
    fn position_of(&self, node: Self::Node) -> Position;

    /// The full node collection to search over. Empty means "no path
    /// possible in this medium" regardless of endpoints.
    fn all_nodes(&self) -> Vec<Self::Node>;

    /// Lifts world-space `start`/`goal` into node space, returning the
    /// nodes to search from/to. May mutate the medium (e.g. a visibility
    /// graph temporarily gains start/goal nodes here).
    fn prepare(&mut self, start: Position, goal: Position) -> (Self::Node, Self::Node);

    /// Adjacency: nodes reachable from `node` in one hop.
    fn neighbors(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Non-negative cost of the `u -> v` edge.
    fn edge_cost(&self, u: Self::Node, v: Self::Node) -> f32;

    /// Admissible distance estimate from `node` to `goal`. Returning `0.0`
    /// unconditionally makes the search Dijkstra; returning the Euclidean
    /// distance between `position_of(node)` and `position_of(goal)` makes
    /// it A*.
    fn heuristic(&self, node: Self::Node, goal: Self::Node) -> f32;

    /// Undoes whatever `prepare` did (e.g. removing transient VG nodes).
    fn close(&mut self, start: Self::Node, goal: Self::Node);
}

/// Selects which heuristic a medium should use — `Zero` makes the search
/// behave as Dijkstra, `Euclidean` as A*. Both grid and visibility-graph
/// media branch on this at the same two call sites, so concrete planners
/// differ only in which variant they pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Zero,
    Euclidean,
}

impl Heuristic {
    pub fn evaluate(self, from: Position, to: Position) -> f32 {
        match self {
            Heuristic::Zero => 0.0,
            Heuristic::Euclidean => from.distance_to(&to),
        }
    }
}

/// A heap entry ordered by ascending `heuristic_cost`, turning Rust's
/// max-heap `BinaryHeap` into a min-heap the way the teacher's A*
/// implementation does for its own `f_score`. Stale entries (superseded
/// by a later decrease) are left in the heap and discarded lazily when
/// popped, which is the "remove+reinsert on decrease" the spec requires
/// without needing a priority queue that supports decrease-key directly.
struct HeapEntry<N> {
    heuristic_cost: f32,
    node: N,
}

impl<N> PartialEq for HeapEntry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.heuristic_cost == other.heuristic_cost
    }
}
impl<N> Eq for HeapEntry<N> {}

impl<N> PartialOrd for HeapEntry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for HeapEntry<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the smallest cost out.
        other
            .heuristic_cost
            .partial_cmp(&self.heuristic_cost)
            .unwrap_or(Ordering::Equal)
    }
}

/// Runs the generic shortest-path search over `medium` from `start` to
/// `goal`, both given in world coordinates. Returns `None` when `medium`
/// has no nodes at all, or when `goal`'s node is unreachable from
/// `start`'s node.
pub fn search<M: SearchMedium>(medium: &mut M, start: Position, goal: Position) -> Option<Path> {
    if medium.path_is_clear(start, goal) {
        return Some(Path::new(vec![start, goal], start, goal));
    }

    let (s, g) = medium.prepare(start, goal);

    if medium.all_nodes().is_empty() {
        medium.close(s, g);
        return None;
    }

    let mut tentative: HashMap<M::Node, f32> = HashMap::new();
    let mut source: HashMap<M::Node, M::Node> = HashMap::new();
    let mut visited: std::collections::HashSet<M::Node> = std::collections::HashSet::new();
    let mut heap: BinaryHeap<HeapEntry<M::Node>> = BinaryHeap::new();

    tentative.insert(s, 0.0);
    heap.push(HeapEntry {
        heuristic_cost: medium.heuristic(s, g),
        node: s,
    });

    let mut reached_goal = false;

    while let Some(HeapEntry { node, .. }) = heap.pop() {
        if visited.contains(&node) {
            continue;
        }
        visited.insert(node);

        if node == g {
            reached_goal = true;
            break;
        }

        let current_dist = *tentative.get(&node).expect("visited node must have a distance");
        for neighbor in medium.neighbors(node) {
            if visited.contains(&neighbor) {
                continue;
            }
            let candidate = current_dist + medium.edge_cost(node, neighbor);
            let better = match tentative.get(&neighbor) {
                Some(&existing) => candidate < existing,
                None => true,
            };
            if better {
                tentative.insert(neighbor, candidate);
                source.insert(neighbor, node);
                heap.push(HeapEntry {
                    heuristic_cost: candidate + medium.heuristic(neighbor, g),
                    node: neighbor,
                });
            }
        }
    }

    if !reached_goal {
        medium.close(s, g);
        return None;
    }

    let mut nodes = vec![g];
    let mut current = g;
    while let Some(&prev) = source.get(&current) {
        nodes.push(prev);
        current = prev;
    }
    nodes.reverse();

    let points: Vec<Position> = nodes.iter().map(|&n| medium.position_of(n)).collect();
    let original_start = medium.position_of(s);
    let original_goal = medium.position_of(g);

    medium.close(s, g);

    Some(Path::new(points, original_start, original_goal))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap as Map;

    /// A minimal in-memory medium for exercising the engine directly,
    /// independent of the grid/graph implementations: nodes are `u32`s
    /// with an explicit adjacency map and Euclidean positions.
    struct ToyMedium {
        positions: Map<u32, Position>,
        edges: Map<u32, Vec<(u32, f32)>>,
        use_heuristic: bool,
    }

    impl SearchMedium for ToyMedium {
        type Node = u32;

        fn path_is_clear(&self, _start: Position, _goal: Position) -> bool {
            false
        }

        fn position_of(&self, node: u32) -> Position {
            self.positions[&node]
        }

        fn all_nodes(&self) -> Vec<u32> {
            self.positions.keys().copied().collect()
        }

        fn prepare(&mut self, _start: Position, _goal: Position) -> (u32, u32) {
            (0, *self.positions.keys().max().unwrap())
        }

        fn neighbors(&self, node: u32) -> Vec<u32> {
            self.edges
                .get(&node)
                .map(|es| es.iter().map(|(n, _)| *n).collect())
                .unwrap_or_default()
        }

        fn edge_cost(&self, u: u32, v: u32) -> f32 {
            self.edges[&u].iter().find(|(n, _)| *n == v).unwrap().1
        }

        fn heuristic(&self, node: u32, goal: u32) -> f32 {
            if self.use_heuristic {
                self.position_of(node).distance_to(&self.position_of(goal))
            } else {
                0.0
            }
        }

        fn close(&mut self, _start: u32, _goal: u32) {}
    }

    fn diamond_medium(use_heuristic: bool) -> ToyMedium {
        // 0 -> 1 -> 3 (cost 10), 0 -> 2 -> 3 (cost 2), so the shortest path
        // must go through node 2.
        let mut positions = Map::new();
        positions.insert(0, Position::new(0.0, 0.0));
        positions.insert(1, Position::new(1.0, 1.0));
        positions.insert(2, Position::new(1.0, -1.0));
        positions.insert(3, Position::new(2.0, 0.0));

        let mut edges = Map::new();
        edges.insert(0, vec![(1, 9.0), (2, 1.0)]);
        edges.insert(1, vec![(3, 1.0)]);
        edges.insert(2, vec![(3, 1.0)]);
        edges.insert(3, vec![]);

        ToyMedium {
            positions,
            edges,
            use_heuristic,
        }
    }

    #[test]
    fn test_search_picks_cheapest_route_dijkstra() {
        let mut medium = diamond_medium(false);
        let path = search(&mut medium, Position::new(0.0, 0.0), Position::new(2.0, 0.0))
            .expect("path should exist");
        assert_eq!(path.points()[1], Position::new(1.0, -1.0));
    }

    #[test]
    fn test_astar_matches_dijkstra_cost_on_same_input() {
        let mut dijkstra_medium = diamond_medium(false);
        let mut astar_medium = diamond_medium(true);
        let dijkstra_path =
            search(&mut dijkstra_medium, Position::new(0.0, 0.0), Position::new(2.0, 0.0)).unwrap();
        let astar_path =
            search(&mut astar_medium, Position::new(0.0, 0.0), Position::new(2.0, 0.0)).unwrap();

        let cost = |p: &Path| -> f32 {
            p.points().windows(2).map(|w| w[0].distance_to(&w[1])).sum()
        };
        assert!((cost(&dijkstra_path) - cost(&astar_path)).abs() < 1e-4);
    }

    #[test]
    fn test_search_returns_none_when_medium_empty() {
        struct EmptyMedium;
        impl SearchMedium for EmptyMedium {
            type Node = u32;
            fn path_is_clear(&self, _s: Position, _g: Position) -> bool {
                false
            }
            fn position_of(&self, _n: u32) -> Position {
                Position::new(0.0, 0.0)
            }
            fn all_nodes(&self) -> Vec<u32> {
                vec![]
            }
            fn prepare(&mut self, _s: Position, _g: Position) -> (u32, u32) {
                (0, 1)
            }
            fn neighbors(&self, _n: u32) -> Vec<u32> {
                vec![]
            }
            fn edge_cost(&self, _u: u32, _v: u32) -> f32 {
                0.0
            }
            fn heuristic(&self, _n: u32, _g: u32) -> f32 {
                0.0
            }
            fn close(&mut self, _s: u32, _g: u32) {}
        }
        let mut medium = EmptyMedium;
        assert!(search(&mut medium, Position::new(0.0, 0.0), Position::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_search_clear_line_skips_relaxation() {
        struct ClearMedium;
        impl SearchMedium for ClearMedium {
            type Node = u32;
            fn path_is_clear(&self, _s: Position, _g: Position) -> bool {
                true
            }
            fn position_of(&self, _n: u32) -> Position {
                Position::new(0.0, 0.0)
            }
            fn all_nodes(&self) -> Vec<u32> {
                vec![0]
            }
            fn prepare(&mut self, _s: Position, _g: Position) -> (u32, u32) {
                panic!("prepare should not be called when the straight line is clear")
            }
            fn neighbors(&self, _n: u32) -> Vec<u32> {
                vec![]
            }
            fn edge_cost(&self, _u: u32, _v: u32) -> f32 {
                0.0
            }
            fn heuristic(&self, _n: u32, _g: u32) -> f32 {
                0.0
            }
            fn close(&mut self, _s: u32, _g: u32) {}
        }
        let mut medium = ClearMedium;
        let start = Position::new(10.0, 10.0);
        let goal = Position::new(590.0, 390.0);
        let path = search(&mut medium, start, goal).unwrap();
        assert_eq!(path.points(), &[start, goal]);
    }

    #[test]
    fn test_search_unreachable_returns_none() {
        let mut medium = ToyMedium {
            positions: {
                let mut m = Map::new();
                m.insert(0, Position::new(0.0, 0.0));
                m.insert(1, Position::new(5.0, 5.0));
                m
            },
            edges: {
                let mut m = Map::new();
                m.insert(0, vec![]);
                m.insert(1, vec![]);
                m
            },
            use_heuristic: false,
        };
        assert!(search(&mut medium, Position::new(0.0, 0.0), Position::new(5.0, 5.0)).is_none());
    }
}
