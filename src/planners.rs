//! Concrete planners: each `config::PlannerKind` variant picks a
//! `pathfinding` traversal medium plus a heuristic (grid, visibility graph)
//! or goes straight to RRT, which doesn't go through `SearchMedium` at all.
//! Construction is one-time per map/config pairing; [`Planner::generate_path`]
//! is the per-query entry point every variant shares, so the planner tick
//! and the registry don't need to know which concrete strategy is active.

use std::sync::Arc;

use rand::Rng;

use geometry::Position;
use pathfinding::engine::Heuristic;
use pathfinding::graph::Graph;
use pathfinding::grid::GridMedium;
use pathfinding::rrt::{self, RrtParams, RrtWorld};
use pathfinding::{search, Path, SearchMedium};

use crate::config::{PlannerKind, SimulationConfig};
use crate::discretized::DiscretizedMap;
use crate::map::MapData;
use crate::visibility;

/// Adapts a ratio-1 `DiscretizedMap` to `pathfinding::rrt::RrtWorld`: RRT
/// samples and steers directly over the full-resolution inflated raster
/// rather than the coarser `D`-ratio grid the other planners search.
struct RrtMap {
    discretized: DiscretizedMap,
    bounds: (Position, Position),
}

impl RrtWorld for RrtMap {
    fn bounds(&self) -> (Position, Position) {
        self.bounds
    }

    fn path_is_clear(&self, from: Position, to: Position) -> (bool, Option<Position>) {
        self.discretized.path_is_clear_default(from, to)
    }
}

/// One concrete planning strategy, built once for a `(map, config)` pairing
/// and reused across many queries — this is what [`crate::registry::PlannerRegistry`]
/// holds a swappable handle to.
pub enum Planner {
    Grid(GridMedium<DiscretizedMap, DiscretizedMap>),
    VisibilityGraph(Graph<DiscretizedMap>),
    Rrt { world: RrtMap, params: RrtParams },
}

impl Planner {
    /// Builds the planner named by `config.planner_kind` over `map`. Doing
    /// the one-time vertex detection/deduplication/edge construction for a
    /// visibility-graph planner here, rather than per query, is what makes
    /// §4.3's "constructed once" invariant hold.
    pub fn build(map: Arc<MapData>, config: &SimulationConfig) -> Planner {
        match config.planner_kind {
            PlannerKind::GridDijkstra | PlannerKind::GridAStar => {
                let heuristic = heuristic_for(config.planner_kind);
                let discretized = DiscretizedMap::new(map, config.grid_ratio);
                Planner::Grid(GridMedium::new(
                    config.grid_ratio,
                    heuristic,
                    discretized.clone(),
                    discretized,
                ))
            }
            PlannerKind::VisibilityGraphDijkstra | PlannerKind::VisibilityGraphAStar => {
                let heuristic = heuristic_for(config.planner_kind);
                let discretized = DiscretizedMap::new(map, config.grid_ratio);
                let vertices = visibility::detect_and_deduplicate_vertices(
                    &discretized,
                    config.cleanliness_threshold,
                );
                let graph = visibility::build_visibility_graph(&discretized, &vertices, heuristic);
                Planner::VisibilityGraph(graph)
            }
            PlannerKind::Rrt => {
                let width = map.width() as f32;
                let height = map.height() as f32;
                let discretized = DiscretizedMap::new(map, 1.0);
                Planner::Rrt {
                    world: RrtMap {
                        discretized,
                        bounds: (Position::new(0.0, 0.0), Position::new(width, height)),
                    },
                    params: RrtParams::default(),
                }
            }
        }
    }

    /// Computes a fresh path from `start` to `goal`. Returns `None` when no
    /// path exists or (RRT, non-best-effort) the tree never reached the goal
    /// before timing out — a tolerated "planning failure" (§7), never an
    /// error.
    pub fn generate_path<R: Rng + ?Sized>(
        &mut self,
        start: Position,
        goal: Position,
        rng: &mut R,
    ) -> Option<Path> {
        match self {
            Planner::Grid(medium) => search(medium, start, goal),
            Planner::VisibilityGraph(graph) => search(graph, start, goal),
            Planner::Rrt { world, params } => rrt::plan(world, start, goal, params, rng),
        }
    }

    /// Minimum point count `salvage_path` requires for this planner kind:
    /// RRT accepts a 2-point path, grid/VG planners need at least 3 (§4.1's
    /// salvage shortcut paragraph).
    pub fn salvage_min_points(&self) -> usize {
        match self {
            Planner::Rrt { .. } => 2,
            Planner::Grid(_) | Planner::VisibilityGraph(_) => 3,
        }
    }

    /// Whether `start -> goal` is a direct, unobstructed line in this
    /// planner's representation. Only RRT's salvage path consults this (§4.1:
    /// "RRT additionally requires that newStart->newGoal is NOT directly
    /// clear, otherwise regenerate trivially") — grid/VG salvage has no such
    /// extra condition.
    pub fn straight_line_clear(&self, start: Position, goal: Position) -> bool {
        match self {
            Planner::Grid(medium) => medium.path_is_clear(start, goal),
            Planner::VisibilityGraph(graph) => graph.path_is_clear(start, goal),
            Planner::Rrt { world, .. } => world.path_is_clear(start, goal).0,
        }
    }

    pub fn is_rrt(&self) -> bool {
        matches!(self, Planner::Rrt { .. })
    }
}

fn heuristic_for(kind: PlannerKind) -> Heuristic {
    match kind {
        PlannerKind::GridDijkstra | PlannerKind::VisibilityGraphDijkstra => Heuristic::Zero,
        PlannerKind::GridAStar | PlannerKind::VisibilityGraphAStar => Heuristic::Euclidean,
        PlannerKind::Rrt => Heuristic::Zero,
    }
}
