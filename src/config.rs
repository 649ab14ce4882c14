//! Tunable constants. Kept as literal `const`s the way the teacher's runtime
//! timing values are (`FRAME_RATE_MILLIS`, `GAME_STEP_MILLIS`); the handful
//! of values the spec calls out as explicitly parameterized (discretization
//! ratio, salvage threshold, which planner to run) live on [`SimulationConfig`]
//! instead since callers are expected to vary them per session.

use std::time::Duration;

pub const MAP_WIDTH: u32 = 600;
pub const MAP_HEIGHT: u32 = 400;

/// Obstacle dilation radius applied when building [`crate::map::MapData::inflated`].
pub const ACTOR_RADIUS: f32 = 6.0;

pub const PLAYER_MAX_HEALTH: i32 = 250;
pub const PLAYER_WALK_SPEED: f32 = 65.0;
pub const PLAYER_RUN_SPEED: f32 = 100.0;

pub const ZOMBIE_MIN_SPEED: f32 = 20.0;
pub const ZOMBIE_MAX_SPEED: f32 = 45.0;

pub const MAX_ZOMBIES: usize = 25;

/// World-units within which a zombie is considered to have arrived at its
/// next waypoint and may consume it.
pub const WAYPOINT_ARRIVAL_RADIUS: f32 = 2.0;

pub const PHYSICS_TICK_PERIOD: Duration = Duration::from_millis(25);
pub const PLANNER_TICK_PERIOD: Duration = Duration::from_millis(100);

/// `FRAME_PERIOD / 2`, the timeout the physics tick gives itself when trying
/// to acquire the actor lock before skipping a frame's actor mutation.
pub const PHYSICS_LOCK_TIMEOUT: Duration = Duration::from_millis(12);

/// Discretization ratio `D` used by the grid and visibility-graph planners.
pub const DEFAULT_GRID_RATIO: f32 = 3.0;
/// Vertex-deduplication threshold `T` used by visibility-graph construction.
pub const DEFAULT_CLEANLINESS_THRESHOLD: f32 = 10.0;

/// Values a session is expected to vary across maps/difficulty levels,
/// unlike the engineering constants above.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    /// `D`: world-units per discretized cell/raycast step for grid and VG planners.
    pub grid_ratio: f32,
    /// `T`: visibility-graph vertex deduplication radius.
    pub cleanliness_threshold: f32,
    /// World-unit distance within which `salvage_path` will reuse an old path.
    pub salvage_threshold: f32,
    pub planner_kind: PlannerKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            grid_ratio: DEFAULT_GRID_RATIO,
            cleanliness_threshold: DEFAULT_CLEANLINESS_THRESHOLD,
            salvage_threshold: 5.0,
            planner_kind: PlannerKind::GridAStar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerKind {
    GridDijkstra,
    GridAStar,
    VisibilityGraphDijkstra,
    VisibilityGraphAStar,
    Rrt,
}
