//! Best-effort RRT planning. Unlike [`grid::GridMedium`][crate::grid::GridMedium]
//! and [`graph::Graph`][crate::graph::Graph] this does not go through
//! [`SearchMedium`][crate::engine::SearchMedium] — RRT grows a tree instead of
//! relaxing a fixed node set, so it gets its own entry point.

use std::time::{Duration, Instant};

use geometry::Position;
use rand::Rng;

use crate::path::Path;

/// Whatever RRT is planning over: a bounding box to sample within, and a
/// segment-clearance test that can report how far along a blocked segment
/// it got before hitting something (used to steer toward an obstacle
/// instead of discarding the whole sample).
pub trait RrtWorld {
    /// Inclusive (min, max) corners of the sampling region.
    fn bounds(&self) -> (Position, Position);

    /// Whether the straight segment `from -> to` is entirely clear. When it
    /// isn't, the second element is the furthest point along the segment
    /// that *is* still reachable, if one exists short of `from` itself.
    fn path_is_clear(&self, from: Position, to: Position) -> (bool, Option<Position>);
}

#[derive(Debug, Clone)]
pub struct RrtParams {
    /// Step length used both for steering toward a sample and for
    /// discretizing an interpolated checkpoint.
    pub interp: f32,
    pub timeout: Duration,
    /// If the tree never reaches the goal before `timeout`, return a path
    /// to the tree node closest to the goal instead of `None`.
    pub best_effort: bool,
    /// Probability of sampling the goal itself rather than a random point.
    pub goal_bias: f32,
}

impl Default for RrtParams {
    fn default() -> Self {
        RrtParams {
            interp: 2.5,
            timeout: Duration::from_millis(1500),
            best_effort: true,
            goal_bias: 0.05,
        }
    }
}

struct TreeNode {
    pos: Position,
    parent: Option<usize>,
}

/// Grows a tree from `start` toward `goal` under `params`, returning a
/// (possibly best-effort, possibly un-goal-reaching) [`Path`] or `None` if
/// the tree never got anywhere and `best_effort` is off.
pub fn plan<W: RrtWorld, R: Rng + ?Sized>(
    world: &W,
    start: Position,
    goal: Position,
    params: &RrtParams,
    rng: &mut R,
) -> Option<Path> {
    if world.path_is_clear(start, goal).0 {
        return Some(Path::new(vec![start, goal], start, goal));
    }

    let (min_corner, max_corner) = world.bounds();
    let deadline = Instant::now() + params.timeout;

    let mut nodes = vec![TreeNode { pos: start, parent: None }];
    let mut reached_goal_at: Option<usize> = None;

    while Instant::now() < deadline {
        let sample = if rng.gen::<f32>() < params.goal_bias {
            goal
        } else {
            Position::new(
                rng.gen_range(min_corner.x..=max_corner.x),
                rng.gen_range(min_corner.y..=max_corner.y),
            )
        };

        let nearest_idx = nearest_node(&nodes, sample);
        let nearest_pos = nodes[nearest_idx].pos;

        let to_sample = steer_target(nearest_pos, sample, params.interp);
        let (clear, furthest) = world.path_is_clear(nearest_pos, to_sample);
        let new_pos = if clear {
            Some(to_sample)
        } else {
            furthest.filter(|p| p.distance_to(&nearest_pos) > 1e-3)
        };

        let Some(new_pos) = new_pos else { continue };
        let new_idx = nodes.len();
        nodes.push(TreeNode { pos: new_pos, parent: Some(nearest_idx) });

        if world.path_is_clear(new_pos, goal).0 {
            let goal_idx = nodes.len();
            nodes.push(TreeNode { pos: goal, parent: Some(new_idx) });
            reached_goal_at = Some(goal_idx);
            break;
        }
    }

    let terminal = reached_goal_at.or_else(|| {
        if params.best_effort {
            Some(closest_node(&nodes, goal))
        } else {
            None
        }
    })?;

    let raw_points = reconstruct(&nodes, terminal);
    let tightened = shortcut(&raw_points, world);
    Some(Path::new(tightened, start, goal))
}

fn nearest_node(nodes: &[TreeNode], target: Position) -> usize {
    nodes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.pos
                .distance_to(&target)
                .partial_cmp(&b.pos.distance_to(&target))
                .unwrap()
        })
        .map(|(idx, _)| idx)
        .expect("tree always has at least the start node")
}

fn closest_node(nodes: &[TreeNode], target: Position) -> usize {
    nearest_node(nodes, target)
}

fn steer_target(from: Position, towards: Position, step: f32) -> Position {
    let dist = from.distance_to(&towards);
    if dist <= step {
        return towards;
    }
    let t = step / dist;
    Position::new(from.x + (towards.x - from.x) * t, from.y + (towards.y - from.y) * t)
}

fn reconstruct(nodes: &[TreeNode], terminal: usize) -> Vec<Position> {
    let mut points = Vec::new();
    let mut cur = Some(terminal);
    while let Some(idx) = cur {
        points.push(nodes[idx].pos);
        cur = nodes[idx].parent;
    }
    points.reverse();
    points
}

/// Greedy forward-shortcutting: from each kept point, jump to the furthest
/// point still directly reachable instead of walking every tree edge.
/// Functionally the same tightened route the "walk backward from the goal"
/// framing describes, built forward for simplicity.
fn shortcut<W: RrtWorld>(points: &[Position], world: &W) -> Vec<Position> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut tightened = vec![points[0]];
    let mut i = 0;
    while i < points.len() - 1 {
        let mut furthest = i + 1;
        for j in (i + 2..points.len()).rev() {
            if world.path_is_clear(points[i], points[j]).0 {
                furthest = j;
                break;
            }
        }
        tightened.push(points[furthest]);
        i = furthest;
    }
    tightened
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// An obstacle-free world — every segment is clear, so RRT degenerates
    /// to "reach the goal in one hop whenever a sample lands near it".
    struct EmptyWorld {
        min: Position,
        max: Position,
    }

    impl RrtWorld for EmptyWorld {
        fn bounds(&self) -> (Position, Position) {
            (self.min, self.max)
        }
        fn path_is_clear(&self, _from: Position, to: Position) -> (bool, Option<Position>) {
            (true, Some(to))
        }
    }

    /// A world with a single vertical blocking wall at x == 50 that stops
    /// any segment crossing it, reporting the crossing point as the
    /// furthest reachable point.
    struct WalledWorld {
        min: Position,
        max: Position,
    }

    impl RrtWorld for WalledWorld {
        fn bounds(&self) -> (Position, Position) {
            (self.min, self.max)
        }
        fn path_is_clear(&self, from: Position, to: Position) -> (bool, Option<Position>) {
            let crosses = (from.x < 50.0 && to.x >= 50.0) || (from.x >= 50.0 && to.x < 50.0);
            if !crosses {
                return (true, Some(to));
            }
            let t = (50.0 - from.x) / (to.x - from.x);
            let hit = Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
            (false, Some(hit))
        }
    }

    #[test]
    fn test_plan_reaches_goal_in_open_world() {
        let world = EmptyWorld {
            min: Position::new(0.0, 0.0),
            max: Position::new(100.0, 100.0),
        };
        let params = RrtParams {
            timeout: Duration::from_millis(200),
            ..RrtParams::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let path = plan(&world, Position::new(0.0, 0.0), Position::new(90.0, 90.0), &params, &mut rng)
            .expect("should find a path in an open world");
        assert_eq!(path.first(), Position::new(0.0, 0.0));
        assert_eq!(path.last(), Position::new(90.0, 90.0));
    }

    #[test]
    fn test_best_effort_returns_partial_path_when_goal_unreachable() {
        // The goal sits behind the wall's far side is reachable, so pick a
        // timeout short enough that the tree plausibly doesn't reach it,
        // but best_effort guarantees *some* path back.
        let world = WalledWorld {
            min: Position::new(0.0, 0.0),
            max: Position::new(40.0, 100.0),
        };
        let params = RrtParams {
            timeout: Duration::from_millis(50),
            best_effort: true,
            ..RrtParams::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        // Goal is outside the sampling bounds entirely (x=200), so the tree
        // can never reach it — best_effort must still produce a path.
        let path = plan(&world, Position::new(0.0, 0.0), Position::new(200.0, 0.0), &params, &mut rng);
        assert!(path.is_some());
    }

    #[test]
    fn test_non_best_effort_returns_none_when_unreachable() {
        let world = WalledWorld {
            min: Position::new(0.0, 0.0),
            max: Position::new(40.0, 100.0),
        };
        let params = RrtParams {
            timeout: Duration::from_millis(20),
            best_effort: false,
            goal_bias: 0.0,
            ..RrtParams::default()
        };
        let mut rng = StdRng::seed_from_u64(11);
        let path = plan(&world, Position::new(0.0, 0.0), Position::new(200.0, 0.0), &params, &mut rng);
        assert!(path.is_none());
    }

    #[test]
    fn test_shortcut_collapses_open_field_to_two_points() {
        let world = EmptyWorld {
            min: Position::new(0.0, 0.0),
            max: Position::new(10.0, 10.0),
        };
        let points = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 1.0),
            Position::new(2.0, 2.0),
            Position::new(3.0, 3.0),
        ];
        let tightened = shortcut(&points, &world);
        assert_eq!(tightened, vec![Position::new(0.0, 0.0), Position::new(3.0, 3.0)]);
    }

    #[test]
    fn test_steer_target_clamps_to_step_length() {
        let from = Position::new(0.0, 0.0);
        let far = Position::new(100.0, 0.0);
        let target = steer_target(from, far, 2.5);
        assert!((target.x - 2.5).abs() < 1e-4);
    }
}
