//! `Path` — a finite, ordered polyline produced by the search engine, plus
//! the "salvage" shortcut that lets a planner reuse an old path cheaply
//! when the start/goal have barely moved.

use geometry::{Position, Velocity};

/// A planned route, modeled as an immutable point sequence plus a cursor
/// (`next_index`) over it — this is the "coroutine-like path consumption"
/// lowering called for in the design notes: consuming the path advances an
/// index rather than mutating a shared linked list.
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<Position>,
    original_start: Position,
    original_goal: Position,
    next_index: usize,
}

impl Path {
    /// Builds a new path. `points` must be non-empty; `original_start` and
    /// `original_goal` are recorded write-once and never change, even
    /// across a salvage (see [`salvage_path`]).
    pub fn new(points: Vec<Position>, original_start: Position, original_goal: Position) -> Path {
        assert!(!points.is_empty(), "a Path must have at least one point");
        let next_index = 1.min(points_len_minus_one(&points));
        Path {
            points,
            original_start,
            original_goal,
            next_index,
        }
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Position {
        self.points[0]
    }

    pub fn last(&self) -> Position {
        *self.points.last().expect("Path is never empty")
    }

    pub fn original_start(&self) -> Position {
        self.original_start
    }

    pub fn original_goal(&self) -> Position {
        self.original_goal
    }

    /// The next waypoint the traveler hasn't reached yet, or `None` once
    /// every waypoint has been consumed.
    pub fn current_target(&self) -> Option<Position> {
        self.points.get(self.next_index).copied()
    }

    /// Whether `current` is within `epsilon` of the next unconsumed
    /// waypoint. A fully-consumed path reports `true` (there is nowhere
    /// left to be that isn't "here").
    pub fn at_next_position(&self, current: Position, epsilon: f32) -> bool {
        match self.current_target() {
            Some(target) => current.is_near(&target, epsilon),
            None => true,
        }
    }

    /// Advances the cursor past the next waypoint. Returns `false` if the
    /// path was already fully consumed.
    pub fn consume_next(&mut self) -> bool {
        if self.next_index < self.points.len() {
            self.next_index += 1;
            true
        } else {
            false
        }
    }

    /// A velocity aimed at the next unconsumed waypoint at the given
    /// speed, or the zero velocity once the path is exhausted.
    pub fn next_movement(&self, current: Position, speed: f32) -> Velocity {
        match self.current_target() {
            Some(target) => Velocity::towards(&current, &target, speed),
            None => Velocity::ZERO,
        }
    }

    fn replace_last(&mut self, new_goal: Position) {
        if let Some(last) = self.points.last_mut() {
            *last = new_goal;
        }
    }
}

fn points_len_minus_one(points: &[Position]) -> usize {
    points.len().saturating_sub(1)
}

/// Attempts to reuse `path` for a new `(new_start, new_goal)` pair instead
/// of recomputing it from scratch.
///
/// Succeeds (mutating `path` in place and returning `true`) iff `path` has
/// at least `min_points` points and both endpoints have moved less than
/// `threshold` from the path's original endpoints. On success only the
/// last point is rewritten — the start and every interior point are left
/// untouched, and `original_goal` (write-once) is *not* updated, so
/// `path.last() == new_goal` while `path.original_goal()` still reports the
/// goal the path was originally computed for.
///
/// On failure, `path` is left unmodified and the caller should fall back to
/// a full regeneration; this refusal is silent by design (see the error
/// handling notes on "Salvage refusal").
pub fn salvage_path(
    path: &mut Path,
    new_start: Position,
    new_goal: Position,
    threshold: f32,
    min_points: usize,
) -> bool {
    if path.len() < min_points {
        return false;
    }
    if path.original_start.distance_to(&new_start) >= threshold {
        return false;
    }
    if path.original_goal.distance_to(&new_goal) >= threshold {
        return false;
    }
    path.replace_last(new_goal);
    true
}
