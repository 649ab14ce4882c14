//! Adapts [`MapData`] to the `pathfinding` crate's two traversal media:
//! [`pathfinding::grid`]'s `CellOpenness`/`LineOfSight` for the grid
//! planners, and [`pathfinding::graph`]'s `VisibilityOracle` for the
//! visibility-graph planners. Both boil down to the same raycast over the
//! inflated raster, just parameterized differently.

use std::sync::Arc;

use geometry::Position;
use pathfinding::grid::{Cell, CellOpenness, LineOfSight};
use pathfinding::graph::VisibilityOracle;

use crate::map::MapData;

/// A map viewed at discretization ratio `D`: grid cells are `D x D` world
/// units, and raycasts step at `0.5 * D`.
///
/// Holds an `Arc<MapData>` rather than a borrow so a `DiscretizedMap` is
/// cheap to clone and can be moved by value into a `pathfinding` medium
/// (`GridMedium`, `Graph`) that a planner keeps alive across many queries,
/// instead of borrowing from it and fighting a self-referential lifetime.
#[derive(Clone)]
pub struct DiscretizedMap {
    map: Arc<MapData>,
    ratio: f32,
}

impl DiscretizedMap {
    pub fn new(map: Arc<MapData>, ratio: f32) -> Self {
        DiscretizedMap { map, ratio }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn world_to_cell(&self, p: Position) -> Cell {
        ((p.x / self.ratio).floor() as i32, (p.y / self.ratio).floor() as i32)
    }

    /// Walks the straight segment `from -> to` in `step` world-unit
    /// increments, ignoring any sampled point within `exclusion_radius` of
    /// either endpoint (a node sits *on* an obstacle vertex and would
    /// otherwise always obstruct its own sightlines). Returns whether every
    /// non-excluded sample was valid, and the furthest point reached along
    /// the segment regardless of outcome.
    pub fn path_is_clear_with_params(
        &self,
        from: Position,
        to: Position,
        exclusion_radius: f32,
        step: f32,
    ) -> (bool, Option<Position>) {
        let dist = from.distance_to(&to);
        if dist < 1e-6 {
            return (self.map.position_is_valid(from), Some(from));
        }

        let steps = (dist / step).ceil().max(1.0) as usize;
        let mut furthest = None;
        for i in 0..=steps {
            let t = (i as f32 / steps as f32).min(1.0);
            let p = Position::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
            );
            if p.distance_to(&from) < exclusion_radius || p.distance_to(&to) < exclusion_radius {
                furthest = Some(p);
                continue;
            }
            if !self.map.position_is_valid(p) {
                return (false, furthest);
            }
            furthest = Some(p);
        }
        (true, furthest)
    }

    /// `path_is_clear_with_params` with no exclusion and the default
    /// `0.5 * ratio` step.
    pub fn path_is_clear_default(&self, from: Position, to: Position) -> (bool, Option<Position>) {
        self.path_is_clear_with_params(from, to, 0.0, 0.5 * self.ratio)
    }
}

impl CellOpenness for DiscretizedMap {
    /// Occupied iff *any* inner inflated-raster pixel within the cell is an
    /// obstacle (§3), not just its center — a cell can have a free center
    /// and an obstructed corner at `D > 1`.
    fn is_open(&self, cell: Cell) -> bool {
        let x0 = (cell.0 as f32 * self.ratio).floor() as i64;
        let y0 = (cell.1 as f32 * self.ratio).floor() as i64;
        let x1 = ((cell.0 as f32 + 1.0) * self.ratio).ceil() as i64;
        let y1 = ((cell.1 as f32 + 1.0) * self.ratio).ceil() as i64;

        for py in y0..y1 {
            for px in x0..x1 {
                if !self.map.position_is_valid(Position::new(px as f32 + 0.5, py as f32 + 0.5)) {
                    return false;
                }
            }
        }
        true
    }

    fn width_cells(&self) -> i32 {
        (self.map.width() as f32 / self.ratio).ceil() as i32
    }

    fn height_cells(&self) -> i32 {
        (self.map.height() as f32 / self.ratio).ceil() as i32
    }
}

impl LineOfSight for DiscretizedMap {
    fn path_is_clear(&self, from: Position, to: Position) -> bool {
        self.path_is_clear_default(from, to).0
    }
}

impl VisibilityOracle for DiscretizedMap {
    fn is_visible(&self, a: Position, b: Position, exclusion_radius: f32) -> bool {
        self.path_is_clear_with_params(a, b, exclusion_radius, 0.5 * self.ratio).0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn map_with_vertical_wall(width: u32, height: u32, wall_x: u32) -> MapData {
        let mut raster = vec![false; (width * height) as usize];
        for y in 0..height {
            raster[(y * width + wall_x) as usize] = true;
        }
        MapData::from_raster(
            width,
            height,
            raster,
            Position::new(0.0, 0.0),
            vec![Position::new(1.0, 1.0)],
            vec![],
        )
    }

    #[test]
    fn test_world_to_cell() {
        let map = map_with_vertical_wall(60, 40, 58);
        let disc = DiscretizedMap::new(Arc::new(map), 3.0);
        assert_eq!(disc.world_to_cell(Position::new(7.5, 7.5)), (2, 2));
    }

    #[test]
    fn test_path_is_clear_blocked_by_wall() {
        let map = map_with_vertical_wall(60, 40, 30);
        let disc = DiscretizedMap::new(Arc::new(map), 1.0);
        let (clear, furthest) = disc.path_is_clear_default(Position::new(10.0, 20.0), Position::new(50.0, 20.0));
        assert!(!clear);
        assert!(furthest.unwrap().x < 30.0);
    }

    #[test]
    fn test_path_is_clear_open_field() {
        let map = map_with_vertical_wall(60, 40, 58);
        let disc = DiscretizedMap::new(Arc::new(map), 1.0);
        let (clear, _) = disc.path_is_clear_default(Position::new(0.0, 0.0), Position::new(10.0, 10.0));
        assert!(clear);
    }

    #[test]
    fn test_exclusion_radius_ignores_samples_near_endpoints() {
        // A wall pixel sits right next to the start point; without an
        // exclusion radius the first sample would report blocked.
        let map = map_with_vertical_wall(60, 40, 1);
        let disc = DiscretizedMap::new(Arc::new(map), 1.0);
        let start = Position::new(1.0, 20.0);
        let goal = Position::new(40.0, 20.0);
        let (clear, _) = disc.path_is_clear_with_params(start, goal, 3.0, 0.5);
        assert!(clear);
    }

    #[test]
    fn test_cell_openness_matches_underlying_raster() {
        let map = map_with_vertical_wall(60, 40, 30);
        let disc = DiscretizedMap::new(Arc::new(map), 1.0);
        assert!(!disc.is_open((30, 20)));
        assert!(disc.is_open((0, 0)));
    }

    #[test]
    fn test_width_cells_rounds_up_for_non_integer_ratio() {
        let map = map_with_vertical_wall(10, 10, 9);
        let disc = DiscretizedMap::new(Arc::new(map), 3.0);
        assert_eq!(disc.width_cells(), 4);
    }
}
