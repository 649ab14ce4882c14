//! The grid traversal medium: 8-connected integer cells over a rasterized
//! obstacle field, searched at a configurable `ratio` (cells are `ratio x
//! ratio` raster pixels). This is the `SearchMedium` grid-Dijkstra/grid-A*
//! planners are built from.

use geometry::Position;

use crate::engine::{Heuristic, SearchMedium};

/// A grid cell coordinate.
pub type Cell = (i32, i32);

/// Tells the grid medium which cells are occupied, independent of how the
/// underlying raster is stored.
pub trait CellOpenness {
    fn is_open(&self, cell: Cell) -> bool;
    fn width_cells(&self) -> i32;
    fn height_cells(&self) -> i32;

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.0 >= 0 && cell.0 < self.width_cells() && cell.1 >= 0 && cell.1 < self.height_cells()
    }
}

/// Tells the grid medium whether a straight line between two world points
/// is traversable — this is `DiscretizedMap::path_is_clear` in the core
/// crate, rescaled to world units by the caller.
pub trait LineOfSight {
    fn path_is_clear(&self, from: Position, to: Position) -> bool;
}

const KING_MOVES: [Cell; 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// The grid `SearchMedium`: wraps an occupancy grid and a line-of-sight
/// oracle. `ratio` is the world-units-per-cell scale (`D` in the spec).
/// `C`/`L` are owned rather than borrowed so a medium can be freely moved
/// into a planner struct and reused across queries — cheap for the core
/// crate's `DiscretizedMap`, which is just an `Arc` clone plus a ratio.
pub struct GridMedium<C, L> {
    pub ratio: f32,
    pub heuristic: Heuristic,
    pub cells: C,
    pub line_of_sight: L,
}

impl<C, L> GridMedium<C, L> {
    pub fn new(ratio: f32, heuristic: Heuristic, cells: C, line_of_sight: L) -> Self {
        GridMedium {
            ratio,
            heuristic,
            cells,
            line_of_sight,
        }
    }

    pub fn world_to_cell(&self, p: Position) -> Cell {
        ((p.x / self.ratio).floor() as i32, (p.y / self.ratio).floor() as i32)
    }

    pub fn cell_center(&self, cell: Cell) -> Position {
        Position::new(
            (cell.0 as f32 + 0.5) * self.ratio,
            (cell.1 as f32 + 0.5) * self.ratio,
        )
    }
}

impl<C: CellOpenness, L: LineOfSight> SearchMedium for GridMedium<C, L> {
    type Node = Cell;

    fn path_is_clear(&self, start: Position, goal: Position) -> bool {
        self.line_of_sight.path_is_clear(start, goal)
    }

    fn position_of(&self, node: Cell) -> Position {
        self.cell_center(node)
    }

    fn all_nodes(&self) -> Vec<Cell> {
        let mut nodes = Vec::with_capacity(
            (self.cells.width_cells() as usize) * (self.cells.height_cells() as usize),
        );
        for y in 0..self.cells.height_cells() {
            for x in 0..self.cells.width_cells() {
                nodes.push((x, y));
            }
        }
        nodes
    }

    fn prepare(&mut self, start: Position, goal: Position) -> (Cell, Cell) {
        (self.world_to_cell(start), self.world_to_cell(goal))
    }

    fn neighbors(&self, node: Cell) -> Vec<Cell> {
        KING_MOVES
            .iter()
            .map(|(dx, dy)| (node.0 + dx, node.1 + dy))
            .filter(|&c| self.cells.in_bounds(c) && self.cells.is_open(c))
            .collect()
    }

    fn edge_cost(&self, u: Cell, v: Cell) -> f32 {
        self.cell_center(u).distance_to(&self.cell_center(v))
    }

    fn heuristic(&self, node: Cell, goal: Cell) -> f32 {
        self.heuristic.evaluate(self.cell_center(node), self.cell_center(goal))
    }

    fn close(&mut self, _start: Cell, _goal: Cell) {}
}
