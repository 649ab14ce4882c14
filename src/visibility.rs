//! Visibility-graph construction: detect obstacle-corner vertices in a
//! discretized map, deduplicate clustered vertices, then wire them into a
//! [`pathfinding::graph::Graph`] by raycasting every pair.
//!
//! The vertex-detection pattern table has no direct precedent anywhere in
//! the reference corpus; it is built in the spirit of the raster/cell
//! traversal code elsewhere in this crate rather than adapted from an
//! existing implementation.

use std::collections::HashSet;

use geometry::Position;
use pathfinding::engine::Heuristic;
use pathfinding::grid::{Cell, CellOpenness};
use pathfinding::graph::Graph;

use crate::discretized::DiscretizedMap;

/// 3x3 ring offsets in the fixed enumeration order the vertex classifier's
/// index arithmetic assumes: `{NW, N, NE, W, E, SW, S, SE}`. Opposite pairs
/// are exactly the indices that sum to 7.
const OFFSETS: [Cell; 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

fn is_occupied(grid: &DiscretizedMap, cell: Cell) -> bool {
    if cell.0 < 0 || cell.1 < 0 || cell.0 >= grid.width_cells() || cell.1 >= grid.height_cells() {
        return true;
    }
    !grid.is_open(cell)
}

/// Indices (in ascending order) of the occupied cells among `cell`'s 8
/// neighbors.
fn occupied_neighbor_indices(grid: &DiscretizedMap, cell: Cell) -> Vec<usize> {
    OFFSETS
        .iter()
        .enumerate()
        .filter(|(_, &(dx, dy))| is_occupied(grid, (cell.0 + dx, cell.1 + dy)))
        .map(|(i, _)| i)
        .collect()
}

/// Whether an occupied cell with this neighbor pattern is a vertex, for
/// occupied-neighbor counts of 0 through 4. Counts of 5 are handled
/// separately by [`resolve_diagonal_run`]; anything else is never a vertex.
fn is_simple_vertex(occupied_count: usize, sorted_indices: &[usize]) -> bool {
    match occupied_count {
        0 | 1 => true,
        2 => sorted_indices[0] + sorted_indices[1] != 7,
        3 => {
            let d1 = sorted_indices[1] - sorted_indices[0];
            let d2 = sorted_indices[2] - sorted_indices[1];
            (d1 == 1 && d2 == 2) || (d1 == 2 && d2 == 1)
        }
        4 => {
            let d1 = sorted_indices[1] - sorted_indices[0];
            let d2 = sorted_indices[2] - sorted_indices[1];
            let d3 = sorted_indices[3] - sorted_indices[2];
            matches!(
                (d1, d2, d3),
                (1, 1, 1) | (1, 1, 2) | (1, 2, 2) | (2, 1, 1) | (2, 2, 1) | (1, 2, 3) | (3, 2, 1)
            )
        }
        _ => false,
    }
}

/// Maps the three unoccupied neighbor indices of a 5-occupied cell to the
/// diagonal direction that run lies along, if any.
fn diagonal_direction(sorted_unoccupied: &[usize]) -> Option<Cell> {
    match sorted_unoccupied {
        [0, 1, 3] | [4, 6, 7] => Some((-1, 1)),
        [1, 2, 4] | [3, 5, 6] => Some((1, 1)),
        _ => None,
    }
}

/// Whether `cell` is itself an occupied, 5-occupied-neighbor cell, and if
/// so, which diagonal direction its run runs along.
fn diagonal_run_member(grid: &DiscretizedMap, cell: Cell) -> Option<Cell> {
    if cell.0 < 0 || cell.1 < 0 || cell.0 >= grid.width_cells() || cell.1 >= grid.height_cells() {
        return None;
    }
    if grid.is_open(cell) {
        return None;
    }
    let occupied = occupied_neighbor_indices(grid, cell);
    if occupied.len() != 5 {
        return None;
    }
    let unoccupied: Vec<usize> = (0..8).filter(|i| !occupied.contains(i)).collect();
    diagonal_direction(&unoccupied)
}

/// Walks a diagonal run of 5-occupied-neighbor cells containing `cell` in
/// both directions and returns a single vertex at the run's midpoint, or
/// `None` if this cell doesn't head a diagonal run, or a vertex from this
/// same run was already recorded by an earlier cell's walk.
fn resolve_diagonal_run(
    grid: &DiscretizedMap,
    cell: Cell,
    occupied: &[usize],
    vertex_cells: &HashSet<Cell>,
) -> Option<Cell> {
    let unoccupied: Vec<usize> = (0..8).filter(|i| !occupied.contains(i)).collect();
    let direction = diagonal_direction(&unoccupied)?;

    let mut back = cell;
    loop {
        let prev = (back.0 - direction.0, back.1 - direction.1);
        match diagonal_run_member(grid, prev) {
            Some(d) if d == direction => {
                if vertex_cells.contains(&prev) {
                    return None;
                }
                back = prev;
            }
            _ => break,
        }
    }

    let mut forward = cell;
    loop {
        let next = (forward.0 + direction.0, forward.1 + direction.1);
        match diagonal_run_member(grid, next) {
            Some(d) if d == direction => {
                if vertex_cells.contains(&next) {
                    return None;
                }
                forward = next;
            }
            _ => break,
        }
    }

    Some(((back.0 + forward.0) / 2, (back.1 + forward.1) / 2))
}

/// Scans the discretized map row-major and returns the detected vertex
/// positions, in world units.
pub fn detect_vertices(grid: &DiscretizedMap) -> Vec<Position> {
    let mut vertex_cells: HashSet<Cell> = HashSet::new();

    for y in 0..grid.height_cells() {
        for x in 0..grid.width_cells() {
            let cell = (x, y);
            if grid.is_open(cell) {
                continue;
            }
            let occupied = occupied_neighbor_indices(grid, cell);
            match occupied.len() {
                5 => {
                    if let Some(vertex_cell) = resolve_diagonal_run(grid, cell, &occupied, &vertex_cells) {
                        vertex_cells.insert(vertex_cell);
                    }
                }
                n if is_simple_vertex(n, &occupied) => {
                    vertex_cells.insert(cell);
                }
                _ => {}
            }
        }
    }

    vertex_cells
        .into_iter()
        .map(|c| {
            Position::new(
                (c.0 as f32 + 0.5) * grid.ratio(),
                (c.1 as f32 + 0.5) * grid.ratio(),
            )
        })
        .collect()
}

/// Iteratively collapses clusters of vertices within `threshold` of each
/// other down to the one with the most neighbors, until no vertex has any
/// neighbor left within range.
pub fn deduplicate_vertices(vertices: Vec<Position>, threshold: f32) -> Vec<Position> {
    let mut remaining = vertices;
    loop {
        let mut best_idx = None;
        let mut best_neighbors: Vec<usize> = Vec::new();

        for i in 0..remaining.len() {
            let neighbors: Vec<usize> = (0..remaining.len())
                .filter(|&j| j != i && remaining[i].distance_to(&remaining[j]) < threshold)
                .collect();
            if neighbors.len() > best_neighbors.len() {
                best_idx = Some(i);
                best_neighbors = neighbors;
            }
        }

        let Some(keep) = best_idx else { break };
        if best_neighbors.is_empty() {
            break;
        }

        let to_remove: HashSet<usize> = best_neighbors.into_iter().filter(|&j| j != keep).collect();
        remaining = remaining
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !to_remove.contains(i))
            .map(|(_, p)| p)
            .collect();
    }
    remaining
}

/// Detects and deduplicates a discretized map's vertex set in one call.
pub fn detect_and_deduplicate_vertices(grid: &DiscretizedMap, cleanliness_threshold: f32) -> Vec<Position> {
    deduplicate_vertices(detect_vertices(grid), cleanliness_threshold)
}

/// Wires a deduplicated vertex set into a permanent visibility graph, using
/// `0.75 * ratio` as the self-occlusion exclusion radius for raycasts.
pub fn build_visibility_graph(
    discretized: &DiscretizedMap,
    vertices: &[Position],
    heuristic: Heuristic,
) -> Graph<DiscretizedMap> {
    let exclusion_radius = 0.75 * discretized.ratio();
    let mut graph = Graph::new(heuristic, discretized.clone(), exclusion_radius);
    for &v in vertices {
        graph.insert_node_connected(v);
    }
    graph.finalize_construction();
    graph
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::map::MapData;

    fn map_from_ascii(rows: &[&str]) -> MapData {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let mut raster = vec![false; (width * height) as usize];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    raster[y * width as usize + x] = true;
                }
            }
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
    fn test_isolated_single_cell_obstacle_is_a_vertex() {
        let map = map_from_ascii(&[
            ".....",
            "..#..",
            ".....",
        ]);
        let disc = DiscretizedMap::new(std::sync::Arc::new(map), 1.0);
        let vertices = detect_vertices(&disc);
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0], Position::new(2.5, 1.5));
    }

    #[test]
    fn test_straight_wall_segment_has_no_interior_vertices() {
        // A long horizontal wall: interior cells have exactly 2 occupied
        // neighbors summing to 7 (straight-through), so they're skipped.
        let map = map_from_ascii(&[
            ".........",
            "#########",
            ".........",
        ]);
        let disc = DiscretizedMap::new(std::sync::Arc::new(map), 1.0);
        let vertices = detect_vertices(&disc);
        // Only the two end cells of the wall should register as vertices.
        assert_eq!(vertices.len(), 2);
    }

    #[test]
    fn test_right_angle_corner_is_a_vertex() {
        let map = map_from_ascii(&[
            "###..",
            "#....",
            "#....",
            ".....",
        ]);
        let disc = DiscretizedMap::new(std::sync::Arc::new(map), 1.0);
        let vertices = detect_vertices(&disc);
        // The inner corner cell (0,0) has neighbors at indices {2,4,7}
        // (E, SE handled via occupied set) forming the corner; at minimum
        // the corner cell itself is detected.
        assert!(vertices.contains(&Position::new(0.5, 0.5)));
    }

    #[test]
    fn test_deduplicate_vertices_collapses_tight_cluster() {
        let vertices = vec![
            Position::new(0.0, 0.0),
            Position::new(0.5, 0.0),
            Position::new(0.0, 0.5),
            Position::new(100.0, 100.0),
        ];
        let deduped = deduplicate_vertices(vertices, 1.0);
        // The far-away point always survives; the tight cluster collapses
        // to a single representative.
        assert!(deduped.contains(&Position::new(100.0, 100.0)));
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn test_deduplicate_vertices_leaves_well_spaced_points_alone() {
        let vertices = vec![
            Position::new(0.0, 0.0),
            Position::new(50.0, 0.0),
            Position::new(100.0, 0.0),
        ];
        let deduped = deduplicate_vertices(vertices, 5.0);
        assert_eq!(deduped.len(), 3);
    }

    #[test]
    fn test_build_visibility_graph_connects_mutually_visible_vertices() {
        let map = map_from_ascii(&[
            "...........",
            ".#.........",
            "...........",
            ".........#.",
            "...........",
        ]);
        let disc = DiscretizedMap::new(std::sync::Arc::new(map), 1.0);
        let vertices = detect_and_deduplicate_vertices(&disc, 0.5);
        let graph = build_visibility_graph(&disc, &vertices, Heuristic::Euclidean);
        assert!(graph.is_symmetric());
        assert_eq!(graph.permanent_node_count(), vertices.len());
    }
}
