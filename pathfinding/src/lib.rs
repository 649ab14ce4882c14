//! Representation-agnostic shortest-path search.
//!
//! The search procedure itself (`engine::search`) knows nothing about grids
//! or visibility graphs — it only knows about a [`engine::SearchMedium`].
//! Two concrete media are provided: [`grid::GridMedium`] for 8-connected
//! raster cells and [`graph::Graph`] for a visibility graph with transient
//! start/goal insertion. [`rrt`] implements a best-effort RRT planner,
//! which (per the design) does not go through `SearchMedium` at all.

pub mod engine;
pub mod graph;
pub mod grid;
pub mod path;
pub mod rrt;

pub use engine::{search, SearchMedium};
pub use path::{salvage_path, Path};
