//! # survival-arena
//!
//! A 2D top-down survival arena: a player fends off waves of zombies that
//! navigate toward them over a static obstacle map using one of several
//! pathfinding strategies (grid search, visibility-graph search, or a
//! best-effort RRT).
//!
//! The simulation runs on two independent worker threads ([`simulation`])
//! serialized through a single re-entrant lock ([`session`]) while a wgpu
//! renderer ([`renderer`]) and winit event loop ([`app`]) present the
//! current state and forward keyboard input.

pub mod actors;
pub mod app;
pub mod config;
pub mod discretized;
pub mod error;
pub mod input;
pub mod map;
pub mod planners;
pub mod registry;
pub mod renderer;
pub mod session;
pub mod simulation;
pub mod visibility;

pub use geometry::{Position, Velocity};
pub use pathfinding::{salvage_path, Path, SearchMedium};
