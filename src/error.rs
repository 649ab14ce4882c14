//! Fatal configuration errors raised while constructing a [`crate::session::Session`].
//!
//! Everything else in the simulation that can fail (planning, salvage,
//! registry lookups) is tolerated locally and represented as `Option`/`bool`
//! rather than a `Result` — see the error handling notes in the design docs.
//! This is the one place a hand-rolled error type earns its keep, since
//! `anyhow::Error` is for propagating arbitrary failures up to `main`, and a
//! map failing to load is a specific, recoverable-by-the-caller condition a
//! map editor or test harness wants to match on.

use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    /// `map.png` was not exactly `width x height` pixels.
    WrongMapDimensions { expected: (u32, u32), found: (u32, u32) },
    /// `data.txt` declared a zombie-spawn section but it ended up empty.
    EmptyZombieSpawns,
    /// `data.txt` was missing a required `playerSpawn:` line.
    MissingPlayerSpawn,
    /// A line in `data.txt` could not be parsed as `X,Y`.
    MalformedSpawnLine { line: String },
    /// The map directory did not contain the files the loader expects.
    Io(std::io::Error),
    /// `map.png` could not be decoded as an image.
    ImageDecode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WrongMapDimensions { expected, found } => write!(
                f,
                "map.png must be {}x{} pixels, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            ConfigError::EmptyZombieSpawns => {
                write!(f, "data.txt declared zombieSpawns but listed none")
            }
            ConfigError::MissingPlayerSpawn => {
                write!(f, "data.txt is missing a playerSpawn: line")
            }
            ConfigError::MalformedSpawnLine { line } => {
                write!(f, "could not parse spawn point from line: {line:?}")
            }
            ConfigError::Io(e) => write!(f, "failed to read map directory: {e}"),
            ConfigError::ImageDecode(msg) => write!(f, "failed to decode map.png: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
