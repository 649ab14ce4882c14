//! The obstacle map: a raster decoded from `map.png`, its actor-radius
//! dilation, and the spawn-point table parsed from `data.txt`.
//!
//! Decoding the PNG and reading the directory are the only places this
//! module touches the filesystem; everything else operates on plain pixel
//! buffers so it can be unit tested without fixture files.

use std::path::Path;

use geometry::Position;

use crate::config::{ACTOR_RADIUS, MAP_HEIGHT, MAP_WIDTH};
use crate::error::ConfigError;

/// The obstacle raster plus the spawn tables read from a map directory.
/// Immutable once built: every traversability query goes through
/// [`MapData::inflated`], never [`MapData::displayed`].
pub struct MapData {
    width: u32,
    height: u32,
    displayed: Vec<bool>,
    inflated: Vec<bool>,
    player_spawn: Position,
    zombie_spawns: Vec<Position>,
    robot_stations: Vec<Position>,
}

impl MapData {
    /// Loads `map.png` and `data.txt` from `map_dir`. Fatal on any
    /// configuration fault — wrong dimensions, missing spawn data, or a
    /// malformed spawn line.
    pub fn load(map_dir: &Path) -> Result<MapData, ConfigError> {
        let png_path = map_dir.join("map.png");
        let image = image::open(&png_path)
            .map_err(|e| ConfigError::ImageDecode(e.to_string()))?
            .into_rgb8();

        if image.width() != MAP_WIDTH || image.height() != MAP_HEIGHT {
            return Err(ConfigError::WrongMapDimensions {
                expected: (MAP_WIDTH, MAP_HEIGHT),
                found: (image.width(), image.height()),
            });
        }

        let displayed = rasterize_obstacles(&image);

        let data_txt = std::fs::read_to_string(map_dir.join("data.txt"))?;
        let (player_spawn, zombie_spawns, robot_stations) = parse_data_txt(&data_txt)?;

        Ok(MapData::from_raster(
            MAP_WIDTH,
            MAP_HEIGHT,
            displayed,
            player_spawn,
            zombie_spawns,
            robot_stations,
        ))
    }

    /// Builds a `MapData` from an already-rasterized obstacle buffer,
    /// computing the inflated companion raster. `displayed` must have
    /// exactly `width * height` entries in row-major order.
    pub fn from_raster(
        width: u32,
        height: u32,
        displayed: Vec<bool>,
        player_spawn: Position,
        zombie_spawns: Vec<Position>,
        robot_stations: Vec<Position>,
    ) -> MapData {
        assert_eq!(displayed.len(), (width * height) as usize);
        let inflated = inflate_obstacles(&displayed, width, height, ACTOR_RADIUS);
        MapData {
            width,
            height,
            displayed,
            inflated,
            player_spawn,
            zombie_spawns,
            robot_stations,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_obstacle_displayed(&self, x: u32, y: u32) -> bool {
        self.displayed[(y * self.width + x) as usize]
    }

    pub fn is_obstacle_inflated(&self, x: u32, y: u32) -> bool {
        self.inflated[(y * self.width + x) as usize]
    }

    /// Whether `p` is in-bounds and free in the inflated raster. All
    /// traversability checks in the simulation ultimately bottom out here.
    pub fn position_is_valid(&self, p: Position) -> bool {
        if p.x < 0.0 || p.y < 0.0 {
            return false;
        }
        let (x, y) = (p.x.floor() as u32, p.y.floor() as u32);
        x < self.width && y < self.height && !self.is_obstacle_inflated(x, y)
    }

    pub fn player_spawn(&self) -> Position {
        self.player_spawn
    }

    pub fn zombie_spawns(&self) -> &[Position] {
        &self.zombie_spawns
    }

    pub fn robot_stations(&self) -> &[Position] {
        &self.robot_stations
    }
}

fn rasterize_obstacles(image: &image::RgbImage) -> Vec<bool> {
    image
        .pixels()
        .map(|p| p.0 != [255, 255, 255])
        .collect()
}

/// Dilates every obstacle pixel into a filled disk of `radius`, producing
/// the raster every traversability query uses.
fn inflate_obstacles(displayed: &[bool], width: u32, height: u32, radius: f32) -> Vec<bool> {
    let mut inflated = displayed.to_vec();
    let r = radius.ceil() as i32;
    let r_sq = radius * radius;

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            if !displayed[(y as u32 * width + x as u32) as usize] {
                continue;
            }
            for dy in -r..=r {
                for dx in -r..=r {
                    if (dx * dx + dy * dy) as f32 > r_sq {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < width as i32 && ny < height as i32 {
                        inflated[(ny as u32 * width + nx as u32) as usize] = true;
                    }
                }
            }
        }
    }
    inflated
}

enum Section {
    None,
    Zombie,
    Robot,
}

/// Parses the line-oriented `data.txt` format: a `playerSpawn:` line, then
/// `zombieSpawns`/`robotStations` section headers each followed by
/// tab-indented `X,Y` entries.
fn parse_data_txt(contents: &str) -> Result<(Position, Vec<Position>, Vec<Position>), ConfigError> {
    let mut player_spawn = None;
    let mut zombie_spawns = Vec::new();
    let mut robot_stations = Vec::new();
    let mut section = Section::None;

    for raw_line in contents.lines() {
        if raw_line.trim().is_empty() {
            continue;
        }
        if let Some(rest) = raw_line.strip_prefix("playerSpawn:") {
            player_spawn = Some(parse_xy(rest.trim())?);
            continue;
        }
        if raw_line.trim() == "zombieSpawns" {
            section = Section::Zombie;
            continue;
        }
        if raw_line.trim() == "robotStations" {
            section = Section::Robot;
            continue;
        }
        if let Some(rest) = raw_line.strip_prefix('\t') {
            let point = parse_xy(rest.trim())?;
            match section {
                Section::Zombie => zombie_spawns.push(point),
                Section::Robot => robot_stations.push(point),
                Section::None => {
                    return Err(ConfigError::MalformedSpawnLine {
                        line: raw_line.to_string(),
                    })
                }
            }
            continue;
        }
        return Err(ConfigError::MalformedSpawnLine {
            line: raw_line.to_string(),
        });
    }

    let player_spawn = player_spawn.ok_or(ConfigError::MissingPlayerSpawn)?;
    if zombie_spawns.is_empty() {
        return Err(ConfigError::EmptyZombieSpawns);
    }

    Ok((player_spawn, zombie_spawns, robot_stations))
}

fn parse_xy(s: &str) -> Result<Position, ConfigError> {
    let mut parts = s.splitn(2, ',');
    let x = parts.next().and_then(|v| v.trim().parse::<f32>().ok());
    let y = parts.next().and_then(|v| v.trim().parse::<f32>().ok());
    match (x, y) {
        (Some(x), Some(y)) => Ok(Position::new(x, y)),
        _ => Err(ConfigError::MalformedSpawnLine { line: s.to_string() }),
    }
}
