//! 2D position and velocity primitives.
//!
//! These are the value types every other crate in the workspace builds on:
//! the map rasters, the pathfinding engine's node-to-world mapping, and the
//! actor/session state all move `Position`/`Velocity` values around rather
//! than raw `f32` pairs.

use std::f32::consts::TAU;

/// Default epsilon used when two positions are considered "the same place".
pub const DEFAULT_EPSILON: f32 = 0.01;

/// A point in world space.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl From<(f32, f32)> for Position {
    fn from(value: (f32, f32)) -> Self {
        Position {
            x: value.0,
            y: value.1,
        }
    }
}

impl Position {
    pub fn new(x: f32, y: f32) -> Position {
        Position { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether two positions coincide within `epsilon`.
    pub fn is_near(&self, other: &Position, epsilon: f32) -> bool {
        self.distance_to(other) < epsilon
    }

    /// Angle from `self` towards `other`, in radians.
    pub fn angle_to(&self, other: &Position) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

impl PartialEq for Position {
    /// Positions compare equal when within [`DEFAULT_EPSILON`] of each
    /// other, not by exact float equality.
    fn eq(&self, other: &Self) -> bool {
        self.is_near(other, DEFAULT_EPSILON)
    }
}

/// A 2D velocity, in world units per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl From<(f32, f32)> for Velocity {
    fn from(value: (f32, f32)) -> Self {
        Velocity {
            x: value.0,
            y: value.1,
        }
    }
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Velocity {
        Velocity { x, y }
    }

    /// Build a velocity from an angle (radians) and a magnitude.
    pub fn from_polar(theta: f32, magnitude: f32) -> Velocity {
        Velocity::new(theta.cos() * magnitude, theta.sin() * magnitude)
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// A velocity pointed from `from` towards `to` at the given speed.
    /// Zero if `from` and `to` coincide.
    pub fn towards(from: &Position, to: &Position, speed: f32) -> Velocity {
        if from.is_near(to, DEFAULT_EPSILON) {
            return Velocity::ZERO;
        }
        Velocity::from_polar(from.angle_to(to), speed)
    }

    pub fn scaled_by_time(&self, dt_secs: f32) -> (f32, f32) {
        (self.x * dt_secs, self.y * dt_secs)
    }
}

/// Normalizes an angle in radians to `[0, TAU)`. Kept for callers that
/// accumulate angles over many frames and want to keep them bounded.
pub fn normalize_angle(theta: f32) -> f32 {
    let wrapped = theta % TAU;
    if wrapped < 0.0 {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_position_equality_uses_epsilon() {
        let a = Position::new(10.0, 10.0);
        let b = Position::new(10.005, 10.0);
        assert_eq!(a, b);
        let c = Position::new(10.02, 10.0);
        assert_ne!(a, c);
    }

    #[test]
    fn test_distance_to() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }

    #[test]
    fn test_velocity_from_polar() {
        let v = Velocity::from_polar(0.0, 10.0);
        assert!((v.x - 10.0).abs() < 1e-5);
        assert!(v.y.abs() < 1e-5);
    }

    #[test]
    fn test_velocity_towards() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(10.0, 0.0);
        let v = Velocity::towards(&a, &b, 5.0);
        assert!((v.magnitude() - 5.0).abs() < 1e-4);
        assert!(v.x > 0.0);
    }

    #[test]
    fn test_velocity_towards_same_point_is_zero() {
        let a = Position::new(1.0, 1.0);
        let v = Velocity::towards(&a, &a, 5.0);
        assert_eq!(v, Velocity::ZERO);
    }

    #[test]
    fn test_translated() {
        let a = Position::new(1.0, 1.0);
        let b = a.translated(2.0, -1.0);
        assert_eq!(b, Position::new(3.0, 0.0));
    }
}
