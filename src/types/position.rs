//! Space-time coordinates.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// One of the four space-time dimensions, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    /// Time.
    T = 0,
    /// East (or first horizontal) coordinate.
    X = 1,
    /// North (or second horizontal) coordinate.
    Y = 2,
    /// Altitude.
    Z = 3,
}

impl Axis {
    /// All axes in (t, x, y, z) order.
    pub const ALL: [Axis; 4] = [Axis::T, Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in a (t, x, y, z) array.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Parse an axis from its single-letter name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "t" => Some(Self::T),
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }

    /// Single-letter name of the axis.
    pub fn name(self) -> &'static str {
        match self {
            Self::T => "t",
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A (t, x, y, z) space-time position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Create a position from its four coordinates.
    pub fn new(t: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t, x, y, z }
    }

    /// Coordinate along the given axis.
    pub fn coord(&self, axis: Axis) -> f64 {
        match axis {
            Axis::T => self.t,
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Returns `[t, x, y, z]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.t, self.x, self.y, self.z]
    }

    /// Whether all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for Position {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(
            self.t + other.t,
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
        )
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position::new(
            self.t - other.t,
            self.x - other.x,
            self.y - other.y,
            self.z - other.z,
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(t: {}, x: {}, y: {}, z: {})",
            self.t, self.x, self.y, self.z
        )
    }
}
