//! Running min/max helper.

use std::fmt;

use serde::Serialize;

/// Min and max of a set of values. Empty until the first `update`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    /// Create empty bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create bounds spanning `[min, max]`.
    pub fn from_range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Build bounds covering every value of an iterator.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut bounds = Self::new();
        for v in values {
            bounds.update(v);
        }
        bounds
    }

    /// Widen the bounds to include `value`.
    pub fn update(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Forget every value seen so far.
    pub fn reset(&mut self) {
        self.min = None;
        self.max = None;
    }

    /// Whether no value was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
    }

    /// `max - min`, or `None` when empty.
    pub fn span(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }

    /// Whether `value` lies in `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => lo <= value && value <= hi,
            _ => false,
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => write!(f, "[min: {}, max: {}]", lo, hi),
            _ => f.write_str("[empty]"),
        }
    }
}
