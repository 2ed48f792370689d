//! Hyper-rectangle query regions.

use std::fmt;
use std::ops::{RangeFrom, RangeFull, RangeInclusive, RangeToInclusive};
use std::str::FromStr;

use super::error::{StoreError, StoreResult};
use super::Axis;

/// Selection along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSpec {
    /// Inclusive interval; `None` leaves that side open.
    Range {
        start: Option<f64>,
        stop: Option<f64>,
    },
    /// Single-sample lookup: exact matches, or the nearest neighbour on each
    /// side when nothing sits exactly at this coordinate.
    Point(f64),
}

impl AxisSpec {
    /// Everything along this axis.
    pub fn all() -> Self {
        Self::Range {
            start: None,
            stop: None,
        }
    }

    /// Interval with optional ends.
    pub fn range(start: Option<f64>, stop: Option<f64>) -> Self {
        Self::Range { start, stop }
    }

    /// Closed interval `[start, stop]`.
    pub fn between(start: f64, stop: f64) -> Self {
        Self::range(Some(start), Some(stop))
    }

    /// `[start, +inf)`.
    pub fn since(start: f64) -> Self {
        Self::range(Some(start), None)
    }

    /// `(-inf, stop]`.
    pub fn until(stop: f64) -> Self {
        Self::range(None, Some(stop))
    }

    /// Point lookup at `value`.
    pub fn at(value: f64) -> Self {
        Self::Point(value)
    }

    /// Whether the spec selects the whole axis.
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            Self::Range {
                start: None,
                stop: None
            }
        )
    }

    /// Reject NaN values and reversed intervals.
    pub fn validate(&self, axis: Axis) -> StoreResult<()> {
        match *self {
            Self::Point(v) if v.is_nan() => Err(StoreError::InvalidQuery(format!(
                "NaN point on axis {}",
                axis
            ))),
            Self::Point(_) => Ok(()),
            Self::Range { start, stop } => {
                if start.is_some_and(f64::is_nan) || stop.is_some_and(f64::is_nan) {
                    return Err(StoreError::InvalidQuery(format!(
                        "NaN bound on axis {}",
                        axis
                    )));
                }
                match (start, stop) {
                    (Some(lo), Some(hi)) if lo > hi => Err(StoreError::InvalidQuery(format!(
                        "start {} > stop {} on axis {}",
                        lo, hi, axis
                    ))),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Rewrite negative interval bounds as offsets from `latest`.
    /// Points are left alone.
    pub fn relative_to(&self, latest: f64) -> Self {
        let shift = |b: Option<f64>| b.map(|v| if v < 0.0 { latest + v } else { v });
        match *self {
            Self::Range { start, stop } => Self::Range {
                start: shift(start),
                stop: shift(stop),
            },
            point => point,
        }
    }
}

impl Default for AxisSpec {
    fn default() -> Self {
        Self::all()
    }
}

impl From<f64> for AxisSpec {
    fn from(v: f64) -> Self {
        Self::Point(v)
    }
}

impl From<RangeInclusive<f64>> for AxisSpec {
    fn from(r: RangeInclusive<f64>) -> Self {
        Self::between(*r.start(), *r.end())
    }
}

impl From<RangeFrom<f64>> for AxisSpec {
    fn from(r: RangeFrom<f64>) -> Self {
        Self::since(r.start)
    }
}

impl From<RangeToInclusive<f64>> for AxisSpec {
    fn from(r: RangeToInclusive<f64>) -> Self {
        Self::until(r.end)
    }
}

impl From<RangeFull> for AxisSpec {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

impl From<(Option<f64>, Option<f64>)> for AxisSpec {
    fn from((start, stop): (Option<f64>, Option<f64>)) -> Self {
        Self::range(start, stop)
    }
}

/// Parses `"lo:hi"`, `"lo:"`, `":hi"`, `":"` or a bare `"v"` point.
impl FromStr for AxisSpec {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        let parse = |v: &str| -> StoreResult<Option<f64>> {
            let v = v.trim();
            if v.is_empty() {
                return Ok(None);
            }
            v.parse::<f64>()
                .map(Some)
                .map_err(|e| StoreError::InvalidQuery(format!("bad bound {:?}: {}", v, e)))
        };
        match s.split_once(':') {
            Some((lo, hi)) => Ok(Self::range(parse(lo)?, parse(hi)?)),
            None => parse(s)?
                .map(Self::Point)
                .ok_or_else(|| StoreError::InvalidQuery("empty axis spec".to_string())),
        }
    }
}

impl fmt::Display for AxisSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_default();
        match *self {
            Self::Point(v) => write!(f, "{}", v),
            Self::Range { start, stop } => write!(f, "{}:{}", side(start), side(stop)),
        }
    }
}

/// A 4-D (t, x, y, z) hyper-rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Region {
    axes: [AxisSpec; 4],
}

impl Region {
    /// Region selecting every position.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a region from one spec per axis.
    pub fn new(
        t: impl Into<AxisSpec>,
        x: impl Into<AxisSpec>,
        y: impl Into<AxisSpec>,
        z: impl Into<AxisSpec>,
    ) -> Self {
        Self {
            axes: [t.into(), x.into(), y.into(), z.into()],
        }
    }

    /// Region bounded on time only.
    pub fn time(t: impl Into<AxisSpec>) -> Self {
        Self::all().with(Axis::T, t)
    }

    /// Replace the spec of one axis.
    pub fn with(mut self, axis: Axis, spec: impl Into<AxisSpec>) -> Self {
        self.axes[axis.index()] = spec.into();
        self
    }

    /// Spec of one axis.
    pub fn axis(&self, axis: Axis) -> &AxisSpec {
        &self.axes[axis.index()]
    }

    /// Specs in (t, x, y, z) order.
    pub fn axes(&self) -> &[AxisSpec; 4] {
        &self.axes
    }

    /// Check every axis.
    pub fn validate(&self) -> StoreResult<()> {
        for axis in Axis::ALL {
            self.axis(axis).validate(axis)?;
        }
        Ok(())
    }

    /// Resolve negative time bounds against the latest time coordinate.
    pub fn resolve_time(&self, latest: Option<f64>) -> Self {
        match latest {
            Some(latest) => self.with(Axis::T, self.axis(Axis::T).relative_to(latest)),
            None => *self,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [t, x, y, z] = &self.axes;
        write!(f, "(t {}, x {}, y {}, z {})", t, x, y, z)
    }
}
