//! Result ordering.

use std::cmp::Ordering;

use crate::types::{Axis, Entry};

/// Orders query results.
pub trait SortCriterion<P> {
    /// Compare two entries.
    fn compare(&self, a: &Entry<P>, b: &Entry<P>) -> Ordering;
}

/// Ascending by one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByAxis(pub Axis);

impl<P> SortCriterion<P> for ByAxis {
    fn compare(&self, a: &Entry<P>, b: &Entry<P>) -> Ordering {
        a.position
            .coord(self.0)
            .total_cmp(&b.position.coord(self.0))
    }
}

/// Shorthand for `ByAxis(Axis::T)`.
pub const BY_TIME: ByAxis = ByAxis(Axis::T);

impl<P, F> SortCriterion<P> for F
where
    F: Fn(&Entry<P>, &Entry<P>) -> Ordering,
{
    fn compare(&self, a: &Entry<P>, b: &Entry<P>) -> Ordering {
        self(a, b)
    }
}
