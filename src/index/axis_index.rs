//! One sorted view of an index: (coordinate, entry id) pairs along one axis.

use crate::types::{Axis, AxisSpec};

/// Sorted list of (coordinate, arena id) pairs for one axis.
///
/// Backed by a plain sorted `Vec`: lookups are O(log n) but insertion shifts
/// the tail, so inserting is O(n). This is the scalability ceiling of the
/// store for very large indexes.
#[derive(Debug, Clone)]
pub struct AxisIndex {
    axis: Axis,
    /// Sorted by coordinate ascending; equal coordinates keep insertion order.
    entries: Vec<(f64, u32)>,
}

impl AxisIndex {
    /// Create a new, empty index along `axis`.
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            entries: Vec::new(),
        }
    }

    /// The axis this index is sorted on.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Insert after every pair with an equal or smaller coordinate.
    pub fn insert(&mut self, key: f64, id: u32) {
        let pos = self.entries.partition_point(|(k, _)| *k <= key);
        self.entries.insert(pos, (key, id));
    }

    /// Pairs whose coordinate lies in `[start, stop]`; `None` leaves a side open.
    pub fn range(&self, start: Option<f64>, stop: Option<f64>) -> &[(f64, u32)] {
        let lo = start.map_or(0, |s| self.entries.partition_point(|(k, _)| *k < s));
        let hi = stop.map_or(self.entries.len(), |s| {
            self.entries.partition_point(|(k, _)| *k <= s)
        });
        if lo >= hi {
            return &[];
        }
        &self.entries[lo..hi]
    }

    /// Feed the candidates selected by `spec` to `accept`.
    ///
    /// Intervals feed every pair in range. Points feed every pair sitting
    /// exactly on the coordinate; when `accept` takes none of them, they walk
    /// away from the coordinate in both directions and stop each walk at the
    /// first id `accept` returns `true` for.
    pub fn visit(&self, spec: &AxisSpec, mut accept: impl FnMut(u32) -> bool) {
        match *spec {
            AxisSpec::Range { start, stop } => {
                for &(_, id) in self.range(start, stop) {
                    accept(id);
                }
            }
            AxisSpec::Point(v) => {
                let lo = self.entries.partition_point(|(k, _)| *k < v);
                let hi = self.entries.partition_point(|(k, _)| *k <= v);
                let mut hit = false;
                for &(_, id) in &self.entries[lo..hi] {
                    hit |= accept(id);
                }
                if hit {
                    return;
                }
                for &(_, id) in self.entries[..lo].iter().rev() {
                    if accept(id) {
                        break;
                    }
                }
                for &(_, id) in &self.entries[hi..] {
                    if accept(id) {
                        break;
                    }
                }
            }
        }
    }

    /// Smallest pair.
    pub fn first(&self) -> Option<(f64, u32)> {
        self.entries.first().copied()
    }

    /// Largest pair (the most recently inserted among equal coordinates).
    pub fn last(&self) -> Option<(f64, u32)> {
        self.entries.last().copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a reference to the underlying pairs.
    pub fn entries(&self) -> &[(f64, u32)] {
        &self.entries
    }
}
