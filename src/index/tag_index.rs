//! Per-tag index: the same entries sorted four ways, one per axis.

use std::collections::HashMap;

use super::AxisIndex;
use crate::query::TagPredicate;
use crate::types::{Axis, AxisSpec, Bounds, EntryRef, Position, Region};

/// All entries carrying one tag, replicated into four axis-sorted views.
///
/// A 4-D range query becomes four 1-D binary searches: an entry is inside the
/// hyper-rectangle iff it is a candidate on every bounded axis.
#[derive(Debug, Clone)]
pub struct TagIndex {
    axes: [AxisIndex; 4],
}

impl TagIndex {
    /// Create a new, empty tag index.
    pub fn new() -> Self {
        Self {
            axes: Axis::ALL.map(AxisIndex::new),
        }
    }

    /// Add an entry to all four views.
    pub fn insert(&mut self, id: u32, position: &Position) {
        for axis in &mut self.axes {
            axis.insert(position.coord(axis.axis()), id);
        }
    }

    /// The sorted view along `axis`.
    pub fn axis(&self, axis: Axis) -> &AxisIndex {
        &self.axes[axis.index()]
    }

    /// Id of the entry with the greatest time coordinate.
    pub fn last_id(&self) -> Option<u32> {
        self.axis(Axis::T).last().map(|(_, id)| id)
    }

    /// Greatest time coordinate in the index.
    pub fn latest_time(&self) -> Option<f64> {
        self.axis(Axis::T).last().map(|(t, _)| t)
    }

    /// Ids of entries inside `region` that `predicate` accepts.
    /// Order is unspecified.
    pub fn range_query<P>(
        &self,
        arena: &[EntryRef<P>],
        region: &Region,
        predicate: &dyn TagPredicate,
    ) -> Vec<u32> {
        let (counts, required) = self.accumulate(arena, region, predicate);
        counts
            .into_iter()
            .filter(|&(_, n)| n == required)
            .map(|(id, _)| id)
            .collect()
    }

    /// Per-axis min/max over the entries `range_query` would return.
    pub fn bounds_query<P>(
        &self,
        arena: &[EntryRef<P>],
        region: &Region,
        predicate: &dyn TagPredicate,
    ) -> [Bounds; 4] {
        let mut bounds = [Bounds::new(); 4];
        let (counts, required) = self.accumulate(arena, region, predicate);
        for (id, n) in counts {
            if n != required {
                continue;
            }
            let position = &arena[id as usize].position;
            for axis in Axis::ALL {
                bounds[axis.index()].update(position.coord(axis));
            }
        }
        bounds
    }

    /// Count, per entry, the bounded axes it qualified on.
    ///
    /// Unbounded axes select every entry the predicate accepts, so they are
    /// skipped; a fully unbounded region scans the time view once.
    fn accumulate<P>(
        &self,
        arena: &[EntryRef<P>],
        region: &Region,
        predicate: &dyn TagPredicate,
    ) -> (HashMap<u32, u8>, u8) {
        let mut bounded: Vec<(Axis, AxisSpec)> = Axis::ALL
            .iter()
            .map(|&a| (a, *region.axis(a)))
            .filter(|(_, spec)| !spec.is_unbounded())
            .collect();
        if bounded.is_empty() {
            bounded.push((Axis::T, AxisSpec::all()));
        }

        let mut counts: HashMap<u32, u8> = HashMap::new();
        for (i, (axis, spec)) in bounded.iter().enumerate() {
            let first_pass = i == 0;
            self.axis(*axis).visit(spec, |id| {
                if !predicate.accepts(&arena[id as usize].tags) {
                    return false;
                }
                if first_pass {
                    *counts.entry(id).or_insert(0) += 1;
                } else if let Some(n) = counts.get_mut(&id) {
                    *n += 1;
                }
                true
            });
            if counts.is_empty() {
                break;
            }
        }
        (counts, bounded.len() as u8)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.axis(Axis::T).len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new()
    }
}
