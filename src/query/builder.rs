//! Fluent query construction over a [`Database`].

use crate::store::Database;
use crate::types::{Axis, AxisSpec, Bounds, EntryRef, Region, StoreResult};

use super::{QueryOptions, SortCriterion};

/// A query under construction.
///
/// ```rust,ignore
/// let recent = db
///     .query(&["SAMPLE", "uav7"])
///     .time(-30.0..)
///     .sort_by(BY_TIME)
///     .entries()?;
/// ```
pub struct Query<'db, P> {
    db: &'db Database<P>,
    tags: Vec<String>,
    region: Region,
    sort: Option<Box<dyn SortCriterion<P> + 'db>>,
    assume_positive_time: bool,
}

impl<'db, P: Send + Sync + 'static> Query<'db, P> {
    pub(crate) fn new(db: &'db Database<P>, tags: &[&str]) -> Self {
        Self {
            db,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            region: Region::all(),
            sort: None,
            assume_positive_time: true,
        }
    }

    /// Replace the whole region.
    pub fn region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Restrict one axis.
    pub fn axis(mut self, axis: Axis, spec: impl Into<AxisSpec>) -> Self {
        self.region = self.region.with(axis, spec);
        self
    }

    /// Restrict the time axis.
    pub fn time(self, spec: impl Into<AxisSpec>) -> Self {
        self.axis(Axis::T, spec)
    }

    /// Order the returned entries.
    pub fn sort_by(mut self, criterion: impl SortCriterion<P> + 'db) -> Self {
        self.sort = Some(Box::new(criterion));
        self
    }

    /// Whether negative time bounds are offsets from the latest entry (default `true`).
    ///
    /// The offset is taken from the newest entry in the whole store, not the
    /// newest entry carrying the queried tags: `.time(-30.0..)` on tag `X`
    /// selects `X` entries from the last 30 time units of the store, which is
    /// empty when `X` has been silent for longer than that.
    pub fn assume_positive_time(mut self, yes: bool) -> Self {
        self.assume_positive_time = yes;
        self
    }

    fn options(&self) -> QueryOptions<'_, P> {
        QueryOptions {
            sort: self
                .sort
                .as_ref()
                .map(|s| s.as_ref() as &dyn SortCriterion<P>),
            assume_positive_time: self.assume_positive_time,
        }
    }

    fn tag_refs(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    /// Run the query and return matching entries.
    pub fn entries(&self) -> StoreResult<Vec<EntryRef<P>>> {
        self.db
            .read()
            .find_entries_with(&self.tag_refs(), &self.region, &self.options())
    }

    /// Run the query and return the per-axis bounds of matching entries.
    pub fn bounds(&self) -> StoreResult<[Bounds; 4]> {
        self.db
            .read()
            .find_bounds_with(&self.tag_refs(), &self.region, self.assume_positive_time)
    }
}
