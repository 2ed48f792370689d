//! Query-side interfaces: tag predicates, result ordering, and the query builder.

pub mod builder;
pub mod predicate;
pub mod sort;

pub use builder::Query;
pub use predicate::{AnyTags, RequiredTags, TagPredicate};
pub use sort::{ByAxis, SortCriterion, BY_TIME};

/// Per-query knobs shared by entry and bounds lookups.
pub struct QueryOptions<'a, P> {
    /// Ordering applied to returned entries; unspecified order when `None`.
    pub sort: Option<&'a dyn SortCriterion<P>>,
    /// Read negative time bounds as offsets from the latest time in the store
    /// (across all tags, not only the queried ones).
    pub assume_positive_time: bool,
}

impl<P> Default for QueryOptions<'_, P> {
    fn default() -> Self {
        Self {
            sort: None,
            assume_positive_time: true,
        }
    }
}
