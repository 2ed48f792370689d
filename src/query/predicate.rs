//! Tag filters applied to every range-query candidate.

use std::collections::BTreeSet;

/// Decides whether an entry with the given tags belongs in a result.
pub trait TagPredicate {
    /// Return `true` to keep the entry.
    fn accepts(&self, tags: &BTreeSet<String>) -> bool;
}

/// Accepts entries carrying every required tag. Empty accepts everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredTags {
    tags: Vec<String>,
}

impl RequiredTags {
    /// Require all of `tags`.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        tags.sort_unstable();
        tags.dedup();
        Self { tags }
    }

    /// The required tags, sorted and de-duplicated.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Whether nothing is required.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Whether `tag` is one of the required tags.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.binary_search_by(|t| t.as_str().cmp(tag)).is_ok()
    }
}

impl TagPredicate for RequiredTags {
    fn accepts(&self, tags: &BTreeSet<String>) -> bool {
        self.tags.iter().all(|t| tags.contains(t))
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyTags;

impl TagPredicate for AnyTags {
    fn accepts(&self, _tags: &BTreeSet<String>) -> bool {
        true
    }
}
