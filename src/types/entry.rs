//! The stored unit: payload + position + tags.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::Position;

/// Shared handle to an entry held by a store.
pub type EntryRef<P> = Arc<Entry<P>>;

/// A single observation. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry<P> {
    /// Whatever the producer stored (GPS fix, sensor sample, status...).
    pub payload: P,
    /// Where and when the observation was made.
    pub position: Position,
    /// Search tags. A store gives an untagged entry its default tag on insert.
    pub tags: BTreeSet<String>,
}

impl<P> Entry<P> {
    /// Create an entry. Duplicate tags collapse.
    pub fn new<I, S>(payload: P, position: Position, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payload,
            position,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// Create an entry without tags; the store it is inserted into tags it
    /// with its default tag ([`crate::DEFAULT_TAG`] unless configured).
    pub fn untagged(payload: P, position: Position) -> Self {
        Self {
            payload,
            position,
            tags: BTreeSet::new(),
        }
    }

    /// Whether this entry carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether this entry carries every one of `tags`.
    pub fn has_all_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().all(|t| self.tags.contains(t.as_ref()))
    }
}

impl<P: fmt::Debug> fmt::Display for Entry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        write!(
            f,
            "Entry at position {}, tags: [{}], data: {:?}",
            self.position,
            tags.join(", "),
            self.payload
        )
    }
}
