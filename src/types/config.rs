//! Store tuning knobs.

use super::{DEFAULT_REORDER_PERIOD, DEFAULT_TAG};

/// Configuration of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Inserts between two search-priority reorder passes (minimum 1).
    pub reorder_period: usize,
    /// Tag substituted when an entry arrives without any.
    pub default_tag: String,
}

impl StoreConfig {
    /// Set the reorder period. Zero is treated as one.
    pub fn reorder_period(mut self, period: usize) -> Self {
        self.reorder_period = period.max(1);
        self
    }

    /// Set the tag used for untagged entries.
    pub fn default_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_tag = tag.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reorder_period: DEFAULT_REORDER_PERIOD,
            default_tag: DEFAULT_TAG.to_string(),
        }
    }
}
