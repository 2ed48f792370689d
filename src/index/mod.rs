//! Index structures for space-time range lookup.

pub mod axis_index;
pub mod tag_index;

pub use axis_index::AxisIndex;
pub use tag_index::TagIndex;
