//! Time-ordered replay of stored entries.
//!
//! A [`ReplayCursor`] walks a store's entries by ascending time on a virtual
//! clock that starts at zero, so a recorded session can be fed back into a
//! fresh [`Database`] as if it were arriving live.

use crate::store::Database;
use crate::types::{EntryRef, StoreResult};

/// Cursor over time-ordered entries.
pub struct ReplayCursor<P> {
    entries: Vec<EntryRef<P>>,
    next: usize,
    current_time: f64,
    time_factor: f64,
}

impl<P: Send + Sync + 'static> ReplayCursor<P> {
    /// Replay every entry of `source` carrying all `tags`.
    pub fn from_database(source: &Database<P>, tags: &[&str]) -> Self {
        Self::new(source.entries_by_time(tags))
    }
}

impl<P> ReplayCursor<P> {
    /// Replay `entries`, which are sorted by time first.
    pub fn new(mut entries: Vec<EntryRef<P>>) -> Self {
        entries.sort_by(|a, b| a.position.t.total_cmp(&b.position.t));
        Self {
            entries,
            next: 0,
            current_time: 0.0,
            time_factor: 1.0,
        }
    }

    /// Speed of the virtual clock relative to wall time (default 1).
    pub fn with_time_factor(mut self, factor: f64) -> Self {
        self.time_factor = factor;
        self
    }

    /// Position of the virtual clock.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Move the clock to `time` and return the entries it went past
    /// (time coordinate <= `time`), oldest first.
    pub fn advance_to(&mut self, time: f64) -> &[EntryRef<P>] {
        self.current_time = self.current_time.max(time);
        let now = self.current_time;
        let start = self.next;
        self.next = start + self.entries[start..].partition_point(|e| e.position.t <= now);
        &self.entries[start..self.next]
    }

    /// Move the clock by `elapsed` wall seconds scaled by the time factor.
    pub fn advance_by(&mut self, elapsed: f64) -> &[EntryRef<P>] {
        let target = self.current_time + elapsed * self.time_factor;
        self.advance_to(target)
    }

    /// Feed every entry up to `time` into `target`. Returns how many were inserted.
    pub fn replay_into(&mut self, target: &Database<P>, time: f64) -> StoreResult<usize>
    where
        P: Send + Sync + 'static,
    {
        let due = self.advance_to(time).to_vec();
        let count = due.len();
        let mut writer = target.write();
        for entry in due {
            writer.insert_shared(entry)?;
        }
        Ok(count)
    }

    /// Rewind to the start.
    pub fn restart(&mut self) {
        self.next = 0;
        self.current_time = 0.0;
    }

    /// Entries not yet replayed.
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.next
    }

    /// Whether every entry was replayed.
    pub fn is_finished(&self) -> bool {
        self.next == self.entries.len()
    }
}

impl<P> Iterator for ReplayCursor<P> {
    type Item = EntryRef<P>;

    /// Next entry regardless of the clock; the clock jumps to its time.
    fn next(&mut self) -> Option<EntryRef<P>> {
        let entry = self.entries.get(self.next)?.clone();
        self.next += 1;
        self.current_time = self.current_time.max(entry.position.t);
        Some(entry)
    }
}
