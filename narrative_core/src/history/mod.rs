//! History stores - bounded, append-only logs of what happened in a session.
//!
//! There is one store per domain:
//! - **narrative**: player/narrator exchanges, evicted one entry at a time
//! - **location**: visits, bounded per location
//! - **combat**: actions grouped by round, evicted a whole round at a time into
//!   a rolling summary
//!
//! Stores are owned by a single session. Recording never fails loudly: a
//! malformed entry is logged and dropped so a bad record cannot abort a turn.

mod combat;
mod location;
mod narrative;

pub use combat::*;
pub use location::*;
pub use narrative::*;

/// Common contract for every history store.
pub trait HistoryStore {
    type Entry;
    type Key;

    /// Append an entry. Returns `false` (and stores nothing) when the entry is malformed.
    fn record(&mut self, entry: Self::Entry) -> bool;

    /// Entries stored under `key`, oldest first.
    fn entries(&self, key: &Self::Key) -> Vec<&Self::Entry>;

    /// Drop the oldest entries until the retention bound holds. Returns how many
    /// units (entries or rounds) were evicted.
    fn evict_if_over_capacity(&mut self) -> usize;

    /// Forget everything under `key`, or everything when `key` is `None`.
    fn clear(&mut self, key: Option<&Self::Key>);

    /// Number of entries currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shorten `text` to at most `max_chars` characters, marking the cut.
pub(crate) fn clip(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}
