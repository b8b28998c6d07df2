//! Narrative history - the recent back-and-forth between player and narrator.

use game_state::{LocationId, WorldTime};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::HistoryStore;

/// One player input and the narration that answered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeExchange {
    /// Insertion order within the session, assigned by the store.
    pub sequence: u64,
    pub timestamp: WorldTime,
    /// Where the exchange happened, if anywhere in particular.
    pub location: Option<LocationId>,
    pub player_input: String,
    pub response: String,
}

impl NarrativeExchange {
    pub fn new(player_input: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            sequence: 0,
            timestamp: WorldTime::default(),
            location: None,
            player_input: player_input.into(),
            response: response.into(),
        }
    }

    pub fn at(mut self, location: impl Into<LocationId>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: WorldTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// FIFO log of exchanges bounded by `max_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeHistory {
    exchanges: VecDeque<NarrativeExchange>,
    max_items: usize,
    next_sequence: u64,
}

impl NarrativeHistory {
    /// Create an empty history keeping at most `max_items` exchanges (minimum 1).
    pub fn new(max_items: usize) -> Self {
        Self {
            exchanges: VecDeque::new(),
            max_items: max_items.max(1),
            next_sequence: 1,
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Replace the retention bound, evicting immediately if it shrank.
    pub fn set_max_items(&mut self, max_items: usize) {
        self.max_items = max_items.max(1);
        self.evict_if_over_capacity();
    }

    /// All retained exchanges, oldest first.
    pub fn all(&self) -> impl Iterator<Item = &NarrativeExchange> {
        self.exchanges.iter()
    }

    /// The last `n` exchanges, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&NarrativeExchange> {
        let skip = self.exchanges.len().saturating_sub(n);
        self.exchanges.iter().skip(skip).collect()
    }

    pub fn latest(&self) -> Option<&NarrativeExchange> {
        self.exchanges.back()
    }
}

impl Default for NarrativeHistory {
    fn default() -> Self {
        Self::new(crate::config::NarrativeContextConfig::default().max_history_items)
    }
}

impl HistoryStore for NarrativeHistory {
    type Entry = NarrativeExchange;
    type Key = LocationId;

    fn record(&mut self, mut entry: NarrativeExchange) -> bool {
        if entry.player_input.trim().is_empty() && entry.response.trim().is_empty() {
            tracing::warn!(domain = "narrative", "rejected exchange with no input and no response");
            return false;
        }

        entry.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.exchanges.push_back(entry);
        self.evict_if_over_capacity();
        true
    }

    fn entries(&self, key: &LocationId) -> Vec<&NarrativeExchange> {
        self.exchanges
            .iter()
            .filter(|e| e.location.as_ref() == Some(key))
            .collect()
    }

    fn evict_if_over_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.exchanges.len() > self.max_items {
            self.exchanges.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(domain = "narrative", evicted, "evicted oldest exchanges");
        }
        evicted
    }

    fn clear(&mut self, key: Option<&LocationId>) {
        match key {
            Some(location) => self.exchanges.retain(|e| e.location.as_ref() != Some(location)),
            None => self.exchanges.clear(),
        }
    }

    fn len(&self) -> usize {
        self.exchanges.len()
    }
}
