//! Location history - what happened on each visit to each place.

use game_state::{LocationId, WorldTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::HistoryStore;

/// Facts recorded about a single visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationVisit {
    pub location_id: LocationId,
    /// 1-based count of visits to this location, assigned by the store.
    pub visit_index: u64,
    pub timestamp: WorldTime,
    pub npcs_present: Vec<String>,
    pub player_actions: Vec<String>,
    pub discoveries: Vec<String>,
    pub environmental_changes: Vec<String>,
    pub additional_details: Vec<String>,
}

impl LocationVisit {
    pub fn new(location_id: impl Into<LocationId>) -> Self {
        Self {
            location_id: location_id.into(),
            visit_index: 0,
            timestamp: WorldTime::default(),
            npcs_present: Vec::new(),
            player_actions: Vec::new(),
            discoveries: Vec::new(),
            environmental_changes: Vec::new(),
            additional_details: Vec::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: WorldTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_npc(mut self, name: impl Into<String>) -> Self {
        self.npcs_present.push(name.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.player_actions.push(action.into());
        self
    }

    pub fn with_discovery(mut self, discovery: impl Into<String>) -> Self {
        self.discoveries.push(discovery.into());
        self
    }

    pub fn with_change(mut self, change: impl Into<String>) -> Self {
        self.environmental_changes.push(change.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.additional_details.push(detail.into());
        self
    }

    /// One-line digest of the visit.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.npcs_present.is_empty() {
            parts.push(format!("met {}", self.npcs_present.join(", ")));
        }
        if !self.player_actions.is_empty() {
            parts.push(format!("did: {}", self.player_actions.join("; ")));
        }
        if !self.discoveries.is_empty() {
            parts.push(format!("found: {}", self.discoveries.join("; ")));
        }
        if !self.environmental_changes.is_empty() {
            parts.push(format!("changed: {}", self.environmental_changes.join("; ")));
        }
        if !self.additional_details.is_empty() {
            parts.push(self.additional_details.join("; "));
        }
        if parts.is_empty() {
            parts.push("nothing of note".to_string());
        }
        format!("Visit {} ({}): {}", self.visit_index, self.timestamp, parts.join(" | "))
    }
}

/// Visits grouped by location, each group bounded FIFO by `max_per_location`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationHistory {
    visits: BTreeMap<LocationId, VecDeque<LocationVisit>>,
    total_visits: BTreeMap<LocationId, u64>,
    max_per_location: usize,
}

impl LocationHistory {
    pub fn new(max_per_location: usize) -> Self {
        Self {
            visits: BTreeMap::new(),
            total_visits: BTreeMap::new(),
            max_per_location: max_per_location.max(1),
        }
    }

    pub fn max_per_location(&self) -> usize {
        self.max_per_location
    }

    pub fn set_max_per_location(&mut self, max: usize) {
        self.max_per_location = max.max(1);
        self.evict_if_over_capacity();
    }

    /// Retained visits for a location, oldest first.
    pub fn visits(&self, location: &LocationId) -> impl Iterator<Item = &LocationVisit> {
        self.visits.get(location).into_iter().flatten()
    }

    /// Number of retained visits for a location.
    pub fn visit_count(&self, location: &LocationId) -> usize {
        self.visits.get(location).map(|v| v.len()).unwrap_or(0)
    }

    /// Number of visits ever recorded for a location, including evicted ones.
    pub fn total_visits(&self, location: &LocationId) -> u64 {
        self.total_visits.get(location).copied().unwrap_or(0)
    }

    pub fn last_visit(&self, location: &LocationId) -> Option<&LocationVisit> {
        self.visits.get(location).and_then(|v| v.back())
    }

    /// Locations with at least one retained visit, in id order.
    pub fn visited_locations(&self) -> impl Iterator<Item = &LocationId> {
        self.visits.keys()
    }
}

impl Default for LocationHistory {
    fn default() -> Self {
        Self::new(crate::config::LocationContextConfig::default().max_location_history)
    }
}

impl HistoryStore for LocationHistory {
    type Entry = LocationVisit;
    type Key = LocationId;

    fn record(&mut self, mut visit: LocationVisit) -> bool {
        if visit.location_id.as_str().trim().is_empty() {
            tracing::warn!(domain = "location", "rejected visit without a location id");
            return false;
        }

        let total = self.total_visits.entry(visit.location_id.clone()).or_insert(0);
        *total += 1;
        visit.visit_index = *total;

        self.visits
            .entry(visit.location_id.clone())
            .or_default()
            .push_back(visit);
        self.evict_if_over_capacity();
        true
    }

    fn entries(&self, key: &LocationId) -> Vec<&LocationVisit> {
        self.visits(key).collect()
    }

    fn evict_if_over_capacity(&mut self) -> usize {
        let mut evicted = 0;
        for (location, visits) in self.visits.iter_mut() {
            while visits.len() > self.max_per_location {
                visits.pop_front();
                evicted += 1;
                tracing::debug!(domain = "location", location = %location, "evicted oldest visit");
            }
        }
        evicted
    }

    fn clear(&mut self, key: Option<&LocationId>) {
        match key {
            Some(location) => {
                self.visits.remove(location);
                self.total_visits.remove(location);
            }
            None => {
                self.visits.clear();
                self.total_visits.clear();
            }
        }
    }

    fn len(&self) -> usize {
        self.visits.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_is_per_location() {
        let mut history = LocationHistory::new(3);
        let tavern = LocationId::from("tavern-1");

        for _ in 0..5 {
            assert!(history.record(LocationVisit::new("tavern-1")));
        }
        history.record(LocationVisit::new("town-1"));

        assert_eq!(history.visit_count(&tavern), 3);
        assert_eq!(history.total_visits(&tavern), 5);
        assert_eq!(history.visit_count(&LocationId::from("town-1")), 1);
        assert_eq!(history.len(), 4);

        let indices: Vec<_> = history.visits(&tavern).map(|v| v.visit_index).collect();
        assert_eq!(indices, vec![3, 4, 5]);
    }

    #[test]
    fn test_rejects_blank_location() {
        let mut history = LocationHistory::new(3);
        assert!(!history.record(LocationVisit::new("  ")));
        assert!(history.is_empty());
    }

    #[test]
    fn test_describe_visit() {
        let mut history = LocationHistory::new(3);
        history.record(
            LocationVisit::new("tavern-1")
                .with_timestamp(WorldTime::new(2, 19, 30))
                .with_npc("Barliman")
                .with_action("ordered an ale")
                .with_discovery("a hidden trapdoor"),
        );

        let visit = history.last_visit(&LocationId::from("tavern-1")).unwrap();
        assert_eq!(
            visit.describe(),
            "Visit 1 (Day 2, 19:30): met Barliman | did: ordered an ale | found: a hidden trapdoor"
        );
    }

    #[test]
    fn test_empty_visit_description() {
        let visit = LocationVisit::new("x");
        assert!(visit.describe().ends_with("nothing of note"));
    }

    #[test]
    fn test_clear_and_shrink() {
        let mut history = LocationHistory::new(4);
        for _ in 0..4 {
            history.record(LocationVisit::new("tavern-1"));
            history.record(LocationVisit::new("town-1"));
        }

        history.set_max_per_location(2);
        assert_eq!(history.len(), 4);

        history.clear(Some(&LocationId::from("town-1")));
        assert_eq!(history.total_visits(&LocationId::from("town-1")), 0);
        assert_eq!(history.visited_locations().count(), 1);

        history.clear(None);
        assert!(history.is_empty());
    }
}
