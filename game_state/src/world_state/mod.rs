//! The game state snapshot - a read-only view of the world handed over per call.

mod combat;
mod quest;

pub use combat::*;
pub use quest::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{EntityId, Npc, PlayerCharacter};
use crate::error::SnapshotError;
use crate::keyed::{index_by_key, map_or_seq, Keyed};

/// Identifier for locations, e.g. `"tavern-1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// World time tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct WorldTime {
    pub day: u32,
    pub hour: u8,
    pub minute: u8,
}

impl WorldTime {
    pub fn new(day: u32, hour: u8, minute: u8) -> Self {
        Self { day, hour, minute }
    }

    pub fn is_night(&self) -> bool {
        self.hour < 6 || self.hour >= 20
    }

    pub fn time_of_day(&self) -> TimeOfDay {
        match self.hour {
            5..=6 => TimeOfDay::Dawn,
            7..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=19 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

impl std::fmt::Display for WorldTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Day {}, {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn label(&self) -> &'static str {
        match self {
            TimeOfDay::Dawn => "dawn",
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

/// Weather conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
}

impl Weather {
    pub fn label(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Cloudy => "cloudy",
            Weather::Rainy => "rainy",
            Weather::Stormy => "stormy",
            Weather::Snowy => "snowy",
            Weather::Foggy => "foggy",
        }
    }

    /// Whether anything is falling from the sky.
    pub fn has_precipitation(&self) -> bool {
        matches!(self, Weather::Rainy | Weather::Stormy | Weather::Snowy)
    }
}

/// Location types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Wilderness,
    Town,
    Dungeon,
    #[default]
    Building,
    Special,
}

/// A location in the game world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location_type: LocationType,
    /// Whether the location is under open sky (weather applies).
    #[serde(default)]
    pub outdoors: bool,
    /// Notable fixtures, smells, sounds.
    #[serde(default)]
    pub features: Vec<String>,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            location_type: LocationType::Building,
            outdoors: false,
            features: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_type(mut self, location_type: LocationType) -> Self {
        self.location_type = location_type;
        self
    }

    pub fn outdoors(mut self) -> Self {
        self.outdoors = true;
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }
}

impl Keyed for Location {
    type Key = LocationId;

    fn key(&self) -> LocationId {
        self.id.clone()
    }
}

/// An undirected connection between two locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationLink {
    pub from: LocationId,
    pub to: LocationId,
    /// e.g. "a muddy road", "the back door".
    #[serde(default)]
    pub via: Option<String>,
}

impl LocationLink {
    pub fn new(from: impl Into<LocationId>, to: impl Into<LocationId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            via: None,
        }
    }

    /// The endpoint opposite `id`, if `id` is one of the two endpoints.
    pub fn other_end(&self, id: &LocationId) -> Option<&LocationId> {
        if &self.from == id {
            Some(&self.to)
        } else if &self.to == id {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// A neighbouring location resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub id: LocationId,
    pub name: String,
    pub via: Option<String>,
}

/// Everything the narrative layer may read about the current game.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameStateSnapshot {
    #[serde(default)]
    pub current_location: Option<LocationId>,

    #[serde(default)]
    pub player: Option<PlayerCharacter>,

    #[serde(default, deserialize_with = "map_or_seq")]
    pub locations: BTreeMap<LocationId, Location>,

    #[serde(default)]
    pub links: Vec<LocationLink>,

    #[serde(default, deserialize_with = "map_or_seq")]
    pub npcs: BTreeMap<EntityId, Npc>,

    #[serde(default)]
    pub quests: Vec<Quest>,

    #[serde(default)]
    pub combat: Option<CombatSnapshot>,

    #[serde(default)]
    pub recent_encounters: Vec<EncounterOutcome>,

    #[serde(default)]
    pub time: WorldTime,

    #[serde(default)]
    pub weather: Weather,
}

impl GameStateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a snapshot from the engine's JSON representation.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_player(mut self, player: PlayerCharacter) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.id.clone(), location);
        self
    }

    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Location>) -> Self {
        self.locations.extend(index_by_key(locations));
        self
    }

    pub fn with_link(mut self, link: LocationLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_npc(mut self, npc: Npc) -> Self {
        self.npcs.insert(npc.id.clone(), npc);
        self
    }

    pub fn with_quest(mut self, quest: Quest) -> Self {
        self.quests.push(quest);
        self
    }

    pub fn with_combat(mut self, combat: CombatSnapshot) -> Self {
        self.combat = Some(combat);
        self
    }

    pub fn at(mut self, location: impl Into<LocationId>) -> Self {
        self.current_location = Some(location.into());
        self
    }

    pub fn with_time(mut self, time: WorldTime) -> Self {
        self.time = time;
        self
    }

    pub fn with_weather(mut self, weather: Weather) -> Self {
        self.weather = weather;
        self
    }

    pub fn location(&self, id: &LocationId) -> Option<&Location> {
        self.locations.get(id)
    }

    /// The location the party is standing in, if known.
    pub fn current_location(&self) -> Option<&Location> {
        self.current_location.as_ref().and_then(|id| self.locations.get(id))
    }

    /// Display name for a location id, falling back to the raw id.
    pub fn location_name(&self, id: &LocationId) -> String {
        self.locations
            .get(id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| id.0.clone())
    }

    /// Locations connected to `id`.
    ///
    /// Links are undirected: an edge matches when `id` is either endpoint, and
    /// the opposite endpoint is returned. Duplicates are removed, order follows
    /// the link list.
    pub fn neighbors_of(&self, id: &LocationId) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = Vec::new();

        for link in &self.links {
            let Some(other) = link.other_end(id) else {
                continue;
            };
            if other == id || neighbors.iter().any(|n| &n.id == other) {
                continue;
            }
            neighbors.push(Neighbor {
                id: other.clone(),
                name: self.location_name(other),
                via: link.via.clone(),
            });
        }

        neighbors
    }

    /// NPCs whose recorded location equals `id` exactly.
    pub fn npcs_at(&self, id: &LocationId) -> Vec<&Npc> {
        self.npcs.values().filter(|npc| npc.is_at(id)).collect()
    }

    /// Quests still in progress.
    pub fn active_quests(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter().filter(|q| q.is_active())
    }

    /// Whether the party is currently outdoors (unknown location counts as indoors).
    pub fn is_outdoors(&self) -> bool {
        self.current_location().map(|l| l.outdoors).unwrap_or(false)
    }
}
