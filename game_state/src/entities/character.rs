//! Character definitions.

use serde::{Deserialize, Serialize};

use super::{AbilityScores, ActiveCondition, EntityId, HitPoints};
use crate::keyed::Keyed;
use crate::world_state::LocationId;

/// The player character as seen by the narrative layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCharacter {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub race: Option<String>,
    /// Class name, e.g. "Wizard".
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub hit_points: HitPoints,
    #[serde(default)]
    pub armor_class: Option<i32>,
    #[serde(default)]
    pub abilities: AbilityScores,
    #[serde(default)]
    pub conditions: Vec<ActiveCondition>,
    #[serde(default)]
    pub background: Option<String>,
}

fn default_level() -> u32 {
    1
}

impl PlayerCharacter {
    /// Create a new level 1 character with the given id and name.
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            race: None,
            class: None,
            level: 1,
            hit_points: HitPoints::default(),
            armor_class: None,
            abilities: AbilityScores::default(),
            conditions: Vec::new(),
            background: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_race(mut self, race: impl Into<String>) -> Self {
        self.race = Some(race.into());
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_hit_points(mut self, current: i32, max: i32) -> Self {
        self.hit_points = HitPoints::new(current, max);
        self
    }

    /// e.g. "Level 3 Elf Wizard".
    pub fn headline(&self) -> String {
        let mut parts = vec![format!("Level {}", self.level)];
        if let Some(race) = &self.race {
            parts.push(race.clone());
        }
        if let Some(class) = &self.class {
            parts.push(class.clone());
        }
        parts.join(" ")
    }
}

/// Attitude of an NPC towards the party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Friendly,
    #[default]
    Neutral,
    Wary,
    Hostile,
}

/// A non-player character known to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Npc {
    pub id: EntityId,
    pub name: String,
    /// Where the NPC currently is. Compared by exact id equality.
    #[serde(default)]
    pub location_id: Option<LocationId>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub disposition: Disposition,
    #[serde(default = "default_alive")]
    pub alive: bool,
}

fn default_alive() -> bool {
    true
}

impl Npc {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location_id: None,
            role: None,
            description: None,
            disposition: Disposition::Neutral,
            alive: true,
        }
    }

    pub fn at(mut self, location: impl Into<LocationId>) -> Self {
        self.location_id = Some(location.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    pub fn deceased(mut self) -> Self {
        self.alive = false;
        self
    }

    /// Whether the NPC is at exactly this location.
    pub fn is_at(&self, location: &LocationId) -> bool {
        self.location_id.as_ref() == Some(location)
    }
}

impl Keyed for Npc {
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.id.clone()
    }
}
