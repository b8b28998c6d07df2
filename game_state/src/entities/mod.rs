//! Entity definitions for the snapshot: the player character and NPCs.

mod character;
mod components;

pub use character::*;
pub use components::*;

use serde::{Deserialize, Serialize};

/// Identifier for any actor in the game (player, NPC, creature).
///
/// Ids are assigned by the game engine and are opaque strings such as `"npc-barkeep"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the table an actor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClass {
    Player,
    Npc,
    Enemy,
}

impl ActorClass {
    /// Lowercase label used in prompts and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            ActorClass::Player => "player",
            ActorClass::Npc => "npc",
            ActorClass::Enemy => "enemy",
        }
    }
}

impl std::fmt::Display for ActorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::from("npc-barkeep");
        assert_eq!(id.to_string(), "npc-barkeep");
        assert_eq!(id.as_str(), "npc-barkeep");
    }

    #[test]
    fn test_actor_class_serde() {
        let json = serde_json::to_string(&ActorClass::Enemy).unwrap();
        assert_eq!(json, "\"enemy\"");
        let parsed: ActorClass = serde_json::from_str("\"npc\"").unwrap();
        assert_eq!(parsed, ActorClass::Npc);
    }
}
