//! Combat snapshot: who is fighting, where they stand and what ails them.

use serde::{Deserialize, Serialize};

use crate::entities::{ActiveCondition, ActorClass, EntityId, HitPoints};

/// Grid position in feet-based squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Grid distance in feet using 5-foot squares and diagonal-as-one movement.
    pub fn distance_feet(&self, other: &Position) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy).saturating_mul(5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: EntityId,
    pub name: String,
    pub class: ActorClass,
    #[serde(default)]
    pub hit_points: HitPoints,
    #[serde(default)]
    pub armor_class: Option<i32>,
    #[serde(default)]
    pub initiative: i32,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub conditions: Vec<ActiveCondition>,
}

impl Combatant {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, class: ActorClass) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class,
            hit_points: HitPoints::default(),
            armor_class: None,
            initiative: 0,
            position: None,
            conditions: Vec::new(),
        }
    }

    pub fn with_hit_points(mut self, current: i32, max: i32) -> Self {
        self.hit_points = HitPoints::new(current, max);
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn with_condition(mut self, condition: ActiveCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn is_down(&self) -> bool {
        self.hit_points.current <= 0
    }
}

/// Battlefield state for the current encounter.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CombatSnapshot {
    pub round: u32,
    /// Index into `combatants` of whoever is acting now.
    #[serde(default)]
    pub active_index: usize,
    /// In initiative order.
    #[serde(default)]
    pub combatants: Vec<Combatant>,
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
}

impl CombatSnapshot {
    pub fn active_combatant(&self) -> Option<&Combatant> {
        self.combatants.get(self.active_index)
    }

    pub fn combatants_of(&self, class: ActorClass) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(move |c| c.class == class)
    }

    pub fn standing(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| !c.is_down())
    }
}

/// How a past encounter ended, as reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterOutcome {
    pub name: String,
    pub victorious: bool,
    #[serde(default)]
    pub rounds: u32,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position::new(0, 0);
        assert_eq!(a.distance_feet(&Position::new(2, 1)), 10);
        assert_eq!(a.distance_feet(&Position::new(-3, 3)), 15);
    }

    #[test]
    fn test_distance_at_coordinate_extremes() {
        let far = Position::new(i32::MAX, 0);
        assert_eq!(far.distance_feet(&Position::new(-1, 0)), u32::MAX);
        assert_eq!(Position::new(i32::MIN, 0).distance_feet(&far), u32::MAX);
        assert_eq!(far.distance_feet(&far), 0);
    }

    #[test]
    fn test_active_combatant() {
        let snapshot = CombatSnapshot {
            round: 1,
            active_index: 1,
            combatants: vec![
                Combatant::new("pc-1", "Aria", ActorClass::Player),
                Combatant::new("gob-1", "Goblin", ActorClass::Enemy).with_hit_points(0, 7),
            ],
            ..Default::default()
        };

        assert_eq!(snapshot.active_combatant().map(|c| c.name.as_str()), Some("Goblin"));
        assert_eq!(snapshot.standing().count(), 1);
        assert_eq!(snapshot.combatants_of(ActorClass::Enemy).count(), 1);
    }
}
