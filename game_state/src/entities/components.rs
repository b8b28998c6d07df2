//! Component definitions shared by characters and combatants.

use serde::{Deserialize, Serialize};

use crate::mechanics::Condition;

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// Ability types for modifier calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub const ALL: [Ability; 6] = [
        Ability::Strength,
        Ability::Dexterity,
        Ability::Constitution,
        Ability::Intelligence,
        Ability::Wisdom,
        Ability::Charisma,
    ];

    /// Three-letter abbreviation, e.g. `STR`.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Modifier for a given ability: floor((score - 10) / 2).
    pub fn modifier(&self, ability: Ability) -> i32 {
        self.score(ability).saturating_sub(10).div_euclid(2)
    }

    /// Compact one-line rendering, e.g. `STR 16 (+3), DEX 12 (+1), ...`.
    pub fn summary(&self) -> String {
        Ability::ALL
            .iter()
            .map(|a| {
                let m = self.modifier(*a);
                format!("{} {} ({}{})", a.abbreviation(), self.score(*a), if m >= 0 { "+" } else { "" }, m)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Current and maximum hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
}

impl HitPoints {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    /// Percentage of maximum HP remaining, 100 when max is not positive.
    pub fn percent(&self) -> u32 {
        if self.max > 0 {
            (self.current.max(0) as f32 / self.max as f32 * 100.0) as u32
        } else {
            100
        }
    }

    /// Coarse wound description used in prompts.
    pub fn status(&self) -> &'static str {
        match self.percent() {
            0 => "down",
            1..=25 => "critically wounded",
            26..=50 => "bloodied",
            51..=99 => "lightly wounded",
            _ => "unhurt",
        }
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

/// A condition currently affecting an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub condition: Condition,
    /// None = lasts until removed.
    #[serde(default)]
    pub remaining_rounds: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
}

impl ActiveCondition {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            remaining_rounds: None,
            source: None,
        }
    }

    pub fn with_duration(mut self, rounds: u32) -> Self {
        self.remaining_rounds = Some(rounds);
        self
    }
}
