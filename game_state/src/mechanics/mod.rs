//! Rule constants and condition definitions referenced by prompts and validation.

use serde::{Deserialize, Serialize};

/// Lowest legal ability score.
pub const ABILITY_SCORE_MIN: i64 = 1;

/// Highest legal ability score.
pub const ABILITY_SCORE_MAX: i64 = 30;

/// Legal armor class range.
pub const ARMOR_CLASS_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

/// Die sizes that exist in the rules.
pub const VALID_DIE_SIZES: [u32; 7] = [4, 6, 8, 10, 12, 20, 100];

/// Most dice a single roll expression may name.
pub const MAX_DICE_PER_ROLL: u32 = 100;

/// Playable class names, lowercase.
pub const CHARACTER_CLASSES: [&str; 13] = [
    "artificer",
    "barbarian",
    "bard",
    "cleric",
    "druid",
    "fighter",
    "monk",
    "paladin",
    "ranger",
    "rogue",
    "sorcerer",
    "warlock",
    "wizard",
];

/// Whether a die with this many faces exists.
pub fn is_valid_die(sides: u32) -> bool {
    VALID_DIE_SIZES.contains(&sides)
}

/// Whether the name is a playable class (case-insensitive).
pub fn is_character_class(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    CHARACTER_CLASSES.contains(&lower.as_str())
}

/// Conditions that can affect a creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Blinded,
    Charmed,
    Deafened,
    Exhaustion,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Blinded => "Blinded",
            Condition::Charmed => "Charmed",
            Condition::Deafened => "Deafened",
            Condition::Exhaustion => "Exhaustion",
            Condition::Frightened => "Frightened",
            Condition::Grappled => "Grappled",
            Condition::Incapacitated => "Incapacitated",
            Condition::Invisible => "Invisible",
            Condition::Paralyzed => "Paralyzed",
            Condition::Petrified => "Petrified",
            Condition::Poisoned => "Poisoned",
            Condition::Prone => "Prone",
            Condition::Restrained => "Restrained",
            Condition::Stunned => "Stunned",
            Condition::Unconscious => "Unconscious",
        }
    }

    /// Short mechanical reminder of what the condition does.
    pub fn effect(&self) -> &'static str {
        match self {
            Condition::Blinded => "can't see; attacks against it have advantage, its attacks have disadvantage",
            Condition::Charmed => "can't attack the charmer; the charmer has advantage on social checks",
            Condition::Deafened => "can't hear; fails checks that require hearing",
            Condition::Exhaustion => "cumulative penalties to checks, speed and hit points",
            Condition::Frightened => "disadvantage while the source is in sight; can't move closer to it",
            Condition::Grappled => "speed becomes 0",
            Condition::Incapacitated => "can't take actions or reactions",
            Condition::Invisible => "can't be seen; its attacks have advantage, attacks against it have disadvantage",
            Condition::Paralyzed => "incapacitated, can't move or speak; hits within 5 feet are critical",
            Condition::Petrified => "turned to stone; incapacitated and resistant to all damage",
            Condition::Poisoned => "disadvantage on attack rolls and ability checks",
            Condition::Prone => "melee attacks against it have advantage; standing costs half movement",
            Condition::Restrained => "speed 0; attacks against it have advantage, its attacks have disadvantage",
            Condition::Stunned => "incapacitated, can't move; fails Strength and Dexterity saves",
            Condition::Unconscious => "incapacitated and prone; hits within 5 feet are critical",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
