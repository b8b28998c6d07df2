//! Typed configuration for every domain of the narrative core.
//!
//! Each domain has a config struct with documented defaults and an overrides
//! struct of optional fields. `with_defaults` merges the two; it is the only
//! place defaults are applied. `CoreConfig` bundles all domains and can be
//! loaded from TOML:
//!
//! ```toml
//! [narrative]
//! max_history_items = 8
//!
//! [location]
//! max_location_history = 3
//! include_weather = false
//!
//! [combat]
//! max_rounds_to_track = 2
//!
//! [validation]
//! strictness = "high"
//! max_critical_issues = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::StrictnessLevel;

/// Retention and section toggles for the general narrative context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeContextConfig {
    /// Exchanges kept in history before the oldest is evicted.
    pub max_history_items: usize,
    pub include_character_details: bool,
    pub include_location_details: bool,
    pub include_weather: bool,
    pub include_time_of_day: bool,
    pub include_npc_details: bool,
    pub include_active_quests: bool,
    pub include_recent_combats: bool,
    /// Approximate token ceiling for the assembled context.
    pub token_budget: Option<usize>,
}

impl Default for NarrativeContextConfig {
    fn default() -> Self {
        Self {
            max_history_items: 10,
            include_character_details: true,
            include_location_details: true,
            include_weather: true,
            include_time_of_day: true,
            include_npc_details: true,
            include_active_quests: true,
            include_recent_combats: true,
            token_budget: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrativeContextOverrides {
    pub max_history_items: Option<usize>,
    pub include_character_details: Option<bool>,
    pub include_location_details: Option<bool>,
    pub include_weather: Option<bool>,
    pub include_time_of_day: Option<bool>,
    pub include_npc_details: Option<bool>,
    pub include_active_quests: Option<bool>,
    pub include_recent_combats: Option<bool>,
    pub token_budget: Option<usize>,
}

impl NarrativeContextConfig {
    pub fn with_defaults(overrides: NarrativeContextOverrides) -> Self {
        let d = Self::default();
        Self {
            max_history_items: overrides.max_history_items.unwrap_or(d.max_history_items),
            include_character_details: overrides
                .include_character_details
                .unwrap_or(d.include_character_details),
            include_location_details: overrides
                .include_location_details
                .unwrap_or(d.include_location_details),
            include_weather: overrides.include_weather.unwrap_or(d.include_weather),
            include_time_of_day: overrides.include_time_of_day.unwrap_or(d.include_time_of_day),
            include_npc_details: overrides.include_npc_details.unwrap_or(d.include_npc_details),
            include_active_quests: overrides
                .include_active_quests
                .unwrap_or(d.include_active_quests),
            include_recent_combats: overrides
                .include_recent_combats
                .unwrap_or(d.include_recent_combats),
            token_budget: overrides.token_budget.or(d.token_budget),
        }
    }

    /// Every optional section switched off.
    pub fn minimal() -> Self {
        Self {
            include_character_details: false,
            include_location_details: false,
            include_weather: false,
            include_time_of_day: false,
            include_npc_details: false,
            include_active_quests: false,
            include_recent_combats: false,
            ..Self::default()
        }
    }
}

/// Retention and section toggles for location descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationContextConfig {
    /// Visits remembered per location.
    pub max_location_history: usize,
    pub include_environmental_details: bool,
    pub include_weather: bool,
    pub include_time_of_day: bool,
    pub include_nearby_locations: bool,
    pub include_npc_details: bool,
    pub token_budget: Option<usize>,
}

impl Default for LocationContextConfig {
    fn default() -> Self {
        Self {
            max_location_history: 5,
            include_environmental_details: true,
            include_weather: true,
            include_time_of_day: true,
            include_nearby_locations: true,
            include_npc_details: true,
            token_budget: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LocationContextOverrides {
    pub max_location_history: Option<usize>,
    pub include_environmental_details: Option<bool>,
    pub include_weather: Option<bool>,
    pub include_time_of_day: Option<bool>,
    pub include_nearby_locations: Option<bool>,
    pub include_npc_details: Option<bool>,
    pub token_budget: Option<usize>,
}

impl LocationContextConfig {
    pub fn with_defaults(overrides: LocationContextOverrides) -> Self {
        let d = Self::default();
        Self {
            max_location_history: overrides
                .max_location_history
                .unwrap_or(d.max_location_history),
            include_environmental_details: overrides
                .include_environmental_details
                .unwrap_or(d.include_environmental_details),
            include_weather: overrides.include_weather.unwrap_or(d.include_weather),
            include_time_of_day: overrides.include_time_of_day.unwrap_or(d.include_time_of_day),
            include_nearby_locations: overrides
                .include_nearby_locations
                .unwrap_or(d.include_nearby_locations),
            include_npc_details: overrides.include_npc_details.unwrap_or(d.include_npc_details),
            token_budget: overrides.token_budget.or(d.token_budget),
        }
    }

    pub fn minimal() -> Self {
        Self {
            include_environmental_details: false,
            include_weather: false,
            include_time_of_day: false,
            include_nearby_locations: false,
            include_npc_details: false,
            ..Self::default()
        }
    }
}

/// Retention and section toggles for combat narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatContextConfig {
    /// Whole rounds kept in detail; older rounds fold into the rolling summary.
    pub max_rounds_to_track: usize,
    pub include_positioning: bool,
    pub include_condition_effects: bool,
    pub include_environmental_details: bool,
    pub include_tactical_suggestions: bool,
    pub token_budget: Option<usize>,
}

impl Default for CombatContextConfig {
    fn default() -> Self {
        Self {
            max_rounds_to_track: 3,
            include_positioning: true,
            include_condition_effects: true,
            include_environmental_details: true,
            include_tactical_suggestions: true,
            token_budget: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombatContextOverrides {
    pub max_rounds_to_track: Option<usize>,
    pub include_positioning: Option<bool>,
    pub include_condition_effects: Option<bool>,
    pub include_environmental_details: Option<bool>,
    pub include_tactical_suggestions: Option<bool>,
    pub token_budget: Option<usize>,
}

impl CombatContextConfig {
    pub fn with_defaults(overrides: CombatContextOverrides) -> Self {
        let d = Self::default();
        Self {
            max_rounds_to_track: overrides.max_rounds_to_track.unwrap_or(d.max_rounds_to_track),
            include_positioning: overrides.include_positioning.unwrap_or(d.include_positioning),
            include_condition_effects: overrides
                .include_condition_effects
                .unwrap_or(d.include_condition_effects),
            include_environmental_details: overrides
                .include_environmental_details
                .unwrap_or(d.include_environmental_details),
            include_tactical_suggestions: overrides
                .include_tactical_suggestions
                .unwrap_or(d.include_tactical_suggestions),
            token_budget: overrides.token_budget.or(d.token_budget),
        }
    }

    pub fn minimal() -> Self {
        Self {
            include_positioning: false,
            include_condition_effects: false,
            include_environmental_details: false,
            include_tactical_suggestions: false,
            ..Self::default()
        }
    }
}

/// Knobs for the validation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub strictness: StrictnessLevel,
    /// Explicit pass mark; when unset the strictness level decides.
    pub min_validation_score: Option<u8>,
    /// Non-info issues tolerated before the response fails outright.
    pub max_issues: usize,
    /// Critical issues tolerated before the response fails outright.
    pub max_critical_issues: usize,
    pub check_world_consistency: bool,
    pub check_character_consistency: bool,
    pub check_rule_accuracy: bool,
    pub check_narrative_quality: bool,
    pub check_tone: bool,
    /// Responses shorter than this are flagged as too short.
    pub min_response_words: usize,
    /// Responses longer than this are flagged as rambling.
    pub max_response_words: usize,
    /// Word-count band that earns the length bonus.
    pub target_min_words: usize,
    pub target_max_words: usize,
    pub length_bonus: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            strictness: StrictnessLevel::Medium,
            min_validation_score: None,
            max_issues: 10,
            max_critical_issues: 0,
            check_world_consistency: true,
            check_character_consistency: true,
            check_rule_accuracy: true,
            check_narrative_quality: true,
            check_tone: true,
            min_response_words: 10,
            max_response_words: 800,
            target_min_words: 50,
            target_max_words: 400,
            length_bonus: 5.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationOverrides {
    pub strictness: Option<StrictnessLevel>,
    pub min_validation_score: Option<u8>,
    pub max_issues: Option<usize>,
    pub max_critical_issues: Option<usize>,
    pub check_world_consistency: Option<bool>,
    pub check_character_consistency: Option<bool>,
    pub check_rule_accuracy: Option<bool>,
    pub check_narrative_quality: Option<bool>,
    pub check_tone: Option<bool>,
    pub min_response_words: Option<usize>,
    pub max_response_words: Option<usize>,
    pub target_min_words: Option<usize>,
    pub target_max_words: Option<usize>,
    pub length_bonus: Option<f64>,
}

impl ValidationConfig {
    pub fn with_defaults(overrides: ValidationOverrides) -> Self {
        let d = Self::default();
        Self {
            strictness: overrides.strictness.unwrap_or(d.strictness),
            min_validation_score: overrides.min_validation_score.or(d.min_validation_score),
            max_issues: overrides.max_issues.unwrap_or(d.max_issues),
            max_critical_issues: overrides.max_critical_issues.unwrap_or(d.max_critical_issues),
            check_world_consistency: overrides
                .check_world_consistency
                .unwrap_or(d.check_world_consistency),
            check_character_consistency: overrides
                .check_character_consistency
                .unwrap_or(d.check_character_consistency),
            check_rule_accuracy: overrides.check_rule_accuracy.unwrap_or(d.check_rule_accuracy),
            check_narrative_quality: overrides
                .check_narrative_quality
                .unwrap_or(d.check_narrative_quality),
            check_tone: overrides.check_tone.unwrap_or(d.check_tone),
            min_response_words: overrides.min_response_words.unwrap_or(d.min_response_words),
            max_response_words: overrides.max_response_words.unwrap_or(d.max_response_words),
            target_min_words: overrides.target_min_words.unwrap_or(d.target_min_words),
            target_max_words: overrides.target_max_words.unwrap_or(d.target_max_words),
            length_bonus: overrides.length_bonus.unwrap_or(d.length_bonus),
        }
    }

    /// Pass mark: the explicit override, or the strictness level's threshold.
    pub fn min_score(&self) -> u8 {
        self.min_validation_score
            .unwrap_or_else(|| self.strictness.min_score())
    }
}

/// Configuration for every domain of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    pub narrative: NarrativeContextConfig,
    pub location: LocationContextConfig,
    pub combat: CombatContextConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CoreConfigFile {
    narrative: NarrativeContextOverrides,
    location: LocationContextOverrides,
    combat: CombatContextOverrides,
    validation: ValidationOverrides,
}

impl CoreConfig {
    /// Parse a TOML document, fill in defaults and check the result.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: CoreConfigFile = toml::from_str(source)?;
        let config = Self {
            narrative: NarrativeContextConfig::with_defaults(file.narrative),
            location: LocationContextConfig::with_defaults(file.location),
            combat: CombatContextConfig::with_defaults(file.combat),
            validation: ValidationConfig::with_defaults(file.validation),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check values that the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.narrative.max_history_items == 0 {
            return Err(ConfigError::invalid("narrative.max_history_items", "must be at least 1"));
        }
        if self.location.max_location_history == 0 {
            return Err(ConfigError::invalid(
                "location.max_location_history",
                "must be at least 1",
            ));
        }
        if self.combat.max_rounds_to_track == 0 {
            return Err(ConfigError::invalid("combat.max_rounds_to_track", "must be at least 1"));
        }
        for (field, budget) in [
            ("narrative.token_budget", self.narrative.token_budget),
            ("location.token_budget", self.location.token_budget),
            ("combat.token_budget", self.combat.token_budget),
        ] {
            if budget == Some(0) {
                return Err(ConfigError::invalid(field, "must be at least 1 when set"));
            }
        }

        let v = &self.validation;
        if let Some(score) = v.min_validation_score {
            if score > 100 {
                return Err(ConfigError::invalid(
                    "validation.min_validation_score",
                    format!("{score} is above 100"),
                ));
            }
        }
        if v.target_min_words > v.target_max_words {
            return Err(ConfigError::invalid(
                "validation.target_min_words",
                format!("{} exceeds target_max_words {}", v.target_min_words, v.target_max_words),
            ));
        }
        if v.min_response_words > v.max_response_words {
            return Err(ConfigError::invalid(
                "validation.min_response_words",
                format!("{} exceeds max_response_words {}", v.min_response_words, v.max_response_words),
            ));
        }
        if !v.length_bonus.is_finite() || v.length_bonus < 0.0 {
            return Err(ConfigError::invalid("validation.length_bonus", "must be a non-negative number"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_keeps_unset_fields() {
        let config = NarrativeContextConfig::with_defaults(NarrativeContextOverrides {
            max_history_items: Some(4),
            include_weather: Some(false),
            ..Default::default()
        });

        assert_eq!(config.max_history_items, 4);
        assert!(!config.include_weather);
        assert!(config.include_character_details);
        assert_eq!(config.token_budget, None);
    }

    #[test]
    fn test_min_score_follows_strictness() {
        let mut config = ValidationConfig::default();
        assert_eq!(config.min_score(), 70);

        config.strictness = StrictnessLevel::High;
        assert_eq!(config.min_score(), 85);

        config.min_validation_score = Some(60);
        assert_eq!(config.min_score(), 60);
    }

    #[test]
    fn test_from_toml_str() {
        let config = CoreConfig::from_toml_str(
            r#"
            [location]
            max_location_history = 3
            include_weather = false

            [validation]
            strictness = "high"
            max_critical_issues = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.location.max_location_history, 3);
        assert!(!config.location.include_weather);
        assert_eq!(config.validation.strictness, StrictnessLevel::High);
        assert_eq!(config.validation.max_critical_issues, 1);
        assert_eq!(config.narrative, NarrativeContextConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(CoreConfig::from_toml_str("").unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CoreConfig::from_toml_str("[combat]\nmax_rounds = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let err = CoreConfig::from_toml_str("[combat]\nmax_rounds_to_track = 0\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field, .. } if field == "combat.max_rounds_to_track")
        );
    }

    #[test]
    fn test_bad_word_band_rejected() {
        let err = CoreConfig::from_toml_str(
            "[validation]\ntarget_min_words = 500\ntarget_max_words = 100\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = CoreConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
