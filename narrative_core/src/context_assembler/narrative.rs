//! General narrative context: who the player is, where they are, what is going on.

use game_state::{GameStateSnapshot, PlayerCharacter};

use super::{
    environment_lines, focus_section, npcs_section, AssembledContext, ContextAssembler,
    ContextSection, MissingContext,
};
use crate::config::NarrativeContextConfig;
use crate::history::{clip, NarrativeHistory};

/// Placeholder when the narrative history is empty.
pub const NO_PREVIOUS_INTERACTIONS: &str = "No previous interactions.";

const HISTORY_CLIP_CHARS: usize = 240;

/// Builds narrative context. Section order:
/// Character, Location, Environment, NPCs Present, Active Quests,
/// Recent Combats, Recent History, Current Action.
#[derive(Debug, Clone, Default)]
pub struct NarrativeContextAssembler {
    config: NarrativeContextConfig,
}

impl NarrativeContextAssembler {
    pub fn new(config: NarrativeContextConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(NarrativeContextConfig::default())
    }

    pub fn config(&self) -> &NarrativeContextConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: NarrativeContextConfig) {
        self.config = config;
    }

    fn character_section(&self, player: &PlayerCharacter) -> ContextSection {
        let mut section = ContextSection::new("Character", 6)
            .line(format!("{} - {}", player.name, player.headline()));

        let hp = &player.hit_points;
        let mut vitals = format!("HP {}/{} ({})", hp.current, hp.max, hp.status());
        if let Some(ac) = player.armor_class {
            vitals.push_str(&format!(", AC {ac}"));
        }
        section.push(vitals);
        section.push(format!("Abilities: {}", player.abilities.summary()));

        if !player.conditions.is_empty() {
            let names: Vec<_> = player.conditions.iter().map(|c| c.condition.name()).collect();
            section.push(format!("Conditions: {}", names.join(", ")));
        }
        if let Some(background) = &player.background {
            section.push(format!("Background: {background}"));
        }
        section
    }

    fn location_section(&self, snapshot: &GameStateSnapshot) -> Option<ContextSection> {
        let location = snapshot.current_location()?;
        let mut line = location.name.clone();
        if !location.description.trim().is_empty() {
            line.push_str(&format!(": {}", location.description.trim()));
        }
        Some(ContextSection::new("Location", 7).line(line))
    }

    fn quests_section(&self, snapshot: &GameStateSnapshot) -> Option<ContextSection> {
        let mut section = ContextSection::new("Active Quests", 4);
        for quest in snapshot.active_quests() {
            let open: Vec<_> = quest.open_objectives().map(|o| o.description.as_str()).collect();
            if open.is_empty() {
                section.push(format!("- {}", quest.title));
            } else {
                section.push(format!("- {}: {}", quest.title, open.join("; ")));
            }
        }
        Some(section)
    }

    fn combats_section(&self, snapshot: &GameStateSnapshot) -> Option<ContextSection> {
        let mut section = ContextSection::new("Recent Combats", 2);
        for encounter in &snapshot.recent_encounters {
            let outcome = if encounter.victorious { "victory" } else { "defeat" };
            let mut line = format!("- {}: {} after {} rounds", encounter.name, outcome, encounter.rounds);
            if !encounter.notes.is_empty() {
                line.push_str(&format!(" ({})", encounter.notes.join("; ")));
            }
            section.push(line);
        }
        Some(section)
    }

    fn history_section(&self, history: &NarrativeHistory) -> ContextSection {
        let mut section = ContextSection::mandatory("Recent History").trimmable();
        for exchange in history.all() {
            section.push(format!(
                "[#{}] Player: {} / Narrator: {}",
                exchange.sequence,
                clip(&exchange.player_input, HISTORY_CLIP_CHARS),
                clip(&exchange.response, HISTORY_CLIP_CHARS)
            ));
        }
        if section.lines.is_empty() {
            section.push(NO_PREVIOUS_INTERACTIONS);
        }
        section
    }
}

impl ContextAssembler for NarrativeContextAssembler {
    type History = NarrativeHistory;

    fn assemble(
        &self,
        snapshot: Option<&GameStateSnapshot>,
        history: &NarrativeHistory,
        focus: Option<&str>,
    ) -> Result<AssembledContext, MissingContext> {
        let snapshot = snapshot.ok_or(MissingContext::NoSnapshot)?;
        let config = &self.config;
        let mut context = AssembledContext::new();

        context.push_if(config.include_character_details, || {
            snapshot.player.as_ref().map(|p| self.character_section(p))
        });
        context.push_if(config.include_location_details, || self.location_section(snapshot));
        context.push_if(config.include_time_of_day || config.include_weather, || {
            let lines = environment_lines(snapshot, config.include_time_of_day, config.include_weather);
            Some(ContextSection {
                lines,
                ..ContextSection::new("Environment", 3)
            })
        });
        context.push_if(config.include_npc_details, || {
            snapshot
                .current_location
                .as_ref()
                .and_then(|loc| npcs_section(snapshot, loc))
        });
        context.push_if(config.include_active_quests, || self.quests_section(snapshot));
        context.push_if(config.include_recent_combats, || self.combats_section(snapshot));
        context.push(self.history_section(history));
        context.push_if(true, || focus_section(focus));

        if let Some(budget) = config.token_budget {
            context.fit_to_budget(budget);
        }
        Ok(context)
    }
}
