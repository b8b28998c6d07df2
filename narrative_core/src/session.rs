//! Per-session container.
//!
//! A [`NarrativeSession`] owns one history store per domain plus the
//! assemblers and validator configured for it. Sessions share nothing, so two
//! games running side by side never see each other's history.

use game_state::GameStateSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::context_assembler::{
    CombatContextAssembler, ContextAssembler, LocationContextAssembler, NarrativeContextAssembler,
};
use crate::error::GenerationError;
use crate::generation::{GenerationOptions, TextGenerator, TokenUsage};
use crate::history::{
    CombatActionRecord, CombatHistory, CombatRecap, HistoryStore, LocationHistory, LocationVisit,
    NarrativeExchange, NarrativeHistory,
};
use crate::suggester::CorrectionSuggester;
use crate::validation::{ResponseKind, ValidationContext, ValidationResult, Validator};

/// Unique identifier for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything produced by one generate-and-validate turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub kind: ResponseKind,
    /// The assembled context the prompt was built from.
    pub context: String,
    pub text: String,
    pub usage: TokenUsage,
    pub validation: ValidationResult,
}

impl TurnOutcome {
    pub fn is_acceptable(&self) -> bool {
        self.validation.is_valid
    }
}

#[derive(Debug)]
pub struct NarrativeSession {
    id: SessionId,
    config: CoreConfig,
    narrative: NarrativeHistory,
    locations: LocationHistory,
    combat: CombatHistory,
    narrative_assembler: NarrativeContextAssembler,
    location_assembler: LocationContextAssembler,
    combat_assembler: CombatContextAssembler,
    validator: Validator,
    suggester: CorrectionSuggester,
    generation_options: GenerationOptions,
}

impl NarrativeSession {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            id: SessionId::new(),
            narrative: NarrativeHistory::new(config.narrative.max_history_items),
            locations: LocationHistory::new(config.location.max_location_history),
            combat: CombatHistory::new(config.combat.max_rounds_to_track),
            narrative_assembler: NarrativeContextAssembler::new(config.narrative.clone()),
            location_assembler: LocationContextAssembler::new(config.location.clone()),
            combat_assembler: CombatContextAssembler::new(config.combat.clone()),
            validator: Validator::with_default_checkers(config.validation.clone()),
            suggester: CorrectionSuggester::new(),
            generation_options: GenerationOptions::default(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CoreConfig::default())
    }

    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.generation_options = options;
        self
    }

    pub fn with_suggester(mut self, suggester: CorrectionSuggester) -> Self {
        self.suggester = suggester;
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Replace the configuration everywhere. Shrunk retention bounds evict at once.
    pub fn update_config(&mut self, config: CoreConfig) {
        self.narrative.set_max_items(config.narrative.max_history_items);
        self.locations.set_max_per_location(config.location.max_location_history);
        self.combat.set_max_rounds(config.combat.max_rounds_to_track);
        self.narrative_assembler.update_config(config.narrative.clone());
        self.location_assembler.update_config(config.location.clone());
        self.combat_assembler.update_config(config.combat.clone());
        self.validator.update_config(config.validation.clone());
        tracing::debug!(session = %self.id, "session config replaced");
        self.config = config;
    }

    pub fn narrative_history(&self) -> &NarrativeHistory {
        &self.narrative
    }

    pub fn location_history(&self) -> &LocationHistory {
        &self.locations
    }

    pub fn combat_history(&self) -> &CombatHistory {
        &self.combat
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn record_exchange(&mut self, exchange: NarrativeExchange) -> bool {
        self.narrative.record(exchange)
    }

    pub fn record_visit(&mut self, visit: LocationVisit) -> bool {
        self.locations.record(visit)
    }

    pub fn start_combat(&mut self, encounter: Option<String>) {
        self.combat.start_combat(encounter);
    }

    pub fn record_action(&mut self, action: CombatActionRecord) -> bool {
        self.combat.add_action(action)
    }

    pub fn end_combat(&mut self) -> CombatRecap {
        self.combat.end_combat()
    }

    /// Assemble the context for a kind of response.
    pub fn build_context(
        &self,
        kind: ResponseKind,
        snapshot: Option<&GameStateSnapshot>,
        focus: Option<&str>,
    ) -> String {
        match kind {
            ResponseKind::Narrative | ResponseKind::Dialogue => {
                self.narrative_assembler.build_context(snapshot, &self.narrative, focus)
            }
            ResponseKind::LocationDescription => {
                self.location_assembler.build_context(snapshot, &self.locations, focus)
            }
            ResponseKind::Combat => self.combat_assembler.build_context(snapshot, &self.combat, focus),
        }
    }

    /// Context followed by the player's input, ready for the generator.
    pub fn compose_prompt(&self, context: &str, player_input: &str) -> String {
        let mut prompt = context.trim_end().to_string();
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str("## Player Input\n");
        prompt.push_str(player_input.trim());
        prompt.push('\n');
        prompt
    }

    pub fn validate(
        &self,
        text: &str,
        snapshot: Option<&GameStateSnapshot>,
        context: &ValidationContext,
    ) -> ValidationResult {
        self.validator.validate(text, snapshot, context)
    }

    /// The response with a suggestion block for its issues.
    pub fn annotate(&self, text: &str, result: &ValidationResult) -> String {
        self.suggester.annotate(text, &result.issues)
    }

    /// Build the context, generate, and validate one response.
    ///
    /// Nothing is recorded: the caller decides whether to accept, regenerate or
    /// flag the text, and records the exchange once it is accepted.
    pub fn narrate<G: TextGenerator + ?Sized>(
        &self,
        generator: &G,
        kind: ResponseKind,
        snapshot: Option<&GameStateSnapshot>,
        player_input: &str,
    ) -> Result<TurnOutcome, GenerationError> {
        let context = self.build_context(kind, snapshot, Some(player_input));
        let prompt = self.compose_prompt(&context, player_input);

        let generation = generator.generate(&prompt, &self.generation_options)?;

        let validation_context = ValidationContext::new(kind).with_input(player_input);
        let validation = self.validate(&generation.text, snapshot, &validation_context);

        tracing::debug!(
            session = %self.id,
            kind = ?kind,
            prompt_tokens = generation.usage.prompt_tokens,
            completion_tokens = generation.usage.completion_tokens,
            score = validation.score,
            is_valid = validation.is_valid,
            "narrated turn"
        );

        Ok(TurnOutcome {
            kind,
            context,
            text: generation.text,
            usage: generation.usage,
            validation,
        })
    }
}

impl Default for NarrativeSession {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NarrativeContextConfig;
    use crate::context_assembler::COMBAT_JUST_STARTED;
    use crate::generation::Generation;
    use game_state::{CombatSnapshot, Location, Weather, WorldTime};
    use std::cell::RefCell;

    fn snapshot() -> GameStateSnapshot {
        GameStateSnapshot::new()
            .with_location(Location::new("tavern-1", "The Prancing Pony"))
            .at("tavern-1")
            .with_time(WorldTime::new(1, 20, 0))
            .with_weather(Weather::Rainy)
    }

    struct Scripted {
        reply: String,
        prompts: RefCell<Vec<String>>,
    }

    impl TextGenerator for Scripted {
        fn generate(&self, prompt: &str, _options: &GenerationOptions) -> Result<Generation, GenerationError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(Generation {
                text: self.reply.clone(),
                usage: TokenUsage {
                    prompt_tokens: 120,
                    completion_tokens: 40,
                },
            })
        }
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = NarrativeSession::with_defaults();
        let b = NarrativeSession::with_defaults();
        assert_ne!(a.id(), b.id());

        a.record_exchange(NarrativeExchange::new("hello", "Hi there."));
        assert_eq!(a.narrative_history().len(), 1);
        assert!(b.narrative_history().is_empty());
    }

    #[test]
    fn test_update_config_shrinks_history() {
        let mut session = NarrativeSession::with_defaults();
        for i in 0..6 {
            session.record_exchange(NarrativeExchange::new(format!("input {i}"), "ok"));
        }

        let mut config = CoreConfig::default();
        config.narrative = NarrativeContextConfig {
            max_history_items: 2,
            ..Default::default()
        };
        session.update_config(config);

        assert_eq!(session.narrative_history().len(), 2);
        assert_eq!(session.config().narrative.max_history_items, 2);
    }

    #[test]
    fn test_build_context_routes_by_kind() {
        let session = NarrativeSession::with_defaults();
        let snap = snapshot();

        let narrative = session.build_context(ResponseKind::Dialogue, Some(&snap), None);
        assert!(narrative.contains("No previous interactions."));

        let location = session.build_context(ResponseKind::LocationDescription, Some(&snap), None);
        assert!(location.contains("First visit."));

        let combat = session.build_context(ResponseKind::Combat, Some(&snap), None);
        assert_eq!(combat, "Insufficient information: no combat in progress.");

        let fighting = snapshot().with_combat(CombatSnapshot::default());
        let combat = session.build_context(ResponseKind::Combat, Some(&fighting), None);
        assert!(combat.contains(COMBAT_JUST_STARTED));
    }

    #[test]
    fn test_compose_prompt() {
        let session = NarrativeSession::with_defaults();
        assert_eq!(
            session.compose_prompt("## Location\nInn\n", "  open the door "),
            "## Location\nInn\n\n## Player Input\nopen the door\n"
        );
        assert_eq!(session.compose_prompt("", "wait"), "## Player Input\nwait\n");
    }

    #[test]
    fn test_narrate_generates_and_validates_without_recording() {
        let session = NarrativeSession::with_defaults();
        let generator = Scripted {
            reply: "As an AI, I cannot continue...".to_string(),
            prompts: RefCell::new(Vec::new()),
        };

        let outcome = session
            .narrate(&generator, ResponseKind::Narrative, Some(&snapshot()), "look around")
            .unwrap();

        let prompts = generator.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("## Current Action\nPlayer: look around"));
        assert!(prompts[0].ends_with("## Player Input\nlook around\n"));

        assert_eq!(outcome.usage.total(), 160);
        assert!(!outcome.is_acceptable());
        assert!(outcome.validation.issues.iter().any(|i| i.description.contains("abrupt")));
        assert!(session.narrative_history().is_empty());

        let annotated = session.annotate(&outcome.text, &outcome.validation);
        assert!(annotated.starts_with("As an AI, I cannot continue...\n\n## Suggested Corrections\n- [critical]"));
    }

    #[test]
    fn test_narrate_passes_generation_errors_through() {
        let session = NarrativeSession::with_defaults();
        let down = |_: &str, _: &GenerationOptions| -> Result<Generation, GenerationError> {
            Err(GenerationError::Unavailable("provider offline".to_string()))
        };
        let err = session
            .narrate(&down, ResponseKind::Narrative, None, "hello")
            .unwrap_err();
        assert_eq!(err.to_string(), "generator unavailable: provider offline");
    }
}
