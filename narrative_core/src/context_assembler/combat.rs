//! Combat context: the state of the fight and how it got here.

use game_state::{ActorClass, CombatSnapshot, Combatant, Condition, GameStateSnapshot};

use super::{focus_section, AssembledContext, ContextAssembler, ContextSection, MissingContext};
use crate::config::CombatContextConfig;
use crate::history::CombatHistory;

/// Placeholder when no action has been recorded yet.
pub const COMBAT_JUST_STARTED: &str = "Combat just started. No actions have been taken yet.";

/// Builds combat context. Section order:
/// Combat Status, Combatants, Positioning, Active Conditions, Battlefield,
/// Earlier Rounds, Recent Actions, Tactical Suggestions, Current Action.
#[derive(Debug, Clone, Default)]
pub struct CombatContextAssembler {
    config: CombatContextConfig,
}

fn is_hostile_to(a: ActorClass, b: ActorClass) -> bool {
    (a == ActorClass::Enemy) != (b == ActorClass::Enemy)
}

impl CombatContextAssembler {
    pub fn new(config: CombatContextConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CombatContextConfig::default())
    }

    pub fn config(&self) -> &CombatContextConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: CombatContextConfig) {
        self.config = config;
    }

    fn status_section(&self, combat: &CombatSnapshot, history: &CombatHistory) -> ContextSection {
        let mut section = ContextSection::mandatory("Combat Status");
        if let Some(encounter) = history.encounter() {
            section.push(format!("Encounter: {encounter}"));
        }
        section.push(format!("Round {}", combat.round.max(1)));
        if let Some(active) = combat.active_combatant() {
            section.push(format!("Acting now: {} ({})", active.name, active.class));
        }
        section
    }

    fn combatants_section(&self, combat: &CombatSnapshot) -> ContextSection {
        let mut section = ContextSection::mandatory("Combatants");
        for c in &combat.combatants {
            let hp = &c.hit_points;
            let mut line = format!("- {} ({}): HP {}/{}", c.name, c.class, hp.current.max(0), hp.max);
            if let Some(ac) = c.armor_class {
                line.push_str(&format!(", AC {ac}"));
            }
            line.push_str(&format!(" [{}]", hp.status()));
            section.push(line);
        }
        section
    }

    fn positioning_section(&self, combat: &CombatSnapshot) -> ContextSection {
        let mut section = ContextSection::new("Positioning", 4);
        for c in &combat.combatants {
            let Some(pos) = c.position else {
                continue;
            };
            let mut line = format!("- {} at ({}, {})", c.name, pos.x, pos.y);

            let nearest = combat
                .standing()
                .filter(|other| is_hostile_to(c.class, other.class))
                .filter_map(|other| other.position.map(|p| (other, pos.distance_feet(&p))))
                .min_by_key(|(_, dist)| *dist);
            if let Some((other, dist)) = nearest {
                line.push_str(&format!("; nearest foe {} at {dist} ft", other.name));
            }
            section.push(line);
        }
        section
    }

    fn conditions_section(&self, combat: &CombatSnapshot) -> ContextSection {
        let mut section = ContextSection::new("Active Conditions", 5);
        for c in &combat.combatants {
            for active in &c.conditions {
                let mut line = format!(
                    "- {}: {} ({})",
                    c.name,
                    active.condition.name(),
                    active.condition.effect()
                );
                if let Some(rounds) = active.remaining_rounds {
                    line.push_str(&format!(" [{rounds} rounds left]"));
                }
                section.push(line);
            }
        }
        section
    }

    fn battlefield_section(&self, combat: &CombatSnapshot) -> ContextSection {
        let mut section = ContextSection::new("Battlefield", 2);
        if let Some(terrain) = &combat.terrain {
            section.push(format!("Terrain: {terrain}"));
        }
        if let Some(lighting) = &combat.lighting {
            section.push(format!("Lighting: {lighting}"));
        }
        section
    }

    fn summary_section(&self, history: &CombatHistory) -> ContextSection {
        ContextSection {
            lines: history.summary().describe(),
            ..ContextSection::new("Earlier Rounds", 6)
        }
    }

    fn actions_section(&self, history: &CombatHistory) -> ContextSection {
        let mut section = ContextSection::mandatory("Recent Actions").trimmable();
        if history.is_fresh() {
            section.push(COMBAT_JUST_STARTED);
            return section;
        }
        for round in history.rounds() {
            for action in &round.actions {
                section.push(format!("R{}: {}", round.round, action.describe()));
            }
        }
        section
    }

    fn tactics_section(&self, combat: &CombatSnapshot) -> ContextSection {
        let mut section = ContextSection::new("Tactical Suggestions", 1);
        let Some(active) = combat.active_combatant() else {
            return section;
        };

        if active.hit_points.percent() <= 25 && !active.is_down() {
            section.push(format!("- {} is badly hurt; retreat or healing is sensible", active.name));
        }

        let foes: Vec<&Combatant> = combat
            .standing()
            .filter(|c| is_hostile_to(active.class, c.class))
            .collect();
        for foe in &foes {
            if foe.conditions.iter().any(|c| c.condition == Condition::Prone) {
                section.push(format!("- {} is prone: melee attacks have advantage", foe.name));
            }
            if foe.hit_points.percent() <= 25 {
                section.push(format!("- {} is nearly down", foe.name));
            }
        }
        if foes.len() >= 3 {
            section.push(format!("- Outnumbered by {} foes; area effects or a chokepoint help", foes.len()));
        }
        section
    }
}

impl ContextAssembler for CombatContextAssembler {
    type History = CombatHistory;

    fn assemble(
        &self,
        snapshot: Option<&GameStateSnapshot>,
        history: &CombatHistory,
        focus: Option<&str>,
    ) -> Result<AssembledContext, MissingContext> {
        let snapshot = snapshot.ok_or(MissingContext::NoSnapshot)?;
        let combat = snapshot.combat.as_ref().ok_or(MissingContext::NoCombat)?;
        let config = &self.config;
        let mut context = AssembledContext::new();

        context.push(self.status_section(combat, history));
        context.push(self.combatants_section(combat));
        context.push_if(config.include_positioning, || Some(self.positioning_section(combat)));
        context.push_if(config.include_condition_effects, || Some(self.conditions_section(combat)));
        context.push_if(config.include_environmental_details, || Some(self.battlefield_section(combat)));
        context.push(self.summary_section(history));
        context.push(self.actions_section(history));
        context.push_if(config.include_tactical_suggestions, || Some(self.tactics_section(combat)));
        context.push_if(true, || focus_section(focus));

        if let Some(budget) = config.token_budget {
            context.fit_to_budget(budget);
        }
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ActionTarget, ActionType, CombatActionRecord, HistoryStore};
    use game_state::ActiveCondition;

    fn snapshot() -> GameStateSnapshot {
        let combat = CombatSnapshot {
            round: 2,
            active_index: 0,
            combatants: vec![
                Combatant::new("pc-1", "Aria", ActorClass::Player)
                    .with_hit_points(4, 18)
                    .with_position(0, 0),
                Combatant::new("gob-1", "Goblin", ActorClass::Enemy)
                    .with_hit_points(1, 7)
                    .with_position(2, 1)
                    .with_condition(ActiveCondition::new(Condition::Prone).with_duration(1)),
                Combatant::new("gob-2", "Goblin Archer", ActorClass::Enemy)
                    .with_hit_points(7, 7)
                    .with_position(6, 0),
            ],
            terrain: Some("rubble-strewn crypt".to_string()),
            lighting: None,
        };
        GameStateSnapshot::new().with_combat(combat)
    }

    #[test]
    fn test_combat_just_started() {
        let text = CombatContextAssembler::with_defaults().build_context(
            Some(&snapshot()),
            &CombatHistory::new(3),
            None,
        );
        assert!(text.contains(COMBAT_JUST_STARTED));
        assert!(!text.contains("## Earlier Rounds"));
    }

    #[test]
    fn test_sections_and_content() {
        let mut history = CombatHistory::new(3);
        history.start_combat(Some("Crypt ambush".to_string()));
        history.add_action(
            CombatActionRecord::new(1, 1, "Aria", ActorClass::Player, ActionType::Spell)
                .with_target(ActionTarget::new("Goblin", ActorClass::Enemy).with_damage(6))
                .with_result("Magic missile strikes true"),
        );

        let context = CombatContextAssembler::with_defaults()
            .assemble(Some(&snapshot()), &history, Some("cast shield"))
            .unwrap();

        assert_eq!(
            context.titles(),
            vec![
                "Combat Status",
                "Combatants",
                "Positioning",
                "Active Conditions",
                "Battlefield",
                "Recent Actions",
                "Tactical Suggestions",
                "Current Action"
            ]
        );

        let text = context.to_prompt_string();
        assert!(text.contains("Encounter: Crypt ambush\nRound 2\nActing now: Aria (player)"));
        assert!(text.contains("- Goblin (enemy): HP 1/7 [critically wounded]"));
        assert!(text.contains("- Aria at (0, 0); nearest foe Goblin at 10 ft"));
        assert!(text.contains("- Goblin: Prone (") && text.contains("[1 rounds left]"));
        assert!(text.contains("Terrain: rubble-strewn crypt"));
        assert!(text.contains("R1: Aria (player) spell -> Goblin: Magic missile strikes true"));
        assert!(text.contains("- Aria is badly hurt"));
        assert!(text.contains("- Goblin is prone: melee attacks have advantage"));
        assert!(text.contains("- Goblin is nearly down"));
    }

    #[test]
    fn test_long_combat_surfaces_summary() {
        let mut history = CombatHistory::new(1);
        for round in 1..=3 {
            history.add_action(
                CombatActionRecord::new(round, 1, "Goblin", ActorClass::Enemy, ActionType::Attack)
                    .with_target(ActionTarget::new("Aria", ActorClass::Player).with_damage(2))
                    .with_result("a critical stab"),
            );
        }

        let context = CombatContextAssembler::new(CombatContextConfig::minimal())
            .assemble(Some(&snapshot()), &history, None)
            .unwrap();

        assert_eq!(
            context.titles(),
            vec!["Combat Status", "Combatants", "Earlier Rounds", "Recent Actions"]
        );
        let earlier = context.section("Earlier Rounds").unwrap();
        assert_eq!(earlier.lines[0], "Rounds 1-2: 2 actions across 2 rounds");
        assert!(earlier.lines.contains(&"Damage received: player 4".to_string()));
        assert!(earlier.lines.contains(&"Critical hits: 2".to_string()));
    }

    #[test]
    fn test_far_apart_positions() {
        let combat = CombatSnapshot {
            round: 1,
            combatants: vec![
                Combatant::new("pc-1", "Aria", ActorClass::Player).with_position(i32::MAX, 0),
                Combatant::new("gob-1", "Goblin", ActorClass::Enemy).with_position(-1, 0),
            ],
            ..Default::default()
        };
        let text = CombatContextAssembler::with_defaults().build_context(
            Some(&GameStateSnapshot::new().with_combat(combat)),
            &CombatHistory::new(3),
            None,
        );

        assert!(text.contains(&format!("- Aria at ({}, 0); nearest foe Goblin at {} ft", i32::MAX, u32::MAX)));
    }

    #[test]
    fn test_token_budget_keeps_latest_action() {
        let mut history = CombatHistory::new(3);
        for round in 1..=3 {
            for (turn, actor) in [(1, "Aria"), (2, "Goblin")] {
                let class = if actor == "Aria" { ActorClass::Player } else { ActorClass::Enemy };
                history.add_action(
                    CombatActionRecord::new(round, turn, actor, class, ActionType::Attack)
                        .with_result(format!("swings in round {round}")),
                );
            }
        }
        let config = CombatContextConfig {
            token_budget: Some(40),
            ..Default::default()
        };

        let context = CombatContextAssembler::new(config)
            .assemble(Some(&snapshot()), &history, Some("attack the archer"))
            .unwrap();

        assert_eq!(
            context.titles(),
            vec!["Combat Status", "Combatants", "Recent Actions", "Current Action"]
        );
        let actions = context.section("Recent Actions").unwrap();
        assert_eq!(actions.lines, vec!["R3: Goblin (enemy) attack: swings in round 3"]);
    }

    #[test]
    fn test_no_combat_in_snapshot() {
        let text = CombatContextAssembler::with_defaults().build_context(
            Some(&GameStateSnapshot::new()),
            &CombatHistory::new(3),
            None,
        );
        assert_eq!(text, "Insufficient information: no combat in progress.");
    }

    #[test]
    fn test_hostility() {
        assert!(is_hostile_to(ActorClass::Player, ActorClass::Enemy));
        assert!(is_hostile_to(ActorClass::Enemy, ActorClass::Npc));
        assert!(!is_hostile_to(ActorClass::Player, ActorClass::Npc));
        assert!(!is_hostile_to(ActorClass::Enemy, ActorClass::Enemy));
    }
}
