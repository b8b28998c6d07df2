//! Combat history - actions grouped by round, with a rolling summary of rounds
//! that fell out of the retention window.
//!
//! Rounds are evicted whole. Before a round is dropped it is folded into
//! [`CombatSummary`], so a long fight keeps its aggregate shape (damage by side,
//! conditions applied, critical hits) after the blow-by-blow is gone. Folding
//! touches only the evicted round, never the rest of the history.

use game_state::{ActorClass, WorldTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::HistoryStore;

/// What kind of thing an actor did on their turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Attack,
    Spell,
    Move,
    Dash,
    Dodge,
    Disengage,
    Help,
    Hide,
    Ready,
    UseItem,
    Other(String),
}

impl ActionType {
    pub fn label(&self) -> &str {
        match self {
            ActionType::Attack => "attack",
            ActionType::Spell => "spell",
            ActionType::Move => "move",
            ActionType::Dash => "dash",
            ActionType::Dodge => "dodge",
            ActionType::Disengage => "disengage",
            ActionType::Help => "help",
            ActionType::Hide => "hide",
            ActionType::Ready => "ready",
            ActionType::UseItem => "use item",
            ActionType::Other(label) => label,
        }
    }
}

/// Someone on the receiving end of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTarget {
    pub name: String,
    pub class: ActorClass,
    /// Damage this target took from the action.
    #[serde(default)]
    pub damage: u32,
}

impl ActionTarget {
    pub fn new(name: impl Into<String>, class: ActorClass) -> Self {
        Self {
            name: name.into(),
            class,
            damage: 0,
        }
    }

    pub fn with_damage(mut self, damage: u32) -> Self {
        self.damage = damage;
        self
    }
}

/// One action taken during combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatActionRecord {
    pub round: u32,
    pub turn: u32,
    pub actor: String,
    pub actor_class: ActorClass,
    pub action_type: ActionType,
    pub targets: Vec<ActionTarget>,
    pub result_summary: String,
    /// Condition names the action inflicted.
    pub conditions_applied: Vec<String>,
    pub timestamp: WorldTime,
}

impl CombatActionRecord {
    pub fn new(
        round: u32,
        turn: u32,
        actor: impl Into<String>,
        actor_class: ActorClass,
        action_type: ActionType,
    ) -> Self {
        Self {
            round,
            turn,
            actor: actor.into(),
            actor_class,
            action_type,
            targets: Vec::new(),
            result_summary: String::new(),
            conditions_applied: Vec::new(),
            timestamp: WorldTime::default(),
        }
    }

    pub fn with_target(mut self, target: ActionTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_result(mut self, summary: impl Into<String>) -> Self {
        self.result_summary = summary.into();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions_applied.push(condition.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: WorldTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn total_damage(&self) -> u64 {
        self.targets.iter().fold(0u64, |sum, t| sum.saturating_add(u64::from(t.damage)))
    }

    /// e.g. "Aria (player) attack -> Goblin: hits for 7".
    pub fn describe(&self) -> String {
        let mut line = format!("{} ({}) {}", self.actor, self.actor_class, self.action_type.label());
        if !self.targets.is_empty() {
            let names: Vec<_> = self.targets.iter().map(|t| t.name.as_str()).collect();
            line.push_str(&format!(" -> {}", names.join(", ")));
        }
        if !self.result_summary.trim().is_empty() {
            line.push_str(&format!(": {}", self.result_summary.trim()));
        }
        line
    }

    fn critical_mentions(&self) -> u32 {
        self.result_summary
            .to_ascii_lowercase()
            .matches("critical")
            .count() as u32
    }
}

/// All actions of a single round, in turn order as recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundLog {
    pub round: u32,
    pub actions: Vec<CombatActionRecord>,
}

/// Aggregate of every round evicted from the detailed log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatSummary {
    pub rounds_folded: u32,
    pub first_round: Option<u32>,
    pub last_round: Option<u32>,
    pub actions_folded: usize,
    pub damage_dealt: BTreeMap<ActorClass, u64>,
    pub damage_received: BTreeMap<ActorClass, u64>,
    pub conditions_applied: BTreeSet<String>,
    pub critical_mentions: u32,
}

impl CombatSummary {
    pub fn is_empty(&self) -> bool {
        self.rounds_folded == 0
    }

    /// Fold one round into the running totals. Cost is proportional to the
    /// round's own actions only.
    pub fn fold(&mut self, round: &RoundLog) {
        self.rounds_folded += 1;
        self.first_round = Some(self.first_round.map_or(round.round, |r| r.min(round.round)));
        self.last_round = Some(self.last_round.map_or(round.round, |r| r.max(round.round)));
        self.actions_folded += round.actions.len();

        for action in &round.actions {
            let dealt = action.total_damage();
            if dealt > 0 {
                let total = self.damage_dealt.entry(action.actor_class).or_default();
                *total = total.saturating_add(dealt);
            }
            for target in &action.targets {
                if target.damage > 0 {
                    let total = self.damage_received.entry(target.class).or_default();
                    *total = total.saturating_add(u64::from(target.damage));
                }
            }
            self.conditions_applied
                .extend(action.conditions_applied.iter().map(|c| c.trim().to_string()));
            self.critical_mentions = self.critical_mentions.saturating_add(action.critical_mentions());
        }
    }

    /// Human-readable lines, stable across calls.
    pub fn describe(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut lines = Vec::new();
        let span = match (self.first_round, self.last_round) {
            (Some(first), Some(last)) if first != last => format!("Rounds {first}-{last}"),
            (Some(first), _) => format!("Round {first}"),
            _ => "Earlier rounds".to_string(),
        };
        lines.push(format!(
            "{span}: {} actions across {} rounds",
            self.actions_folded, self.rounds_folded
        ));

        if !self.damage_dealt.is_empty() {
            let parts: Vec<_> = self
                .damage_dealt
                .iter()
                .map(|(class, dmg)| format!("{class} {dmg}"))
                .collect();
            lines.push(format!("Damage dealt: {}", parts.join(", ")));
        }
        if !self.damage_received.is_empty() {
            let parts: Vec<_> = self
                .damage_received
                .iter()
                .map(|(class, dmg)| format!("{class} {dmg}"))
                .collect();
            lines.push(format!("Damage received: {}", parts.join(", ")));
        }
        if !self.conditions_applied.is_empty() {
            let names: Vec<_> = self.conditions_applied.iter().map(String::as_str).collect();
            lines.push(format!("Conditions applied: {}", names.join(", ")));
        }
        if self.critical_mentions > 0 {
            lines.push(format!("Critical hits: {}", self.critical_mentions));
        }
        lines
    }
}

/// Everything known about an encounter when it ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRecap {
    pub encounter: Option<String>,
    pub rounds: u32,
    pub summary: CombatSummary,
}

/// Round-keyed combat log bounded by `max_rounds` whole rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatHistory {
    rounds: VecDeque<RoundLog>,
    max_rounds: usize,
    summary: CombatSummary,
    encounter: Option<String>,
    current_round: u32,
}

impl CombatHistory {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            rounds: VecDeque::new(),
            max_rounds: max_rounds.max(1),
            summary: CombatSummary::default(),
            encounter: None,
            current_round: 0,
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn set_max_rounds(&mut self, max_rounds: usize) {
        self.max_rounds = max_rounds.max(1);
        self.evict_if_over_capacity();
    }

    /// Reset the log for a new encounter.
    pub fn start_combat(&mut self, encounter: Option<String>) {
        self.clear(None);
        self.encounter = encounter;
    }

    /// Alias of [`HistoryStore::record`] matching combat vocabulary.
    pub fn add_action(&mut self, action: CombatActionRecord) -> bool {
        self.record(action)
    }

    /// Close the encounter: fold every retained round into a recap and reset.
    pub fn end_combat(&mut self) -> CombatRecap {
        let mut summary = self.summary.clone();
        for round in &self.rounds {
            summary.fold(round);
        }
        let recap = CombatRecap {
            encounter: self.encounter.take(),
            rounds: self.current_round,
            summary,
        };
        self.clear(None);
        recap
    }

    pub fn encounter(&self) -> Option<&str> {
        self.encounter.as_deref()
    }

    /// Highest round seen so far, 0 before any action.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Retained rounds, oldest first.
    pub fn rounds(&self) -> impl Iterator<Item = &RoundLog> {
        self.rounds.iter()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    /// Summary of rounds no longer held in detail.
    pub fn summary(&self) -> &CombatSummary {
        &self.summary
    }

    /// Whether no action has been recorded since the encounter began.
    pub fn is_fresh(&self) -> bool {
        self.rounds.is_empty() && self.summary.is_empty()
    }

    fn oldest_allowed_round(&self) -> u32 {
        self.summary.last_round.map_or(1, |r| r.saturating_add(1))
    }
}

impl Default for CombatHistory {
    fn default() -> Self {
        Self::new(crate::config::CombatContextConfig::default().max_rounds_to_track)
    }
}

impl HistoryStore for CombatHistory {
    type Entry = CombatActionRecord;
    type Key = u32;

    fn record(&mut self, action: CombatActionRecord) -> bool {
        if action.round == 0 {
            tracing::warn!(domain = "combat", actor = %action.actor, "rejected action with round 0");
            return false;
        }
        if action.actor.trim().is_empty() {
            tracing::warn!(domain = "combat", round = action.round, "rejected action without an actor");
            return false;
        }
        if action.round < self.oldest_allowed_round() {
            tracing::warn!(
                domain = "combat",
                round = action.round,
                "rejected action for a round already folded into the summary"
            );
            return false;
        }

        let round = action.round;
        self.current_round = self.current_round.max(round);

        match self.rounds.binary_search_by_key(&round, |r| r.round) {
            Ok(idx) => self.rounds[idx].actions.push(action),
            Err(idx) => self.rounds.insert(
                idx,
                RoundLog {
                    round,
                    actions: vec![action],
                },
            ),
        }

        self.evict_if_over_capacity();
        true
    }

    fn entries(&self, round: &u32) -> Vec<&CombatActionRecord> {
        self.rounds
            .iter()
            .find(|r| r.round == *round)
            .map(|r| r.actions.iter().collect())
            .unwrap_or_default()
    }

    fn evict_if_over_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.rounds.len() > self.max_rounds {
            let Some(oldest) = self.rounds.pop_front() else {
                break;
            };
            self.summary.fold(&oldest);
            evicted += 1;
            tracing::debug!(domain = "combat", round = oldest.round, "folded round into summary");
        }
        evicted
    }

    fn clear(&mut self, round: Option<&u32>) {
        match round {
            Some(round) => self.rounds.retain(|r| r.round != *round),
            None => {
                self.rounds.clear();
                self.summary = CombatSummary::default();
                self.encounter = None;
                self.current_round = 0;
            }
        }
    }

    fn len(&self) -> usize {
        self.rounds.iter().map(|r| r.actions.len()).sum()
    }
}
