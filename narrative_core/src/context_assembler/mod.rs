//! Context Assembler - builds the text context sent alongside each generation request.
//!
//! Assembly works as follows:
//! 1. **Resolve**: look up the target (current location, active combat) in the snapshot
//! 2. **Sections**: emit each enabled section in a fixed order
//! 3. **History**: append the digest from the domain's history store
//! 4. **Budget**: drop oldest history lines, then low-priority sections, until
//!    the estimated token count fits
//! 5. **Render**: format sections as a prompt string
//!
//! Sections with nothing to say are never emitted, so the output has no empty
//! headers. History sections are mandatory and fall back to a placeholder line.

mod combat;
mod location;
mod narrative;

pub use combat::*;
pub use location::*;
pub use narrative::*;

use game_state::{GameStateSnapshot, LocationId, Npc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::HistoryStore;

/// Prefix of every degraded context string.
pub const INSUFFICIENT_INFORMATION: &str = "Insufficient information";

/// Why a context could not be assembled. Rendered as a short explanatory line
/// instead of a context; never propagated as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingContext {
    #[error("Insufficient information: no game state snapshot available.")]
    NoSnapshot,

    #[error("Insufficient information: the party's current location is unknown.")]
    NoCurrentLocation,

    #[error("Insufficient information: location '{0}' not found.")]
    UnknownLocation(LocationId),

    #[error("Insufficient information: no combat in progress.")]
    NoCombat,
}

/// Common contract of the per-domain assemblers.
pub trait ContextAssembler {
    type History: HistoryStore;

    /// Assemble the structured context, or explain what is missing.
    fn assemble(
        &self,
        snapshot: Option<&GameStateSnapshot>,
        history: &Self::History,
        focus: Option<&str>,
    ) -> Result<AssembledContext, MissingContext>;

    /// Assemble and render. Never fails: missing data yields a one-line explanation.
    fn build_context(
        &self,
        snapshot: Option<&GameStateSnapshot>,
        history: &Self::History,
        focus: Option<&str>,
    ) -> String {
        match self.assemble(snapshot, history, focus) {
            Ok(context) => context.to_prompt_string(),
            Err(missing) => {
                tracing::debug!(reason = %missing, "context assembly degraded");
                missing.to_string()
            }
        }
    }
}

/// One titled block of the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSection {
    pub title: String,
    pub lines: Vec<String>,
    /// Mandatory sections survive budget trimming.
    pub mandatory: bool,
    /// Lines may be dropped oldest-first when over budget.
    pub trimmable: bool,
    /// Leading lines of a trimmable section that trimming never drops.
    #[serde(default)]
    pub pinned_lines: usize,
    /// Lower priority sections are dropped first when over budget.
    pub priority: u8,
}

impl ContextSection {
    pub fn new(title: impl Into<String>, priority: u8) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
            mandatory: false,
            trimmable: false,
            pinned_lines: 0,
            priority,
        }
    }

    /// A section that is never dropped.
    pub fn mandatory(title: impl Into<String>) -> Self {
        Self {
            mandatory: true,
            ..Self::new(title, u8::MAX)
        }
    }

    pub fn trimmable(mut self) -> Self {
        self.trimmable = true;
        self
    }

    /// Keep the first `n` lines through budget trimming.
    pub fn pin_first(mut self, n: usize) -> Self {
        self.pinned_lines = n;
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    /// Characters this section contributes to the rendered prompt.
    fn rendered_chars(&self) -> usize {
        "## \n\n".len()
            + self.title.chars().count()
            + self.lines.iter().map(|l| l.chars().count() + 1).sum::<usize>()
    }

    fn can_trim(&self) -> bool {
        self.trimmable && self.lines.len() > self.pinned_lines + 1
    }
}

/// The assembled context ready for prompt generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub sections: Vec<ContextSection>,
}

impl AssembledContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section unless it has no content.
    pub fn push(&mut self, section: ContextSection) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    /// Append a section when `enabled` and it has content.
    pub fn push_if(&mut self, enabled: bool, section: impl FnOnce() -> Option<ContextSection>) {
        if enabled {
            if let Some(section) = section() {
                self.push(section);
            }
        }
    }

    pub fn section(&self, title: &str) -> Option<&ContextSection> {
        self.sections.iter().find(|s| s.title == title)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    /// Estimated tokens of the rendered prompt.
    pub fn estimated_tokens(&self) -> usize {
        estimate_tokens(&self.to_prompt_string())
    }

    /// Shrink the context until it fits `budget` tokens or nothing optional is left.
    ///
    /// Oldest unpinned lines of trimmable sections go first (a trimmable
    /// section always keeps its last line), then whole optional sections from
    /// the lowest priority up; among equal priorities the later section goes
    /// first. The rendered length is tracked as a running upper bound.
    pub fn fit_to_budget(&mut self, budget: usize) {
        let before = self.estimated_tokens();
        let mut raw: usize = self.sections.iter().map(ContextSection::rendered_chars).sum();
        let rendered = |sections: &[ContextSection], raw: usize| {
            if sections.is_empty() {
                1
            } else {
                raw.saturating_sub(1)
            }
        };

        while rendered(&self.sections, raw).div_ceil(4) > budget {
            if let Some(section) = self.sections.iter_mut().find(|s| s.can_trim()) {
                let removed = section.lines.remove(section.pinned_lines);
                raw -= removed.chars().count() + 1;
                continue;
            }

            let victim = self
                .sections
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.mandatory)
                .min_by(|(ia, a), (ib, b)| a.priority.cmp(&b.priority).then(ib.cmp(ia)))
                .map(|(idx, _)| idx);

            match victim {
                Some(idx) => {
                    raw -= self.sections.remove(idx).rendered_chars();
                }
                None => break,
            }
        }

        let after = self.estimated_tokens();
        if after != before {
            tracing::debug!(budget, before, after, "trimmed context to token budget");
        }
    }

    /// Format the context as a prompt string.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        for section in &self.sections {
            prompt.push_str("## ");
            prompt.push_str(&section.title);
            prompt.push('\n');
            for line in &section.lines {
                prompt.push_str(line);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.truncate(prompt.trim_end().len());
        prompt.push('\n');
        prompt
    }
}

/// Rough token estimate: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Shared "Current Action" section.
pub(crate) fn focus_section(focus: Option<&str>) -> Option<ContextSection> {
    let focus = focus?.trim();
    if focus.is_empty() {
        return None;
    }
    Some(ContextSection::mandatory("Current Action").line(format!("Player: {focus}")))
}

/// Shared "NPCs Present" section.
pub(crate) fn npcs_section(snapshot: &GameStateSnapshot, location: &LocationId) -> Option<ContextSection> {
    let npcs = snapshot.npcs_at(location);
    if npcs.is_empty() {
        return None;
    }
    let mut section = ContextSection::new("NPCs Present", 5);
    for npc in npcs {
        section.push(describe_npc(npc));
    }
    Some(section)
}

fn describe_npc(npc: &Npc) -> String {
    let mut tags = Vec::new();
    if let Some(role) = &npc.role {
        tags.push(role.clone());
    }
    tags.push(format!("{:?}", npc.disposition).to_lowercase());
    if !npc.alive {
        tags.push("deceased".to_string());
    }

    let mut line = format!("- {} ({})", npc.name, tags.join(", "));
    if let Some(description) = &npc.description {
        line.push_str(&format!(": {description}"));
    }
    line
}

/// Shared time/weather lines.
pub(crate) fn environment_lines(
    snapshot: &GameStateSnapshot,
    include_time: bool,
    include_weather: bool,
) -> Vec<String> {
    let mut lines = Vec::new();
    if include_time {
        lines.push(format!(
            "Time: {} ({})",
            snapshot.time,
            snapshot.time.time_of_day().label()
        ));
    }
    if include_weather {
        let place = if snapshot.is_outdoors() { "" } else { " outside" };
        lines.push(format!("Weather{place}: {}", snapshot.weather.label()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AssembledContext {
        let mut ctx = AssembledContext::new();
        ctx.push(ContextSection::new("Location", 7).line("The Prancing Pony: a busy inn."));
        ctx.push(ContextSection::new("Environment", 3).line("Weather: rainy"));
        ctx.push(
            ContextSection::mandatory("Recent History")
                .trimmable()
                .line("[#1] Player: hello / Narrator: The innkeeper waves.")
                .line("[#2] Player: order ale / Narrator: A foaming mug arrives.")
                .line("[#3] Player: sit / Narrator: The bench creaks."),
        );
        ctx
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let mut ctx = AssembledContext::new();
        ctx.push(ContextSection::new("Empty", 1));
        ctx.push(ContextSection::new("Blank", 1).line("   "));
        ctx.push_if(false, || Some(ContextSection::new("Disabled", 1).line("x")));
        ctx.push_if(true, || None);
        assert!(ctx.sections.is_empty());
    }

    #[test]
    fn test_to_prompt_string() {
        let prompt = sample().to_prompt_string();
        assert!(prompt.starts_with("## Location\nThe Prancing Pony: a busy inn.\n\n## Environment\n"));
        assert!(prompt.ends_with("The bench creaks.\n"));
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_budget_trims_history_first() {
        let mut ctx = sample();
        let full = ctx.estimated_tokens();
        ctx.fit_to_budget(full - 5);

        let history = ctx.section("Recent History").unwrap();
        assert_eq!(history.lines.len(), 2);
        assert!(history.lines[0].starts_with("[#2]"));
        assert_eq!(ctx.sections.len(), 3);
    }

    #[test]
    fn test_budget_drops_low_priority_then_stops() {
        let mut ctx = sample();
        ctx.fit_to_budget(1);

        assert_eq!(ctx.titles(), vec!["Recent History"]);
        let history = ctx.section("Recent History").unwrap();
        assert_eq!(history.lines.len(), 1);
        assert!(history.lines[0].starts_with("[#3]"));
    }

    #[test]
    fn test_budget_keeps_pinned_lines() {
        let mut ctx = AssembledContext::new();
        ctx.push(
            ContextSection::mandatory("Visit History")
                .trimmable()
                .pin_first(1)
                .line("Visited 4 times before.")
                .line("Visit 1: drank")
                .line("Visit 2: sang")
                .line("Visit 3: slept"),
        );
        ctx.fit_to_budget(1);

        let visits = ctx.section("Visit History").unwrap();
        assert_eq!(visits.lines, vec!["Visited 4 times before.", "Visit 3: slept"]);
    }

    #[test]
    fn test_tracked_size_matches_render() {
        let mut ctx = sample();
        let full = ctx.estimated_tokens();
        for budget in (1..=full).rev() {
            ctx.fit_to_budget(budget);
            let rendered = ctx.to_prompt_string().chars().count();
            let tracked: usize = ctx.sections.iter().map(ContextSection::rendered_chars).sum();
            assert_eq!(rendered, tracked - 1);
        }
    }

    #[test]
    fn test_budget_noop_when_fits() {
        let mut ctx = sample();
        let before = ctx.clone();
        ctx.fit_to_budget(10_000);
        assert_eq!(ctx, before);
    }

    #[test]
    fn test_missing_context_messages() {
        assert!(MissingContext::NoSnapshot.to_string().starts_with(INSUFFICIENT_INFORMATION));
        assert_eq!(
            MissingContext::UnknownLocation(LocationId::from("cave-9")).to_string(),
            "Insufficient information: location 'cave-9' not found."
        );
    }

    #[test]
    fn test_focus_section() {
        assert!(focus_section(None).is_none());
        assert!(focus_section(Some("  ")).is_none());
        let section = focus_section(Some("open the door")).unwrap();
        assert_eq!(section.lines, vec!["Player: open the door"]);
        assert!(section.mandatory);
    }
}
