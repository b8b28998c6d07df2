//! Location context: the place itself, its surroundings and what happened here before.

use game_state::{GameStateSnapshot, Location, LocationId};

use super::{
    environment_lines, focus_section, npcs_section, AssembledContext, ContextAssembler,
    ContextSection, MissingContext,
};
use crate::config::LocationContextConfig;
use crate::history::LocationHistory;

/// Placeholder when the location has never been visited.
pub const FIRST_VISIT: &str = "First visit.";

/// Builds location context for the party's current location. Section order:
/// Location, Environmental Details, Time and Weather, Nearby Locations,
/// NPCs Present, Visit History, Current Action.
#[derive(Debug, Clone, Default)]
pub struct LocationContextAssembler {
    config: LocationContextConfig,
}

impl LocationContextAssembler {
    pub fn new(config: LocationContextConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(LocationContextConfig::default())
    }

    pub fn config(&self) -> &LocationContextConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: LocationContextConfig) {
        self.config = config;
    }

    /// Names of every location linked to `id`, checking both link directions.
    pub fn nearby_locations(&self, snapshot: &GameStateSnapshot, id: &LocationId) -> Vec<String> {
        snapshot.neighbors_of(id).into_iter().map(|n| n.name).collect()
    }

    fn location_section(&self, location: &Location) -> ContextSection {
        let mut section = ContextSection::mandatory("Location").line(format!(
            "{} ({})",
            location.name,
            format!("{:?}", location.location_type).to_lowercase()
        ));
        if !location.description.trim().is_empty() {
            section.push(location.description.trim());
        }
        section
    }

    fn details_section(&self, location: &Location) -> ContextSection {
        let mut section = ContextSection::new("Environmental Details", 4);
        for feature in &location.features {
            section.push(format!("- {feature}"));
        }
        section
    }

    fn nearby_section(&self, snapshot: &GameStateSnapshot, id: &LocationId) -> ContextSection {
        let mut section = ContextSection::new("Nearby Locations", 3);
        for neighbor in snapshot.neighbors_of(id) {
            match neighbor.via {
                Some(via) => section.push(format!("- {} (via {via})", neighbor.name)),
                None => section.push(format!("- {}", neighbor.name)),
            }
        }
        section
    }

    fn visits_section(&self, history: &LocationHistory, id: &LocationId) -> ContextSection {
        let mut section = ContextSection::mandatory("Visit History").trimmable();
        let total = history.total_visits(id);
        if total == 0 {
            section.push(FIRST_VISIT);
            return section;
        }

        let mut section = section.pin_first(1);
        section.push(format!(
            "Visited {total} time{} before.",
            if total == 1 { "" } else { "s" }
        ));
        for visit in history.visits(id) {
            section.push(visit.describe());
        }
        section
    }
}

impl ContextAssembler for LocationContextAssembler {
    type History = LocationHistory;

    fn assemble(
        &self,
        snapshot: Option<&GameStateSnapshot>,
        history: &LocationHistory,
        focus: Option<&str>,
    ) -> Result<AssembledContext, MissingContext> {
        let snapshot = snapshot.ok_or(MissingContext::NoSnapshot)?;
        let id = snapshot
            .current_location
            .as_ref()
            .ok_or(MissingContext::NoCurrentLocation)?;
        let location = snapshot
            .location(id)
            .ok_or_else(|| MissingContext::UnknownLocation(id.clone()))?;
        let config = &self.config;
        let mut context = AssembledContext::new();

        context.push(self.location_section(location));
        context.push_if(config.include_environmental_details, || {
            Some(self.details_section(location))
        });
        context.push_if(config.include_time_of_day || config.include_weather, || {
            Some(ContextSection {
                lines: environment_lines(snapshot, config.include_time_of_day, config.include_weather),
                ..ContextSection::new("Time and Weather", 2)
            })
        });
        context.push_if(config.include_nearby_locations, || Some(self.nearby_section(snapshot, id)));
        context.push_if(config.include_npc_details, || npcs_section(snapshot, id));
        context.push(self.visits_section(history, id));
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
    use crate::history::{HistoryStore, LocationVisit};
    use game_state::{LocationLink, LocationType, Npc, Weather};

    fn snapshot() -> GameStateSnapshot {
        GameStateSnapshot::new()
            .with_location(
                Location::new("town-1", "Millbrook")
                    .with_type(LocationType::Town)
                    .outdoors(),
            )
            .with_location(
                Location::new("tavern-1", "The Prancing Pony")
                    .with_description("Low beams and the smell of pipe smoke.")
                    .with_feature("a crackling hearth")
                    .with_feature("a trapdoor behind the bar"),
            )
            .with_location(Location::new("stable-1", "The Stables"))
            .with_link(LocationLink::new("town-1", "tavern-1"))
            .with_link(LocationLink {
                via: Some("the yard".to_string()),
                ..LocationLink::new("tavern-1", "stable-1")
            })
            .with_npc(Npc::new("npc-1", "Barliman").at("tavern-1").with_role("innkeeper"))
            .with_weather(Weather::Stormy)
    }

    #[test]
    fn test_nearby_lookup_is_bidirectional() {
        let assembler = LocationContextAssembler::with_defaults();
        let snap = snapshot();

        assert_eq!(
            assembler.nearby_locations(&snap, &LocationId::from("town-1")),
            vec!["The Prancing Pony"]
        );
        assert_eq!(
            assembler.nearby_locations(&snap, &LocationId::from("tavern-1")),
            vec!["Millbrook", "The Stables"]
        );
    }

    #[test]
    fn test_first_visit_placeholder() {
        let text = LocationContextAssembler::with_defaults().build_context(
            Some(&snapshot().at("tavern-1")),
            &LocationHistory::new(3),
            None,
        );

        assert!(text.starts_with("## Location\nThe Prancing Pony (building)\n"));
        assert!(text.contains("- a trapdoor behind the bar"));
        assert!(text.contains("Weather outside: stormy"));
        assert!(text.contains("- Millbrook\n- The Stables (via the yard)"));
        assert!(text.contains("- Barliman (innkeeper, neutral)"));
        assert!(text.contains("## Visit History\nFirst visit."));
    }

    #[test]
    fn test_visit_history_lines() {
        let mut history = LocationHistory::new(2);
        history.record(LocationVisit::new("tavern-1").with_action("drank"));
        history.record(LocationVisit::new("tavern-1").with_action("sang"));
        history.record(LocationVisit::new("tavern-1").with_action("slept"));

        let context = LocationContextAssembler::with_defaults()
            .assemble(Some(&snapshot().at("tavern-1")), &history, Some("look for the trapdoor"))
            .unwrap();

        let visits = context.section("Visit History").unwrap();
        assert_eq!(visits.lines[0], "Visited 3 times before.");
        assert_eq!(visits.lines.len(), 3);
        assert!(visits.lines[1].contains("did: sang"));
        assert_eq!(context.titles().last(), Some(&"Current Action"));
    }

    #[test]
    fn test_token_budget_keeps_visit_count() {
        let mut history = LocationHistory::new(5);
        for action in ["drank", "sang", "slept", "gambled", "brawled"] {
            history.record(LocationVisit::new("tavern-1").with_action(action));
        }
        let config = LocationContextConfig {
            token_budget: Some(60),
            ..Default::default()
        };

        let context = LocationContextAssembler::new(config)
            .assemble(Some(&snapshot().at("tavern-1")), &history, None)
            .unwrap();

        assert!(context.estimated_tokens() <= 60);
        let visits = context.section("Visit History").unwrap();
        assert_eq!(visits.lines[0], "Visited 5 times before.");
        assert!(visits.lines.last().unwrap().contains("did: brawled"));
        assert!(!visits.lines.iter().any(|l| l.contains("did: drank")));
        assert!(context.section("Location").is_some());
    }

    #[test]
    fn test_minimal_config() {
        let assembler = LocationContextAssembler::new(LocationContextConfig::minimal());
        let context = assembler
            .assemble(Some(&snapshot().at("town-1")), &LocationHistory::new(3), None)
            .unwrap();
        assert_eq!(context.titles(), vec!["Location", "Visit History"]);
    }

    #[test]
    fn test_missing_target() {
        let assembler = LocationContextAssembler::with_defaults();
        let history = LocationHistory::new(3);

        assert_eq!(
            assembler.assemble(Some(&snapshot()), &history, None),
            Err(MissingContext::NoCurrentLocation)
        );
        let text = assembler.build_context(Some(&snapshot().at("cave-9")), &history, None);
        assert_eq!(text, "Insufficient information: location 'cave-9' not found.");
    }
}
