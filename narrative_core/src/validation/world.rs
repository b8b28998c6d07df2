//! World consistency: weather, time of day and the dead staying dead.

use std::sync::LazyLock;

use game_state::{GameStateSnapshot, TimeOfDay, Weather};
use regex_lite::Regex;

use super::{CheckCategory, CheckInput, Checker, IssueType, Severity, ValidationIssue};

struct WeatherFamily {
    name: &'static str,
    pattern: Regex,
    compatible: &'static [Weather],
}

fn family(name: &'static str, pattern: &str, compatible: &'static [Weather]) -> WeatherFamily {
    WeatherFamily {
        name,
        pattern: Regex::new(pattern).expect("valid regex"),
        compatible,
    }
}

static WEATHER_FAMILIES: LazyLock<Vec<WeatherFamily>> = LazyLock::new(|| {
    vec![
        family(
            "rain",
            r"(?i)\b(?:rain|raining|rainfall|downpour|drizzle|drizzling)\b",
            &[Weather::Rainy, Weather::Stormy],
        ),
        family(
            "snow",
            r"(?i)\b(?:snow|snowing|snowfall|snowflakes|blizzard|sleet)\b",
            &[Weather::Snowy],
        ),
        family(
            "a storm",
            r"(?i)\b(?:thunder|thunderstorm|lightning)\b",
            &[Weather::Stormy, Weather::Rainy],
        ),
        family(
            "fog",
            r"(?i)\b(?:fog|foggy|mist|misty)\b",
            &[Weather::Foggy, Weather::Rainy],
        ),
        family(
            "clear skies",
            r"(?i)\b(?:cloudless|clear skies|clear sky|sunny)\b",
            &[Weather::Clear, Weather::Cloudy],
        ),
    ]
});

static NIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:moonlight|moonlit|starlight|starlit|starry sky|night sky|midnight)\b")
        .expect("valid regex")
});
static DAYLIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:sunlight|sunshine|midday sun|noonday|noon sun|blazing sun|high sun)\b")
        .expect("valid regex")
});

const SPEECH_VERBS: &str =
    "says|said|asks|asked|replies|replied|shouts|shouted|whispers|whispered|nods|nodded|smiles|smiled|laughs|laughed|greets|greeted|grins|grinned|speaks|spoke|walks|walked";

/// Weather mentioned in the text that the snapshot's weather rules out.
pub fn check_weather(text: &str, weather: Weather) -> Vec<ValidationIssue> {
    WEATHER_FAMILIES
        .iter()
        .filter(|family| !family.compatible.contains(&weather))
        .filter_map(|family| {
            let found = family.pattern.find(text)?;
            Some(
                ValidationIssue::new(
                    IssueType::WorldInconsistency,
                    Severity::Medium,
                    format!(
                        "Response describes {} but the weather is {}",
                        family.name,
                        weather.label()
                    ),
                )
                .with_evidence(found.as_str())
                .with_fix(format!("Describe {} weather", weather.label())),
            )
        })
        .collect()
}

/// Light sources that do not fit the time of day.
pub fn check_time_of_day(text: &str, time: TimeOfDay) -> Vec<ValidationIssue> {
    let clash = match time {
        TimeOfDay::Morning | TimeOfDay::Afternoon => NIGHT_RE.find(text).map(|m| (m, "night")),
        TimeOfDay::Night => DAYLIGHT_RE.find(text).map(|m| (m, "daylight")),
        TimeOfDay::Dawn | TimeOfDay::Evening => None,
    };

    clash
        .map(|(found, what)| {
            ValidationIssue::new(
                IssueType::WorldInconsistency,
                Severity::Medium,
                format!("Response describes {what} but it is {}", time.label()),
            )
            .with_evidence(found.as_str())
            .with_fix(format!("Match the lighting to the {}", time.label()))
        })
        .into_iter()
        .collect()
}

/// Dead NPCs who speak or act.
pub fn check_dead_npcs(text: &str, snapshot: &GameStateSnapshot) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for npc in snapshot.npcs.values().filter(|n| !n.alive) {
        let name = npc.name.trim();
        if name.is_empty() {
            continue;
        }
        let pattern = format!(r"(?i)\b{}\s+(?:{SPEECH_VERBS})\b", regex_lite::escape(name));
        let Ok(re) = Regex::new(&pattern) else {
            tracing::debug!(npc = %npc.id, "skipped npc whose name does not form a pattern");
            continue;
        };
        if let Some(found) = re.find(text) {
            issues.push(
                ValidationIssue::new(
                    IssueType::WorldInconsistency,
                    Severity::High,
                    format!("{name} is dead but speaks or acts in the response"),
                )
                .with_evidence(found.as_str())
                .with_fix(format!("Remove {name} from the scene or refer to them in the past")),
            );
        }
    }
    issues
}

pub struct WorldConsistencyChecker;

impl Checker for WorldConsistencyChecker {
    fn name(&self) -> &str {
        "world_consistency"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::WorldConsistency
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue> {
        let Some(snapshot) = input.snapshot else {
            return Vec::new();
        };
        let mut issues = check_weather(input.text, snapshot.weather);
        issues.extend(check_time_of_day(input.text, snapshot.time.time_of_day()));
        issues.extend(check_dead_npcs(input.text, snapshot));
        issues
    }
}
