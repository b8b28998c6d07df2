//! Character consistency against the player's sheet.

use std::sync::LazyLock;

use game_state::{is_character_class, PlayerCharacter};
use regex_lite::Regex;

use super::{CheckCategory, CheckInput, Checker, IssueType, Severity, ValidationIssue};

static CLASS_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\byou(?:\s+are|'re)\s+(?:a|an)\s+(?:level\s+\d+\s+)?(\w+)(?:\s+(\w+))?")
        .expect("valid regex")
});
static LEVEL_CLAIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\byou(?:\s+are|'re)(?:\s+now)?\s+(?:a\s+|an\s+)?level[\s-]+(\d+)\b")
        .expect("valid regex")
});
static CURRENT_HP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:you have|you're at|you are at|leaving you (?:with|at))\s+(\d+)\s+(?:hit points|hp)\b")
        .expect("valid regex")
});
static HP_FRACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:/|out of)\s*(\d+)\s+(?:hit points|hp)\b").expect("valid regex")
});

/// Class names the text assigns to the player that differ from the sheet.
pub fn check_class_claims(text: &str, player: &PlayerCharacter) -> Vec<ValidationIssue> {
    let Some(actual) = player.class.as_deref() else {
        return Vec::new();
    };
    CLASS_CLAIM_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let claimed = [caps.get(1), caps.get(2)]
                .into_iter()
                .flatten()
                .map(|m| m.as_str())
                .find(|word| is_character_class(word))?;
            if claimed.eq_ignore_ascii_case(actual.trim()) {
                return None;
            }
            Some(
                ValidationIssue::new(
                    IssueType::CharacterInconsistency,
                    Severity::High,
                    format!("Response calls {} a {claimed} but they are a {actual}", player.name),
                )
                .with_evidence(caps.get(0)?.as_str())
                .with_fix(format!("Refer to {} as a {actual}", player.name)),
            )
        })
        .collect()
}

/// Level claims that disagree with the sheet.
pub fn check_level_claims(text: &str, player: &PlayerCharacter) -> Vec<ValidationIssue> {
    LEVEL_CLAIM_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let claimed = caps.get(1)?.as_str();
            if claimed.parse::<u32>().is_ok_and(|l| l == player.level) {
                return None;
            }
            Some(
                ValidationIssue::new(
                    IssueType::CharacterInconsistency,
                    Severity::Medium,
                    format!("Response says level {claimed} but {} is level {}", player.name, player.level),
                )
                .with_evidence(caps.get(0)?.as_str()),
            )
        })
        .collect()
}

/// Hit point figures the player cannot have.
pub fn check_hit_points(text: &str, player: &PlayerCharacter) -> Vec<ValidationIssue> {
    let max = player.hit_points.max;
    let mut issues = Vec::new();

    for caps in CURRENT_HP_RE.captures_iter(text) {
        let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if value.as_str().parse::<i64>().is_ok_and(|v| v <= i64::from(max)) {
            continue;
        }
        issues.push(
            ValidationIssue::new(
                IssueType::CharacterInconsistency,
                Severity::High,
                format!(
                    "Response gives {} {} hit points, above their maximum of {max}",
                    player.name,
                    value.as_str()
                ),
            )
            .with_evidence(whole.as_str())
            .with_fix(format!(
                "Use the current hit points from the sheet ({}/{max})",
                player.hit_points.current
            )),
        );
    }

    for caps in HP_FRACTION_RE.captures_iter(text) {
        let (Some(whole), Some(stated_max)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        if stated_max.as_str().parse::<i64>().is_ok_and(|m| m == i64::from(max)) {
            continue;
        }
        issues.push(
            ValidationIssue::new(
                IssueType::CharacterInconsistency,
                Severity::Medium,
                format!("Response states a hit point maximum of {} but the sheet says {max}", stated_max.as_str()),
            )
            .with_evidence(whole.as_str()),
        );
    }
    issues
}

pub struct CharacterConsistencyChecker;

impl Checker for CharacterConsistencyChecker {
    fn name(&self) -> &str {
        "character_consistency"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::CharacterConsistency
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue> {
        let Some(player) = input.snapshot.and_then(|s| s.player.as_ref()) else {
            return Vec::new();
        };
        let mut issues = check_class_claims(input.text, player);
        issues.extend(check_level_claims(input.text, player));
        issues.extend(check_hit_points(input.text, player));
        issues
    }
}
