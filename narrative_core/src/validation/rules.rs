//! Rule accuracy: numbers in the prose that the rules cannot produce.

use std::sync::LazyLock;

use game_state::{is_valid_die, ABILITY_SCORE_MAX, ABILITY_SCORE_MIN, ARMOR_CLASS_RANGE, MAX_DICE_PER_ROLL};
use regex_lite::Regex;

use super::{CheckCategory, CheckInput, Checker, IssueType, Severity, ValidationIssue};

static ABILITY_SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b((?i:strength|dexterity|constitution|intelligence|wisdom|charisma)|STR|DEX|CON|INT|WIS|CHA)(?i:\s+score)?(?i:\s+of|\s+is|:)?\s+(-?\d+)\b",
    )
    .expect("valid regex")
});
static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d*)d(\d+)\b").expect("valid regex"));
static ROLL_ON_DIE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\brolls?\s+(?:an?\s+)?(\d+)\s+on\s+(?:an?\s+|the\s+|your\s+)?d(\d+)\b")
        .expect("valid regex")
});
static NATURAL_ROLL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnat(?:ural)?\s+(\d+)\b").expect("valid regex"));
static ARMOR_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:AC|(?i:armou?r class))(?i:\s+of|\s+is|:)?\s*(-?\d+)\b").expect("valid regex")
});

/// Ability scores outside the legal range.
pub fn check_ability_scores(text: &str) -> Vec<ValidationIssue> {
    ABILITY_SCORE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let ability = caps.get(1)?.as_str();
            let raw = caps.get(2)?.as_str();
            let in_range = raw
                .parse::<i64>()
                .is_ok_and(|v| (ABILITY_SCORE_MIN..=ABILITY_SCORE_MAX).contains(&v));
            if in_range {
                return None;
            }
            Some(
                ValidationIssue::new(
                    IssueType::RuleViolation,
                    Severity::High,
                    format!(
                        "Ability score {raw} for {ability} is outside the valid range \
                         {ABILITY_SCORE_MIN}-{ABILITY_SCORE_MAX}"
                    ),
                )
                .with_evidence(caps.get(0)?.as_str())
                .with_fix(format!(
                    "Keep ability scores between {ABILITY_SCORE_MIN} and {ABILITY_SCORE_MAX}"
                )),
            )
        })
        .collect()
}

/// Dice expressions naming dice that do not exist or an impossible number of them.
pub fn check_dice_notation(text: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for caps in DICE_RE.captures_iter(text) {
        let (Some(whole), Some(count), Some(sides)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let count = match count.as_str() {
            "" => Some(1),
            raw => raw.parse::<u32>().ok(),
        };
        let sides = sides.as_str().parse::<u32>().ok();

        let problem = match (count, sides) {
            (_, None) => "an impossible die size".to_string(),
            (_, Some(s)) if !is_valid_die(s) => format!("a d{s}, which does not exist"),
            (Some(0), _) => "zero dice".to_string(),
            (None, _) => "an impossible number of dice".to_string(),
            (Some(n), _) if n > MAX_DICE_PER_ROLL => format!("{n} dice in one roll"),
            _ => continue,
        };
        issues.push(
            ValidationIssue::new(
                IssueType::RuleViolation,
                Severity::Medium,
                format!("Dice notation '{}' uses {problem}", whole.as_str()),
            )
            .with_evidence(whole.as_str())
            .with_fix("Use standard dice: d4, d6, d8, d10, d12, d20 or d100"),
        );
    }
    issues
}

/// Roll results the named die cannot show.
pub fn check_roll_results(text: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut impossible = |evidence: &str, result: &str, sides: u32| {
        issues.push(
            ValidationIssue::new(
                IssueType::RuleViolation,
                Severity::High,
                format!("A roll of {result} is impossible on a d{sides}"),
            )
            .with_evidence(evidence)
            .with_fix(format!("Roll results on a d{sides} range from 1 to {sides}")),
        );
    };

    for caps in ROLL_ON_DIE_RE.captures_iter(text) {
        let (Some(whole), Some(result), Some(sides)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(sides_n) = sides.as_str().parse::<u32>().ok().filter(|s| is_valid_die(*s)) else {
            continue;
        };
        let possible = result
            .as_str()
            .parse::<u32>()
            .is_ok_and(|r| (1..=sides_n).contains(&r));
        if !possible {
            impossible(whole.as_str(), result.as_str(), sides_n);
        }
    }

    for caps in NATURAL_ROLL_RE.captures_iter(text) {
        let (Some(whole), Some(result)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !result.as_str().parse::<u32>().is_ok_and(|r| (1..=20).contains(&r)) {
            impossible(whole.as_str(), result.as_str(), 20);
        }
    }
    issues
}

/// Armor class values outside the legal range.
pub fn check_armor_class(text: &str) -> Vec<ValidationIssue> {
    ARMOR_CLASS_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let raw = caps.get(1)?.as_str();
            if raw.parse::<i64>().is_ok_and(|v| ARMOR_CLASS_RANGE.contains(&v)) {
                return None;
            }
            Some(
                ValidationIssue::new(
                    IssueType::RuleViolation,
                    Severity::Medium,
                    format!(
                        "Armor class {raw} is outside the valid range {}-{}",
                        ARMOR_CLASS_RANGE.start(),
                        ARMOR_CLASS_RANGE.end()
                    ),
                )
                .with_evidence(caps.get(0)?.as_str()),
            )
        })
        .collect()
}

pub struct RuleAccuracyChecker;

impl Checker for RuleAccuracyChecker {
    fn name(&self) -> &str {
        "rule_accuracy"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::RuleAccuracy
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue> {
        let text = input.text;
        let mut issues = check_ability_scores(text);
        issues.extend(check_dice_notation(text));
        issues.extend(check_roll_results(text));
        issues.extend(check_armor_class(text));
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_scores() {
        assert!(check_ability_scores("Your Strength of 18 carries you through.").is_empty());
        assert!(check_ability_scores("STR 10, DEX 14").is_empty());

        let issues = check_ability_scores("With a Strength score of 35 you lift the gate.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::High);
        assert!(issues[0].description.contains("35"));

        assert_eq!(check_ability_scores("Wisdom 0 and CHA 31").len(), 2);
        // lowercase abbreviations are ordinary words
        assert!(check_ability_scores("the con 99 was obvious").is_empty());
    }

    #[test]
    fn test_dice_notation() {
        assert!(check_dice_notation("Roll 2d6+3 damage, then a d20.").is_empty());
        assert!(check_dice_notation("1d100 on the wild magic table").is_empty());

        let issues = check_dice_notation("Roll 3d7 for the fall.");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].description.contains("d7"));

        assert_eq!(check_dice_notation("0d6").len(), 1);
        assert_eq!(check_dice_notation("150d6").len(), 1);
        assert!(check_dice_notation("the hd20 model").is_empty());
    }

    #[test]
    fn test_roll_results() {
        assert!(check_roll_results("You roll a 17 on a d20.").is_empty());
        assert_eq!(check_roll_results("She rolls a 9 on the d8.").len(), 1);
        assert_eq!(check_roll_results("A natural 23! The blade sings.").len(), 1);
        assert!(check_roll_results("A nat 20!").is_empty());
        // unknown die sizes are left to the notation check
        assert!(check_roll_results("rolls 9 on a d7").is_empty());
    }

    #[test]
    fn test_armor_class() {
        assert!(check_armor_class("The ogre has AC 11.").is_empty());
        assert_eq!(check_armor_class("an armor class of 45").len(), 1);
        assert_eq!(check_armor_class("AC 0").len(), 1);
    }

    #[test]
    fn test_checker_collects_all() {
        let config = crate::config::ValidationConfig::default();
        let context = super::super::ValidationContext::default();
        let input = CheckInput {
            text: "Roll 3d7. Your Dexterity of 40 lets you dodge.",
            snapshot: None,
            context: &context,
            config: &config,
        };
        assert_eq!(RuleAccuracyChecker.check(&input).len(), 2);
    }
}
