//! Narrative quality: length, completeness and prose texture.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::{
    sentences, word_count, CheckCategory, CheckInput, Checker, IssueType, ResponseKind, Severity,
    ValidationIssue,
};

/// Description used for responses that trail off.
pub const ABRUPT_ENDING: &str = "Response appears to end abruptly";

/// Share of sentences in passive voice above which prose is flagged.
const PASSIVE_RATIO_LIMIT: f64 = 0.3;

/// Consecutive sentences sharing an opener before it reads as repetitive.
const OPENER_RUN_LIMIT: usize = 3;

static PASSIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:is|are|was|were|been|being)\s+(?:\w+ed|taken|given|written|broken|hidden|spoken|chosen|driven|stolen|frozen|beaten|eaten|fallen|forgotten|shaken|woven|sworn|torn|worn|thrown|known|shown|seen|done|made|built|lost|found|held|kept|bound|caught|brought|sent|told|struck|hung|slain)\b",
    )
    .expect("valid regex")
});

struct Sense {
    name: &'static str,
    pattern: Regex,
}

fn sense(name: &'static str, pattern: &str) -> Sense {
    Sense {
        name,
        pattern: Regex::new(pattern).expect("valid regex"),
    }
}

static SENSES: LazyLock<Vec<Sense>> = LazyLock::new(|| {
    vec![
        sense(
            "sight",
            r"(?i)\b(?:see|sees|saw|seen|gleam\w*|glint\w*|glow\w*|shadow\w*|light|bright|dark\w*|shimmer\w*|colou?r\w*|flicker\w*)\b",
        ),
        sense(
            "sound",
            r"(?i)\b(?:hear|hears|heard|sound\w*|echo\w*|whisper\w*|creak\w*|clatter\w*|hum\w*|roar\w*|silence|silent|rustl\w*|drip\w*)\b",
        ),
        sense(
            "smell",
            r"(?i)\b(?:smell\w*|scent\w*|odou?r\w*|stench|aroma\w*|reek\w*|fragran\w*|musty|smoke|smoky)\b",
        ),
        sense(
            "touch",
            r"(?i)\b(?:cold|warm\w*|rough|smooth|damp|chill\w*|breeze|wet|sticky|heat|slick|clammy)\b",
        ),
        sense(
            "taste",
            r"(?i)\b(?:taste\w*|tang\w*|bitter|sweet|salty|sour)\b",
        ),
    ]
});

/// Responses outside the configured word limits.
pub fn check_length(text: &str, min_words: usize, max_words: usize) -> Vec<ValidationIssue> {
    let words = word_count(text);
    if words < min_words {
        vec![ValidationIssue::new(
            IssueType::LengthIssue,
            Severity::Medium,
            format!("Response is too short ({words} words, expected at least {min_words})"),
        )
        .with_fix("Expand the response with what the player sees and what happens next")]
    } else if words > max_words {
        vec![ValidationIssue::new(
            IssueType::LengthIssue,
            Severity::Low,
            format!("Response is too long ({words} words, expected at most {max_words})"),
        )
        .with_fix("Tighten the response and keep only what moves the scene forward")]
    } else {
        Vec::new()
    }
}

/// Responses that trail off or stop mid-sentence.
pub fn check_completeness(text: &str) -> Vec<ValidationIssue> {
    let trimmed = text.trim_end();
    let Some(last) = trimmed.chars().last() else {
        return Vec::new();
    };

    if trimmed.ends_with("...") || last == '…' {
        let start = trimmed.char_indices().rev().nth(19).map_or(0, |(i, _)| i);
        let tail = trimmed[start..].trim_start();
        return vec![ValidationIssue::new(IssueType::IncompleteResponse, Severity::High, ABRUPT_ENDING)
            .with_evidence(tail)
            .with_fix("Finish the final sentence and close the scene beat")];
    }

    if !matches!(last, '.' | '!' | '?' | '"' | '\'' | '”' | '’' | ')' | '*') {
        return vec![ValidationIssue::new(
            IssueType::IncompleteResponse,
            Severity::Medium,
            "Final sentence is unterminated",
        )
        .with_fix("End the response with complete punctuation")];
    }
    Vec::new()
}

fn opener(sentence: &str) -> Option<String> {
    let word = sentence
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric());
    (!word.is_empty()).then(|| word.to_lowercase())
}

/// Runs of consecutive sentences that begin with the same word.
pub fn check_repetitive_openers(text: &str) -> Vec<ValidationIssue> {
    let openers: Vec<Option<String>> = sentences(text).into_iter().map(opener).collect();
    let mut issues = Vec::new();

    let mut start = 0;
    while start < openers.len() {
        let mut end = start + 1;
        while end < openers.len() && openers[end].is_some() && openers[end] == openers[start] {
            end += 1;
        }
        let run = end - start;
        if let Some(word) = openers[start].as_deref().filter(|_| run >= OPENER_RUN_LIMIT) {
            issues.push(
                ValidationIssue::new(
                    IssueType::RepetitiveStructure,
                    Severity::Low,
                    format!("{run} consecutive sentences open with '{word}'"),
                )
                .with_fix("Vary how sentences begin"),
            );
        }
        start = end;
    }
    issues
}

/// Prose where too many sentences use the passive voice.
pub fn check_passive_voice(text: &str) -> Vec<ValidationIssue> {
    let all = sentences(text);
    if all.len() < 3 {
        return Vec::new();
    }
    let passive = all.iter().filter(|s| PASSIVE_RE.is_match(s)).count();
    if passive as f64 / all.len() as f64 <= PASSIVE_RATIO_LIMIT {
        return Vec::new();
    }
    vec![ValidationIssue::new(
        IssueType::PassiveVoice,
        Severity::Low,
        format!("Heavy use of passive voice ({passive} of {} sentences)", all.len()),
    )
    .with_fix("Rewrite passive sentences so the actor comes first")]
}

/// Names of the senses a text engages, in fixed order.
pub fn senses_engaged(text: &str) -> Vec<&'static str> {
    SENSES
        .iter()
        .filter(|s| s.pattern.is_match(text))
        .map(|s| s.name)
        .collect()
}

/// Location descriptions that lean on fewer than two senses.
pub fn check_sensory_variety(text: &str) -> Vec<ValidationIssue> {
    let engaged = senses_engaged(text);
    if engaged.len() >= 2 {
        return Vec::new();
    }
    let description = match engaged.first() {
        Some(only) => format!("Location description engages only {only}"),
        None => "Location description engages none of the senses".to_string(),
    };
    vec![ValidationIssue::new(IssueType::SensoryVariety, Severity::Low, description)
        .with_fix("Add a sound, a smell or a texture to ground the scene")]
}

pub struct NarrativeQualityChecker;

impl Checker for NarrativeQualityChecker {
    fn name(&self) -> &str {
        "narrative_quality"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::NarrativeQuality
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue> {
        let text = input.text;
        let config = input.config;

        let mut issues = check_length(text, config.min_response_words, config.max_response_words);
        issues.extend(check_completeness(text));
        issues.extend(check_repetitive_openers(text));
        issues.extend(check_passive_voice(text));
        if input.context.kind == ResponseKind::LocationDescription {
            issues.extend(check_sensory_variety(text));
        }
        issues
    }
}
