//! Tone: the narrator stays in the world and in its era.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;

use super::{CheckCategory, CheckInput, Checker, IssueType, Severity, ValidationIssue};

static AI_SELF_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:as an ai|as a language model|i am an ai|i'm an ai|an ai language model|large language model|my training data|i (?:cannot|can't) (?:generate|create|continue|roleplay))\b",
    )
    .expect("valid regex")
});
static DM_COMMENTARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:as (?:the|your) (?:dm|gm|dungeon master|game master|narrator)|i(?:'ll| will) (?:let you|allow you)|let me (?:describe|narrate)|i (?:think|decided?) (?:that )?(?:the|your) (?:players?|party))\b",
    )
    .expect("valid regex")
});
static OOC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\(\(|\)\)|\booc\b|\bout of character\b|\[(?:note|dm|gm|ooc)\b[^\]]*\])")
        .expect("valid regex")
});
static ANACHRONISM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:smartphones?|cell ?phones?|phones?|computers?|laptops?|internet|e-?mails?|cars?|trucks?|televisions?|tv|radios?|electricity|light ?bulbs?|guns?|rifles?|pistols?|helicopters?|airplanes?|robots?)\b",
    )
    .expect("valid regex")
});
static SLANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:lol|lmao|omg|btw|tbh|idk)\b").expect("valid regex"));

/// The narrator talking about itself as a model.
pub fn check_ai_self_reference(text: &str) -> Vec<ValidationIssue> {
    AI_SELF_REFERENCE_RE
        .find(text)
        .map(|found| {
            ValidationIssue::new(
                IssueType::MetaNarrative,
                Severity::Critical,
                "Response breaks immersion by referring to itself as an AI",
            )
            .with_evidence(found.as_str())
            .with_fix("Stay in the narrator's voice and never mention being an AI")
        })
        .into_iter()
        .collect()
}

/// First-person game master commentary and out-of-character asides.
pub fn check_meta_commentary(text: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if let Some(found) = DM_COMMENTARY_RE.find(text) {
        issues.push(
            ValidationIssue::new(
                IssueType::MetaNarrative,
                Severity::Medium,
                "Response contains first-person game master commentary",
            )
            .with_evidence(found.as_str())
            .with_fix("Describe the world directly instead of narrating the narrator"),
        );
    }
    if let Some(found) = OOC_RE.find(text) {
        issues.push(
            ValidationIssue::new(
                IssueType::MetaNarrative,
                Severity::Medium,
                "Response contains an out-of-character aside",
            )
            .with_evidence(found.as_str())
            .with_fix("Remove out-of-character notes from the narration"),
        );
    }
    issues
}

/// Modern objects in a pre-modern setting, one issue per distinct term.
pub fn check_anachronisms(text: &str) -> Vec<ValidationIssue> {
    let terms: BTreeSet<String> = ANACHRONISM_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    terms
        .into_iter()
        .map(|term| {
            ValidationIssue::new(
                IssueType::Anachronism,
                Severity::Low,
                format!("'{term}' does not belong in the setting"),
            )
            .with_evidence(term.clone())
            .with_fix(format!("Replace '{term}' with something that fits the era"))
        })
        .collect()
}

/// Casual internet slang.
pub fn check_slang(text: &str) -> Vec<ValidationIssue> {
    SLANG_RE
        .find(text)
        .map(|found| {
            ValidationIssue::new(
                IssueType::ToneInconsistency,
                Severity::Low,
                "Casual internet slang breaks the narrative voice",
            )
            .with_evidence(found.as_str())
        })
        .into_iter()
        .collect()
}

pub struct ToneChecker;

impl Checker for ToneChecker {
    fn name(&self) -> &str {
        "tone"
    }

    fn category(&self) -> CheckCategory {
        CheckCategory::Tone
    }

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue> {
        let text = input.text;
        let mut issues = check_ai_self_reference(text);
        issues.extend(check_meta_commentary(text));
        issues.extend(check_anachronisms(text));
        issues.extend(check_slang(text));
        issues
    }
}
