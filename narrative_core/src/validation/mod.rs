//! Validation Pipeline - scores generated text before it reaches the player.
//!
//! A [`Validator`] runs a list of independent [`Checker`]s over the response,
//! each emitting typed [`ValidationIssue`]s. Aggregation is fixed:
//! 1. Start at 100
//! 2. Deduct each issue's severity weight, scaled by how many issues of the
//!    same type came before it (`max(0.5, 1 - (n-1) * 0.2)`)
//! 3. Add the length bonus when the word count sits in the target band
//! 4. Clamp to 0..=100
//!
//! The verdict then applies the pass mark, the non-info issue cap and, unless
//! strictness is low, the critical-issue cap.

mod character;
mod quality;
mod rules;
mod tone;
mod world;

pub use character::*;
pub use quality::*;
pub use rules::*;
pub use tone::*;
pub use world::*;

use game_state::GameStateSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ValidationConfig;

/// How bad an issue is. Ordered from `Info` (least) to `Critical` (most).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Base score deduction for one issue of this severity.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 25.0,
            Severity::High => 15.0,
            Severity::Medium => 8.0,
            Severity::Low => 3.0,
            Severity::Info => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What kind of problem an issue describes. Diminishing returns are counted per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    WorldInconsistency,
    CharacterInconsistency,
    RuleViolation,
    IncompleteResponse,
    LengthIssue,
    RepetitiveStructure,
    PassiveVoice,
    SensoryVariety,
    MetaNarrative,
    ToneInconsistency,
    Anachronism,
}

/// One problem found in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    /// The offending span of the response, when one can be pointed at.
    pub evidence: Option<String>,
    pub suggested_fix: Option<String>,
}

impl ValidationIssue {
    pub fn new(issue_type: IssueType, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            description: description.into(),
            evidence: None,
            suggested_fix: None,
        }
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = Some(fix.into());
        self
    }
}

/// Outcome of one validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Always within 0..=100.
    pub score: u8,
    /// In emission order.
    pub issues: Vec<ValidationIssue>,
    /// Distinct suggested fixes, most severe first.
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    pub fn count_at(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }
}

/// Named threshold profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrictnessLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl StrictnessLevel {
    /// Pass mark used when no explicit minimum score is configured.
    pub fn min_score(&self) -> u8 {
        match self {
            StrictnessLevel::Low => 50,
            StrictnessLevel::Medium => 70,
            StrictnessLevel::High => 85,
        }
    }

    /// Issue types counted as critical regardless of their severity.
    pub fn critical_types(&self) -> &'static [IssueType] {
        match self {
            StrictnessLevel::Low => &[],
            StrictnessLevel::Medium => &[IssueType::MetaNarrative],
            StrictnessLevel::High => &[
                IssueType::MetaNarrative,
                IssueType::RuleViolation,
                IssueType::WorldInconsistency,
            ],
        }
    }

    /// Whether too many critical issues fail a response regardless of score.
    pub fn enforces_critical_override(&self) -> bool {
        !matches!(self, StrictnessLevel::Low)
    }

    pub fn is_critical(&self, issue: &ValidationIssue) -> bool {
        issue.severity == Severity::Critical || self.critical_types().contains(&issue.issue_type)
    }
}

/// Config switch a checker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckCategory {
    WorldConsistency,
    CharacterConsistency,
    RuleAccuracy,
    NarrativeQuality,
    Tone,
}

impl CheckCategory {
    pub fn is_enabled(&self, config: &ValidationConfig) -> bool {
        match self {
            CheckCategory::WorldConsistency => config.check_world_consistency,
            CheckCategory::CharacterConsistency => config.check_character_consistency,
            CheckCategory::RuleAccuracy => config.check_rule_accuracy,
            CheckCategory::NarrativeQuality => config.check_narrative_quality,
            CheckCategory::Tone => config.check_tone,
        }
    }
}

/// What sort of text is being validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[default]
    Narrative,
    LocationDescription,
    Combat,
    Dialogue,
}

/// Per-call information about the response besides its text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub kind: ResponseKind,
    pub player_input: Option<String>,
}

impl ValidationContext {
    pub fn new(kind: ResponseKind) -> Self {
        Self {
            kind,
            player_input: None,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.player_input = Some(input.into());
        self
    }
}

/// Everything a checker may look at.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    pub text: &'a str,
    pub snapshot: Option<&'a GameStateSnapshot>,
    pub context: &'a ValidationContext,
    pub config: &'a ValidationConfig,
}

/// A pure text inspection. Implementations must not panic on any input.
pub trait Checker: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> CheckCategory;

    fn check(&self, input: &CheckInput<'_>) -> Vec<ValidationIssue>;
}

/// The five built-in checkers in their default order.
pub fn default_checkers() -> Vec<Box<dyn Checker>> {
    vec![
        Box::new(WorldConsistencyChecker),
        Box::new(CharacterConsistencyChecker),
        Box::new(RuleAccuracyChecker),
        Box::new(NarrativeQualityChecker),
        Box::new(ToneChecker),
    ]
}

/// `max(0.5, 1 - (n-1) * 0.2)` for the n-th issue (1-based) of a type.
pub fn diminishing_multiplier(n: u32) -> f64 {
    (1.0 - f64::from(n.saturating_sub(1)) * 0.2).max(0.5)
}

/// Deduction applied for each issue, in emission order.
pub fn issue_deductions(issues: &[ValidationIssue]) -> Vec<f64> {
    let mut seen: HashMap<IssueType, u32> = HashMap::new();
    issues
        .iter()
        .map(|issue| {
            let n = seen.entry(issue.issue_type).or_default();
            *n += 1;
            issue.severity.weight() * diminishing_multiplier(*n)
        })
        .collect()
}

/// Aggregate score for a set of issues and a response length.
pub fn score_issues(issues: &[ValidationIssue], word_count: usize, config: &ValidationConfig) -> u8 {
    let mut score = 100.0 - issue_deductions(issues).iter().sum::<f64>();
    if (config.target_min_words..=config.target_max_words).contains(&word_count) {
        score += config.length_bonus;
    }
    score.clamp(0.0, 100.0).round() as u8
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Runs checkers and turns their issues into a verdict.
pub struct Validator {
    config: ValidationConfig,
    checkers: Vec<Box<dyn Checker>>,
}

impl Validator {
    /// A validator with no checkers. Add them with [`Validator::with_checker`].
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            checkers: Vec::new(),
        }
    }

    pub fn with_default_checkers(config: ValidationConfig) -> Self {
        Self {
            config,
            checkers: default_checkers(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::with_default_checkers(ValidationConfig::default())
    }

    pub fn with_checker(mut self, checker: impl Checker + 'static) -> Self {
        self.checkers.push(Box::new(checker));
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: ValidationConfig) {
        self.config = config;
    }

    pub fn checker_names(&self) -> Vec<&str> {
        self.checkers.iter().map(|c| c.name()).collect()
    }

    /// Validate a response. Never fails; bad input simply yields issues.
    pub fn validate(
        &self,
        text: &str,
        snapshot: Option<&GameStateSnapshot>,
        context: &ValidationContext,
    ) -> ValidationResult {
        let config = &self.config;
        let input = CheckInput {
            text,
            snapshot,
            context,
            config,
        };

        let issues: Vec<ValidationIssue> = self
            .checkers
            .iter()
            .filter(|c| c.category().is_enabled(config))
            .flat_map(|c| c.check(&input))
            .collect();

        let words = word_count(text);
        let score = score_issues(&issues, words, config);
        let non_info = issues.iter().filter(|i| i.severity > Severity::Info).count();
        let critical = issues
            .iter()
            .filter(|i| config.strictness.is_critical(i))
            .count();

        let mut is_valid = score >= config.min_score() && non_info <= config.max_issues;
        if config.strictness.enforces_critical_override() && critical > config.max_critical_issues {
            is_valid = false;
        }

        tracing::debug!(
            score,
            is_valid,
            issues = issues.len(),
            critical,
            words,
            "validated response"
        );

        ValidationResult {
            is_valid,
            score,
            suggestions: collect_suggestions(&issues),
            issues,
        }
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("checkers", &self.checker_names())
            .finish()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn collect_suggestions(issues: &[ValidationIssue]) -> Vec<String> {
    let mut ordered: Vec<&ValidationIssue> = issues.iter().collect();
    ordered.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut suggestions: Vec<String> = Vec::new();
    for fix in ordered.iter().filter_map(|i| i.suggested_fix.as_ref()) {
        if !suggestions.contains(fix) {
            suggestions.push(fix.clone());
        }
    }
    suggestions
}

/// Sentences of `text`, split on terminal punctuation, trimmed, non-empty.
pub(crate) fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '…'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(issue_type: IssueType, severity: Severity) -> ValidationIssue {
        ValidationIssue::new(issue_type, severity, "test")
    }

    struct Fixed(Vec<ValidationIssue>, CheckCategory);

    impl Checker for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn category(&self) -> CheckCategory {
            self.1
        }

        fn check(&self, _input: &CheckInput<'_>) -> Vec<ValidationIssue> {
            self.0.clone()
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Low > Severity::Info);
    }

    #[test]
    fn test_diminishing_multiplier() {
        assert_eq!(diminishing_multiplier(1), 1.0);
        assert!((diminishing_multiplier(2) - 0.8).abs() < 1e-9);
        assert!((diminishing_multiplier(3) - 0.6).abs() < 1e-9);
        assert_eq!(diminishing_multiplier(4), 0.5);
        assert_eq!(diminishing_multiplier(40), 0.5);
        assert_eq!(diminishing_multiplier(0), 1.0);
    }

    #[test]
    fn test_deductions_count_per_type() {
        let issues = vec![
            issue(IssueType::PassiveVoice, Severity::Medium),
            issue(IssueType::Anachronism, Severity::Medium),
            issue(IssueType::PassiveVoice, Severity::Medium),
        ];
        let d = issue_deductions(&issues);
        assert_eq!(d[0], 8.0);
        assert_eq!(d[1], 8.0);
        assert!((d[2] - 6.4).abs() < 1e-9);
    }

    #[test]
    fn test_score_clamped() {
        let config = ValidationConfig::default();
        let many: Vec<_> = (0..20)
            .map(|_| issue(IssueType::MetaNarrative, Severity::Critical))
            .collect();
        assert_eq!(score_issues(&many, 100, &config), 0);
        assert_eq!(score_issues(&[], 100, &config), 100);
        assert_eq!(score_issues(&[], 3, &config), 100);
    }

    #[test]
    fn test_length_bonus_offsets_small_issue() {
        let config = ValidationConfig::default();
        let low = [issue(IssueType::PassiveVoice, Severity::Low)];
        assert_eq!(score_issues(&low, 10, &config), 97);
        assert_eq!(score_issues(&low, 60, &config), 100);
        let medium = [issue(IssueType::PassiveVoice, Severity::Medium)];
        assert_eq!(score_issues(&medium, 60, &config), 97);
    }

    #[test]
    fn test_strictness() {
        assert_eq!(StrictnessLevel::default(), StrictnessLevel::Medium);
        assert_eq!(StrictnessLevel::Low.min_score(), 50);
        assert_eq!(StrictnessLevel::High.min_score(), 85);
        assert!(!StrictnessLevel::Low.enforces_critical_override());

        let rule = issue(IssueType::RuleViolation, Severity::Medium);
        assert!(!StrictnessLevel::Medium.is_critical(&rule));
        assert!(StrictnessLevel::High.is_critical(&rule));
        let meta = issue(IssueType::MetaNarrative, Severity::Low);
        assert!(StrictnessLevel::Medium.is_critical(&meta));
        assert!(!StrictnessLevel::Low.is_critical(&meta));
    }

    #[test]
    fn test_critical_override_beats_score() {
        let validator = Validator::new(ValidationConfig::default()).with_checker(Fixed(
            vec![issue(IssueType::WorldInconsistency, Severity::Critical)],
            CheckCategory::WorldConsistency,
        ));
        let result = validator.validate("anything", None, &ValidationContext::default());
        assert_eq!(result.score, 75);
        assert!(result.score >= validator.config().min_score());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_low_strictness_ignores_critical_override() {
        let config = ValidationConfig {
            strictness: StrictnessLevel::Low,
            ..Default::default()
        };
        let validator = Validator::new(config).with_checker(Fixed(
            vec![issue(IssueType::WorldInconsistency, Severity::Critical)],
            CheckCategory::WorldConsistency,
        ));
        assert!(validator.validate("x", None, &ValidationContext::default()).is_valid);
    }

    #[test]
    fn test_max_issues_ignores_info() {
        let config = ValidationConfig {
            max_issues: 2,
            min_validation_score: Some(0),
            ..Default::default()
        };
        let infos: Vec<_> = (0..5).map(|_| issue(IssueType::LengthIssue, Severity::Info)).collect();
        let validator = Validator::new(config.clone()).with_checker(Fixed(infos, CheckCategory::NarrativeQuality));
        assert!(validator.validate("x", None, &ValidationContext::default()).is_valid);

        let lows: Vec<_> = (0..3).map(|_| issue(IssueType::LengthIssue, Severity::Low)).collect();
        let validator = Validator::new(config).with_checker(Fixed(lows, CheckCategory::NarrativeQuality));
        assert!(!validator.validate("x", None, &ValidationContext::default()).is_valid);
    }

    #[test]
    fn test_disabled_category_skipped() {
        let config = ValidationConfig {
            check_tone: false,
            ..Default::default()
        };
        let validator = Validator::new(config).with_checker(Fixed(
            vec![issue(IssueType::MetaNarrative, Severity::Critical)],
            CheckCategory::Tone,
        ));
        let result = validator.validate("", None, &ValidationContext::default());
        assert!(result.issues.is_empty());
        assert_eq!(result.score, 100);
        assert!(result.is_valid);
    }

    #[test]
    fn test_suggestions_sorted_and_deduped() {
        let issues = vec![
            issue(IssueType::PassiveVoice, Severity::Low).with_fix("Use active verbs"),
            issue(IssueType::MetaNarrative, Severity::Critical).with_fix("Stay in character"),
            issue(IssueType::PassiveVoice, Severity::Low).with_fix("Use active verbs"),
        ];
        assert_eq!(collect_suggestions(&issues), vec!["Stay in character", "Use active verbs"]);
    }

    #[test]
    fn test_default_checker_names() {
        let validator = Validator::with_defaults();
        assert_eq!(
            validator.checker_names(),
            vec!["world_consistency", "character_consistency", "rule_accuracy", "narrative_quality", "tone"]
        );
    }

    #[test]
    fn test_sentences() {
        assert_eq!(sentences("One. Two!  Three? "), vec!["One", "Two", "Three"]);
        assert!(sentences("...").is_empty());
    }

    #[test]
    fn test_result_serializes() {
        let result = ValidationResult {
            is_valid: false,
            score: 42,
            issues: vec![issue(IssueType::RuleViolation, Severity::High)],
            suggestions: vec![],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"issue_type\":\"rule_violation\""));
        assert!(json.contains("\"severity\":\"high\""));
    }
}
