//! Correction Suggester - advisory notes appended to a response.
//!
//! The response text itself is never rewritten. Issues are listed most severe
//! first; issues of equal severity keep the order the checkers emitted them in.

use crate::validation::{Severity, ValidationIssue};

/// Heading of the appended block.
pub const SUGGESTIONS_HEADING: &str = "## Suggested Corrections";

#[derive(Debug, Clone)]
pub struct CorrectionSuggester {
    /// Issues below this severity are left out of the block.
    pub min_severity: Severity,
    pub include_evidence: bool,
}

impl Default for CorrectionSuggester {
    fn default() -> Self {
        Self {
            min_severity: Severity::Info,
            include_evidence: true,
        }
    }
}

impl CorrectionSuggester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn without_evidence(mut self) -> Self {
        self.include_evidence = false;
        self
    }

    /// Issues that make it into the block, in display order.
    pub fn ordered<'a>(&self, issues: &'a [ValidationIssue]) -> Vec<&'a ValidationIssue> {
        let mut ordered: Vec<_> = issues
            .iter()
            .filter(|i| i.severity >= self.min_severity)
            .collect();
        ordered.sort_by(|a, b| b.severity.cmp(&a.severity));
        ordered
    }

    fn describe(&self, issue: &ValidationIssue) -> String {
        let mut line = format!("- [{}] {}", issue.severity, issue.description);
        if self.include_evidence {
            if let Some(evidence) = &issue.evidence {
                line.push_str(&format!(" (found: \"{evidence}\")"));
            }
        }
        if let Some(fix) = &issue.suggested_fix {
            line.push_str(&format!(". Fix: {fix}"));
        }
        line
    }

    /// The response followed by a suggestion block, or the response untouched
    /// when nothing qualifies.
    pub fn annotate(&self, text: &str, issues: &[ValidationIssue]) -> String {
        let ordered = self.ordered(issues);
        if ordered.is_empty() {
            return text.to_string();
        }

        let mut annotated = text.trim_end().to_string();
        if !annotated.is_empty() {
            annotated.push_str("\n\n");
        }
        annotated.push_str(SUGGESTIONS_HEADING);
        for issue in ordered {
            annotated.push('\n');
            annotated.push_str(&self.describe(issue));
        }
        annotated.push('\n');
        annotated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::IssueType;

    fn issues() -> Vec<ValidationIssue> {
        vec![
            ValidationIssue::new(IssueType::PassiveVoice, Severity::Low, "Heavy use of passive voice"),
            ValidationIssue::new(IssueType::MetaNarrative, Severity::Critical, "Mentions being an AI")
                .with_evidence("As an AI")
                .with_fix("Stay in character"),
            ValidationIssue::new(IssueType::Anachronism, Severity::Low, "'phone' does not belong"),
            ValidationIssue::new(IssueType::IncompleteResponse, Severity::High, "Ends abruptly"),
        ]
    }

    #[test]
    fn test_no_issues_returns_text_unchanged() {
        let text = "The tavern falls quiet.  \n";
        assert_eq!(CorrectionSuggester::new().annotate(text, &[]), text);
    }

    #[test]
    fn test_annotate_orders_by_severity() {
        let annotated = CorrectionSuggester::new().annotate("The tavern falls quiet.", &issues());
        assert_eq!(
            annotated,
            "The tavern falls quiet.\n\n\
             ## Suggested Corrections\n\
             - [critical] Mentions being an AI (found: \"As an AI\"). Fix: Stay in character\n\
             - [high] Ends abruptly\n\
             - [low] Heavy use of passive voice\n\
             - [low] 'phone' does not belong\n"
        );
    }

    #[test]
    fn test_min_severity_filter() {
        let suggester = CorrectionSuggester::new().with_min_severity(Severity::High).without_evidence();
        let annotated = suggester.annotate("Text.", &issues());
        assert!(annotated.contains("- [critical] Mentions being an AI. Fix: Stay in character"));
        assert!(!annotated.contains("[low]"));

        let all = issues();
        assert_eq!(suggester.annotate("Text.", &all[..1]), "Text.");
    }

    #[test]
    fn test_empty_text_gets_only_block() {
        let annotated = CorrectionSuggester::new().annotate("", &issues()[3..]);
        assert_eq!(annotated, "## Suggested Corrections\n- [high] Ends abruptly\n");
    }
}
