//! Combined analysis entry points
//!
//! [`classify`] and [`score_authenticity`] run against the built-in rule set.
//! Callers with their own `rules.toml` build an [`Analyzer`] instead.

use crate::authenticity::{AuthenticityResult, AuthenticityScorer};
use crate::classifier::{ClassificationResult, Classifier};
use crate::patterns::{default_registry, RuleRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Draft text shorter than this is not analysed
pub const DEFAULT_ANALYSIS_MIN_CHARS: usize = 15;

/// Classification and authenticity for the same text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub classification: ClassificationResult,
    pub authenticity: AuthenticityResult,
}

/// Classifier and scorer sharing one rule registry
#[derive(Clone)]
pub struct Analyzer {
    rules: Arc<RuleRegistry>,
    classifier: Classifier,
    scorer: AuthenticityScorer,
    analysis_min_chars: usize,
}

impl Analyzer {
    pub fn new(rules: Arc<RuleRegistry>) -> Self {
        Self {
            classifier: Classifier::new(rules.clone()),
            scorer: AuthenticityScorer::new(rules.clone()),
            rules,
            analysis_min_chars: DEFAULT_ANALYSIS_MIN_CHARS,
        }
    }

    /// Override the minimum draft length for [`Analyzer::analyze_draft`]
    pub fn with_analysis_min_chars(mut self, min_chars: usize) -> Self {
        self.analysis_min_chars = min_chars;
        self
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    pub fn classify(&self, title: &str, body: &str) -> ClassificationResult {
        self.classifier.classify(title, body)
    }

    pub fn score_authenticity(
        &self,
        title: &str,
        body: &str,
        location: Option<&str>,
    ) -> AuthenticityResult {
        self.scorer.score(title, body, location)
    }

    /// Run both analyses
    pub fn analyze(&self, title: &str, body: &str, location: Option<&str>) -> Analysis {
        Analysis {
            classification: self.classify(title, body),
            authenticity: self.score_authenticity(title, body, location),
        }
    }

    /// Analyse a form draft, or return `None` while it is still too short
    pub fn analyze_draft(&self, title: &str, body: &str, location: Option<&str>) -> Option<Analysis> {
        let chars = format!("{} {}", title, body).trim().chars().count();
        if chars < self.analysis_min_chars {
            return None;
        }
        Some(self.analyze(title, body, location))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

/// Classify text with the built-in rules
pub fn classify(title: &str, body: &str) -> ClassificationResult {
    Classifier::new(default_registry()).classify(title, body)
}

/// Score text authenticity with the built-in rules
pub fn score_authenticity(title: &str, body: &str, location: Option<&str>) -> AuthenticityResult {
    AuthenticityScorer::new(default_registry()).score(title, body, location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Department;

    #[test]
    fn test_free_functions_match_analyzer() {
        let analyzer = Analyzer::default();
        let title = "Streetlight out";
        let body = "The streetlight near Connaught Place has been broken for 2 weeks";

        assert_eq!(classify(title, body), analyzer.classify(title, body));
        assert_eq!(
            score_authenticity(title, body, None),
            analyzer.score_authenticity(title, body, None)
        );
        assert_eq!(
            classify(title, body).department,
            Some(Department::Electricity)
        );
    }

    #[test]
    fn test_analyze_draft_waits_for_enough_text() {
        let analyzer = Analyzer::default();
        assert!(analyzer.analyze_draft("Pothole", "", None).is_none());
        assert!(analyzer
            .analyze_draft("Pothole on road", "near the school gate", None)
            .is_some());

        let eager = Analyzer::default().with_analysis_min_chars(0);
        assert!(eager.analyze_draft("", "", None).is_some());
    }
}
