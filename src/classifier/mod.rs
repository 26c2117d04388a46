//! Keyword classifier: department, urgency and confidence for complaint text

use crate::directory::{Department, Urgency};
use crate::patterns::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Classification of one piece of complaint text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_civic: bool,
    /// Only set when `is_civic` is true
    pub department: Option<Department>,
    pub urgency: Urgency,
    /// 0..=100
    pub confidence: u8,
}

/// Stateless classifier over a shared rule registry
#[derive(Clone)]
pub struct Classifier {
    rules: Arc<RuleRegistry>,
}

impl Classifier {
    pub fn new(rules: Arc<RuleRegistry>) -> Self {
        Self { rules }
    }

    /// Classify a complaint from its title and body
    ///
    /// Total over all inputs: empty or nonsense text falls through to the
    /// non-civic result.
    pub fn classify(&self, title: &str, body: &str) -> ClassificationResult {
        let text = normalize(title, body);
        let hits = self.rules.department_hits(&text);
        let confidence_cfg = &self.rules.scoring.confidence;

        // Highest score wins; `hits` is in priority order and max_by_key keeps
        // the last maximum, so search in reverse to keep the first one.
        let winner = hits
            .iter()
            .rev()
            .max_by_key(|h| h.keywords.len())
            .map(|h| h.department);

        let Some(department) = winner else {
            tracing::debug!(chars = text.chars().count(), "No department keywords matched");
            return ClassificationResult {
                is_civic: false,
                department: None,
                urgency: Urgency::Low,
                confidence: confidence_cfg.non_civic as u8,
            };
        };

        let total_hits: usize = hits.iter().map(|h| h.keywords.len()).sum();
        let length_bonus = (text.chars().count() as u32 / confidence_cfg.length_step)
            .min(confidence_cfg.max_length_bonus);
        let confidence = (confidence_cfg.base as usize
            + confidence_cfg.per_hit as usize * total_hits
            + length_bonus as usize)
            .min(confidence_cfg.cap as usize) as u8;

        let urgency = self.rules.keyword_urgency(&text).unwrap_or(Urgency::Medium);

        tracing::debug!(
            department = %department,
            %urgency,
            confidence,
            total_hits,
            "Classified complaint"
        );

        ClassificationResult {
            is_civic: true,
            department: Some(department),
            urgency,
            confidence,
        }
    }
}

/// Join title and body into the lowercased text every rule runs against
pub(crate) fn normalize(title: &str, body: &str) -> String {
    format!("{} {}", title, body).trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::default_registry;

    fn classifier() -> Classifier {
        Classifier::new(default_registry())
    }

    #[test]
    fn test_sanitation_scenario() {
        let result = classifier().classify(
            "",
            "The drain near Lajpat Nagar market has been overflowing... sewage water...",
        );
        assert!(result.is_civic);
        assert_eq!(result.department, Some(Department::Sanitation));
        assert_ne!(result.urgency, Urgency::Low);
    }

    #[test]
    fn test_non_civic_text() {
        let result = classifier().classify("hello", "what a lovely afternoon");
        assert!(!result.is_civic);
        assert_eq!(result.department, None);
        assert_eq!(result.urgency, Urgency::Low);
        assert_eq!(result.confidence, 10);
    }

    #[test]
    fn test_empty_text() {
        let result = classifier().classify("", "");
        assert!(!result.is_civic);
        assert_eq!(result.department, None);
    }

    #[test]
    fn test_tie_goes_to_first_declared_department() {
        // One PWD keyword and one Parks keyword
        let result = classifier().classify("pothole", "next to the bench");
        assert_eq!(result.department, Some(Department::Pwd));

        // One Sanitation keyword and one Electricity keyword
        let result = classifier().classify("garbage", "under the streetlight");
        assert_eq!(result.department, Some(Department::Sanitation));
    }

    #[test]
    fn test_more_hits_beat_priority() {
        let result = classifier().classify(
            "Park is a mess",
            "broken swing, broken slide and a fallen tree near the road",
        );
        assert_eq!(result.department, Some(Department::Parks));
    }

    #[test]
    fn test_confidence_grows_with_hits() {
        let one = classifier().classify("garbage", "");
        let three = classifier().classify("garbage", "drain sewage");
        assert!(three.confidence > one.confidence);
        assert_eq!(one.confidence, 40 + 15);
    }

    #[test]
    fn test_confidence_is_capped() {
        let result = classifier().classify(
            "garbage drain sewage sewer trash smell mosquito dustbin waste kachra",
            &"very long description ".repeat(40),
        );
        assert_eq!(result.confidence, 100);
    }

    #[test]
    fn test_urgency_keywords() {
        let high = classifier().classify("Pothole", "caused an accident yesterday");
        assert_eq!(high.urgency, Urgency::High);

        let medium = classifier().classify("Pothole", "on the main road");
        assert_eq!(medium.urgency, Urgency::Medium);

        let low = classifier().classify("Minor pothole", "on the side lane");
        assert_eq!(low.urgency, Urgency::Low);
    }

    #[test]
    fn test_urgent_words_alone_are_not_civic() {
        let result = classifier().classify("URGENT", "emergency!!!");
        assert!(!result.is_civic);
        assert_eq!(result.urgency, Urgency::Low);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let c = classifier();
        let a = c.classify("Streetlight broken", "dark lane is unsafe at night");
        let b = c.classify("Streetlight broken", "dark lane is unsafe at night");
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_serialized_field_names() {
        let result = classifier().classify("garbage", "");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isCivic"], true);
        assert_eq!(json["department"], "Sanitation");
        assert_eq!(json["urgency"], "medium");
    }
}
