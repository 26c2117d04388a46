//! Authenticity scoring: spam, joke and noise detection for complaint text
//!
//! Rules run in a fixed order and every triggered rule contributes one reason.
//! The off-topic rule is a fallback and only fires when nothing else did.

use crate::classifier::normalize;
use crate::patterns::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Label reported for text that passes every rule
pub const GENUINE_LABEL: &str = "Genuine";

/// Individual authenticity rule, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticityRule {
    TooShort,
    Promotional,
    Joke,
    RepeatedCharacters,
    Incoherent,
    OffTopic,
}

impl AuthenticityRule {
    /// Evaluation order
    pub const ORDER: [AuthenticityRule; 6] = [
        AuthenticityRule::TooShort,
        AuthenticityRule::Promotional,
        AuthenticityRule::Joke,
        AuthenticityRule::RepeatedCharacters,
        AuthenticityRule::Incoherent,
        AuthenticityRule::OffTopic,
    ];

    /// Order in which rules compete for the overall label
    const LABEL_PRECEDENCE: [AuthenticityRule; 6] = [
        AuthenticityRule::Promotional,
        AuthenticityRule::Joke,
        AuthenticityRule::Incoherent,
        AuthenticityRule::RepeatedCharacters,
        AuthenticityRule::TooShort,
        AuthenticityRule::OffTopic,
    ];

    pub fn reason(self) -> &'static str {
        match self {
            AuthenticityRule::TooShort => "Too short to be a real complaint",
            AuthenticityRule::Promotional => "Contains spam/promotional links",
            AuthenticityRule::Joke => "Appears to be a test or joke post",
            AuthenticityRule::RepeatedCharacters => "Repeated characters detected",
            AuthenticityRule::Incoherent => "No coherent text found",
            AuthenticityRule::OffTopic => "No civic issue keywords detected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AuthenticityRule::TooShort => "Too Short",
            AuthenticityRule::Promotional => "Spam",
            AuthenticityRule::Joke => "Test Post",
            AuthenticityRule::RepeatedCharacters => "Noise",
            AuthenticityRule::Incoherent => "Gibberish",
            AuthenticityRule::OffTopic => "Off Topic",
        }
    }
}

/// Outcome of authenticity scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticityResult {
    pub is_fake: bool,
    pub label: String,
    /// One reason per triggered rule, in evaluation order
    pub reasons: Vec<String>,
    /// Triggered rules, parallel to `reasons`
    pub triggered: Vec<AuthenticityRule>,
}

impl AuthenticityResult {
    fn from_triggered(triggered: Vec<AuthenticityRule>) -> Self {
        let label = AuthenticityRule::LABEL_PRECEDENCE
            .iter()
            .find(|r| triggered.contains(r))
            .map_or(GENUINE_LABEL, |r| r.label());

        Self {
            is_fake: !triggered.is_empty(),
            label: label.to_string(),
            reasons: triggered.iter().map(|r| r.reason().to_string()).collect(),
            triggered,
        }
    }

    /// Whether a specific rule fired
    pub fn has(&self, rule: AuthenticityRule) -> bool {
        self.triggered.contains(&rule)
    }
}

/// Stateless authenticity scorer over a shared rule registry
#[derive(Clone)]
pub struct AuthenticityScorer {
    rules: Arc<RuleRegistry>,
}

impl AuthenticityScorer {
    pub fn new(rules: Arc<RuleRegistry>) -> Self {
        Self { rules }
    }

    /// Score complaint text
    ///
    /// `location` is accepted so the form and feed call shapes share one
    /// contract; no rule reads it.
    pub fn score(&self, title: &str, body: &str, location: Option<&str>) -> AuthenticityResult {
        let text = normalize(title, body);
        let rules = &self.rules;

        let mut triggered = Vec::new();
        for rule in AuthenticityRule::ORDER {
            let fired = match rule {
                AuthenticityRule::TooShort => text.chars().count() < rules.scoring.min_length,
                AuthenticityRule::Promotional => rules.is_promotional(&text),
                AuthenticityRule::Joke => rules.is_joke(&text),
                AuthenticityRule::RepeatedCharacters => rules.has_repeated_letters(&text),
                AuthenticityRule::Incoherent => !rules.is_coherent(&text),
                AuthenticityRule::OffTopic => {
                    triggered.is_empty() && !rules.has_civic_vocabulary(&text)
                }
            };
            if fired {
                triggered.push(rule);
            }
        }

        let result = AuthenticityResult::from_triggered(triggered);
        tracing::debug!(
            is_fake = result.is_fake,
            label = %result.label,
            reasons = result.reasons.len(),
            location = location.unwrap_or(""),
            "Scored complaint authenticity"
        );
        result
    }
}
