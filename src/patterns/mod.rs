//! Rule registry for configuration-driven complaint analysis
//!
//! This module provides:
//! - The `rules.toml` schema (departments, urgency tables, authenticity rules)
//! - Pre-compiled keyword and marker regexes built from that schema
//! - The built-in rule set embedded from `config-templates/rules.toml`

use crate::directory::{Authority, Department, Directory, Urgency};
use crate::error::{Result, TriageError};
use ahash::{HashSet, HashSetExt};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};

const BUILTIN_RULES: &str = include_str!("../../config-templates/rules.toml");

/// Confidence curve for civic classifications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    pub base: u32,
    pub per_hit: u32,
    /// Characters of text per bonus point
    pub length_step: u32,
    pub max_length_bonus: u32,
    pub cap: u32,
    /// Confidence reported for non-civic text
    pub non_civic: u32,
}

/// Thresholds shared by the classifier and authenticity scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum characters for a complaint to count as substantial
    pub min_length: usize,
    /// Letters in a row required for text to count as coherent
    pub coherent_run: usize,
    /// Identical letters in a row that count as noise
    pub repeat_run: usize,
    pub confidence: ConfidenceConfig,
}

/// Urgency keyword tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrgencyConfig {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    #[serde(default)]
    pub low: Vec<String>,
}

/// Authenticity marker tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticityConfig {
    /// Regexes for spam / promotional content
    pub promotional: Vec<String>,
    /// Regexes for joke / test posts
    pub joke: Vec<String>,
    /// Substrings that mark text as civic (English and romanized Hindi)
    pub civic_vocabulary: Vec<String>,
    /// Letters whose runs of `scoring.repeat_run` count as keyboard mashing
    #[serde(default = "default_repeated_letters")]
    pub repeated_letters: Vec<char>,
}

fn default_repeated_letters() -> Vec<char> {
    vec!['a', 'x', 'z']
}

/// One department entry: classification keywords plus who gets notified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentConfig {
    pub name: Department,
    pub keywords: Vec<String>,
    pub authority: Authority,
}

/// Rule file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    pub scoring: ScoringConfig,
    pub urgency: UrgencyConfig,
    pub authenticity: AuthenticityConfig,
    pub department: Vec<DepartmentConfig>,
}

impl RulesConfig {
    /// Parse the rule set shipped with the crate
    pub fn builtin() -> Result<Self> {
        Ok(toml::from_str(BUILTIN_RULES)?)
    }

    /// Raw text of the built-in rule file (used by `config init`)
    pub fn builtin_template() -> &'static str {
        BUILTIN_RULES
    }
}

/// Keyword compiled to a word-bounded regex
#[derive(Debug, Clone)]
pub struct CompiledKeyword {
    pub keyword: String,
    pub regex: Regex,
}

/// Department with its compiled keywords
#[derive(Debug, Clone)]
pub struct CompiledDepartment {
    pub department: Department,
    pub keywords: Vec<CompiledKeyword>,
}

/// Per-department keyword hits for one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentHits<'a> {
    pub department: Department,
    pub keywords: Vec<&'a str>,
}

/// Rule registry with all pre-compiled patterns
#[derive(Debug, Clone)]
pub struct RuleRegistry {
    /// Departments in tie-break priority order
    pub departments: Vec<CompiledDepartment>,
    /// Authority lookup
    pub directory: Directory,
    pub urgency_high: Vec<CompiledKeyword>,
    pub urgency_medium: Vec<CompiledKeyword>,
    pub urgency_low: Vec<CompiledKeyword>,
    pub promotional: Vec<Regex>,
    pub joke: Vec<Regex>,
    pub civic_vocabulary: Vec<String>,
    pub repeated_letters: Vec<char>,
    coherent: Regex,
    pub scoring: ScoringConfig,
}

impl RuleRegistry {
    /// Registry built from the embedded `rules.toml`
    pub fn builtin() -> Result<Self> {
        Self::from_config(RulesConfig::builtin()?)
    }

    /// Load registry from a rule file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to read rules file: {:?}", path),
        })?;
        let config: RulesConfig = toml::from_str(&content)?;
        Self::from_config(config)
    }

    /// Build registry from a parsed rule file
    pub fn from_config(config: RulesConfig) -> Result<Self> {
        Self::validate_scoring(&config.scoring)?;

        let directory = Directory::new(
            config
                .department
                .iter()
                .map(|d| (d.name, d.authority.clone())),
        )?;

        let mut departments: Vec<CompiledDepartment> = config
            .department
            .iter()
            .map(|d| {
                Ok(CompiledDepartment {
                    department: d.name,
                    keywords: compile_keywords(&d.keywords, d.name.name())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Order by enumeration so ties resolve the same way regardless of file order
        departments.sort_by_key(|d| d.department);

        let urgency_high = compile_keywords(&config.urgency.high, "urgency.high")?;
        let urgency_medium = compile_keywords(&config.urgency.medium, "urgency.medium")?;
        let urgency_low = compile_keywords(&config.urgency.low, "urgency.low")?;

        let promotional = compile_markers(&config.authenticity.promotional, "promotional")?;
        let joke = compile_markers(&config.authenticity.joke, "joke")?;

        let civic_vocabulary: Vec<String> = config
            .authenticity
            .civic_vocabulary
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        if civic_vocabulary.is_empty() {
            return Err(TriageError::Rules(
                "authenticity.civic_vocabulary cannot be empty".to_string(),
            ));
        }

        let mut repeated_letters = Vec::new();
        for c in &config.authenticity.repeated_letters {
            if !c.is_alphabetic() {
                return Err(TriageError::Rules(format!(
                    "authenticity.repeated_letters must be letters, got '{}'",
                    c
                )));
            }
            repeated_letters.extend(c.to_lowercase());
        }

        let coherent = Regex::new(&format!(r"\p{{L}}{{{},}}", config.scoring.coherent_run))
            .map_err(|e| TriageError::Rules(format!("Invalid coherent-run pattern: {}", e)))?;

        tracing::debug!(
            departments = departments.len(),
            promotional = promotional.len(),
            joke = joke.len(),
            "Compiled rule registry"
        );

        Ok(Self {
            departments,
            directory,
            urgency_high,
            urgency_medium,
            urgency_low,
            promotional,
            joke,
            civic_vocabulary,
            repeated_letters,
            coherent,
            scoring: config.scoring,
        })
    }

    fn validate_scoring(scoring: &ScoringConfig) -> Result<()> {
        let c = &scoring.confidence;
        if scoring.coherent_run == 0 {
            return Err(TriageError::Rules(
                "scoring.coherent_run must be greater than 0".to_string(),
            ));
        }
        if scoring.repeat_run < 2 {
            return Err(TriageError::Rules(
                "scoring.repeat_run must be at least 2".to_string(),
            ));
        }
        if c.cap > 100 {
            return Err(TriageError::Rules(format!(
                "scoring.confidence.cap must be at most 100, got {}",
                c.cap
            )));
        }
        if c.non_civic > c.cap || c.base > c.cap {
            return Err(TriageError::Rules(
                "scoring.confidence base and non_civic must not exceed cap".to_string(),
            ));
        }
        if c.length_step == 0 {
            return Err(TriageError::Rules(
                "scoring.confidence.length_step must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Departments with at least one keyword present in `text`
    ///
    /// `text` must already be lowercased. Order follows department priority.
    pub fn department_hits<'a>(&'a self, text: &str) -> Vec<DepartmentHits<'a>> {
        self.departments
            .iter()
            .filter_map(|d| {
                let keywords: Vec<&str> = d
                    .keywords
                    .iter()
                    .filter(|k| k.regex.is_match(text))
                    .map(|k| k.keyword.as_str())
                    .collect();
                (!keywords.is_empty()).then_some(DepartmentHits {
                    department: d.department,
                    keywords,
                })
            })
            .collect()
    }

    /// Urgency signalled by keywords alone, if any
    pub fn keyword_urgency(&self, text: &str) -> Option<Urgency> {
        let any = |table: &[CompiledKeyword]| table.iter().any(|k| k.regex.is_match(text));

        if any(&self.urgency_high) {
            Some(Urgency::High)
        } else if any(&self.urgency_medium) {
            Some(Urgency::Medium)
        } else if any(&self.urgency_low) {
            Some(Urgency::Low)
        } else {
            None
        }
    }

    pub fn is_promotional(&self, text: &str) -> bool {
        self.promotional.iter().any(|r| r.is_match(text))
    }

    pub fn is_joke(&self, text: &str) -> bool {
        self.joke.iter().any(|r| r.is_match(text))
    }

    /// Whether a listed letter repeats `repeat_run` or more times in a row
    ///
    /// `text` must already be lowercased. Other letters never count, so Roman
    /// numerals ("phase iii") and "www" are left alone.
    pub fn has_repeated_letters(&self, text: &str) -> bool {
        let mut prev: Option<char> = None;
        let mut run = 0usize;

        for c in text.chars() {
            run = if Some(c) == prev { run + 1 } else { 1 };
            if run >= self.scoring.repeat_run && self.repeated_letters.contains(&c) {
                return true;
            }
            prev = Some(c);
        }
        false
    }

    /// Whether text contains a run of `coherent_run` letters
    pub fn is_coherent(&self, text: &str) -> bool {
        self.coherent.is_match(text)
    }

    /// Whether text mentions any civic vocabulary (substring match)
    pub fn has_civic_vocabulary(&self, text: &str) -> bool {
        self.civic_vocabulary.iter().any(|w| text.contains(w.as_str()))
    }
}

/// Compile keywords into `\b<keyword>(s|es)?\b` regexes, deduplicated
fn compile_keywords(keywords: &[String], owner: &str) -> Result<Vec<CompiledKeyword>> {
    let mut seen = HashSet::new();
    let mut compiled = Vec::with_capacity(keywords.len());

    for raw in keywords {
        let keyword = raw.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(TriageError::Rules(format!("Empty keyword in '{}'", owner)));
        }
        if !seen.insert(keyword.clone()) {
            continue;
        }

        let pattern = format!(r"\b{}(?:s|es)?\b", regex::escape(&keyword));
        let regex = Regex::new(&pattern).map_err(|e| {
            TriageError::Rules(format!("Invalid keyword '{}' in '{}': {}", keyword, owner, e))
        })?;
        compiled.push(CompiledKeyword { keyword, regex });
    }

    Ok(compiled)
}

/// Compile case-insensitive marker regexes
fn compile_markers(patterns: &[String], owner: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    TriageError::Rules(format!("Invalid {} pattern '{}': {}", owner, p, e))
                })
        })
        .collect()
}

/// Process-wide registry built from the embedded rule file
pub fn default_registry() -> Arc<RuleRegistry> {
    static REGISTRY: OnceLock<Arc<RuleRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| {
            Arc::new(RuleRegistry::builtin().expect("embedded rules.toml must compile"))
        })
        .clone()
}
