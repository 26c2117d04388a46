//! Integration tests for config files and custom rule tables on disk

use std::sync::Arc;

use civic_triage::analysis::Analyzer;
use civic_triage::config::Config;
use civic_triage::directory::{Department, Urgency};
use civic_triage::error::TriageError;
use civic_triage::patterns::{RuleRegistry, RulesConfig};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_custom_rules_change_classification() {
    let dir = TempDir::new().unwrap();

    // Teach the Health department about monkeys
    let mut rules = RulesConfig::builtin().unwrap();
    rules
        .department
        .iter_mut()
        .find(|d| d.name == Department::Health)
        .unwrap()
        .keywords
        .push("monkey".to_string());
    let rules_path = write(&dir, "rules.toml", &toml::to_string_pretty(&rules).unwrap());

    let config_toml = format!(
        r#"
[_meta]
schema_version = "1.0.0"

[rules]
file = "{}"

[intake]
title_min_chars = 10
description_min_chars = 30
community_min_chars = 20
analysis_min_chars = 15
community_default_location = "Delhi"

[feed]
registration_title_chars = 100
preview_chars = 60
default_location = "Auto-detected from post"
default_author = "reddit_user"

[dispatch]
platform_name = "Civic Mirror Platform"
sender_email = "noreply@civicmirror.in"
track_url = "https://civicmirror.in/track?id="
signature = "Civic Mirror Automated Dispatch System"
utc_offset_minutes = 330
complaint_id_prefix = "CMR"
"#,
        rules_path.display()
    );
    let config_path = write(&dir, "config.toml", &config_toml);

    let config = Config::load(&config_path).unwrap();
    let analyzer = Analyzer::new(Arc::new(config.rule_registry().unwrap()));

    let result = analyzer.classify("Monkeys", "A monkey troop is attacking people near the colony");
    assert_eq!(result.department, Some(Department::Health));
    assert_eq!(result.urgency, Urgency::Medium);

    // The built-in rules know nothing about monkeys
    assert!(!civic_triage::classify("Monkeys", "A monkey troop near the colony").is_civic);
}

#[test]
fn test_rules_missing_a_department_are_rejected() {
    let dir = TempDir::new().unwrap();

    let mut rules = RulesConfig::builtin().unwrap();
    rules.department.retain(|d| d.name != Department::Traffic);
    let path = write(&dir, "rules.toml", &toml::to_string_pretty(&rules).unwrap());

    let err = RuleRegistry::from_file(&path).unwrap_err();
    assert!(matches!(err, TriageError::Rules(_)), "got {:?}", err);
}

#[test]
fn test_rules_with_bad_regex_are_rejected() {
    let dir = TempDir::new().unwrap();

    let mut rules = RulesConfig::builtin().unwrap();
    rules.authenticity.promotional.push("free(".to_string());
    let path = write(&dir, "rules.toml", &toml::to_string_pretty(&rules).unwrap());

    assert!(RuleRegistry::from_file(&path).is_err());
}

#[test]
fn test_invalid_config_reports_every_problem() {
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.meta.schema_version = "0.9.0".to_string();
    config.feed.preview_chars = 0;
    config.dispatch.track_url = "civicmirror.in/track".to_string();
    let path = dir.path().join("config.toml");
    config.save(&path).unwrap();

    match Config::load(&path) {
        Err(TriageError::ConfigValidation { errors }) => {
            let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
            assert_eq!(
                paths,
                vec![
                    "_meta.schema_version",
                    "feed.preview_chars",
                    "dispatch.track_url"
                ]
            );
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let config = Config::load_or_default(Some(path.as_path())).unwrap();

    assert_eq!(config.intake.title_min_chars, 10);
    assert_eq!(config.dispatch.complaint_id_prefix, "CMR");
    assert_eq!(config.rule_registry().unwrap().departments.len(), 9);
}

#[test]
fn test_every_department_has_an_authority() {
    let registry = RuleRegistry::builtin().unwrap();

    for department in Department::ALL {
        let authority = registry.directory.authority(department);
        assert!(!authority.name.is_empty(), "{}", department);
        assert!(authority.email.contains('@'), "{}", department);
    }
    assert_eq!(Urgency::High.sla_label(), "24 hours");
    assert_eq!(Urgency::Medium.sla_label(), "72 hours");
    assert_eq!(Urgency::Low.sla_label(), "7 days");
}
