//! Configuration management for civic-triage
//!
//! `config.toml` holds intake, feed and dispatch settings plus an optional
//! path to a custom `rules.toml`. Without one the embedded rules are used.

use crate::error::{Result, TriageError};
use crate::patterns::RuleRegistry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Environment variable prefix for overrides (`CIVIC_TRIAGE_SECTION__KEY`)
const ENV_PREFIX: &str = "CIVIC_TRIAGE_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    #[serde(default)]
    pub rules: RulesFileConfig,
    pub intake: IntakeConfig,
    pub feed: FeedConfig,
    pub dispatch: DispatchConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Location of the rule table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFileConfig {
    /// Custom rules file; built-in rules when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Complaint form and community post limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub title_min_chars: usize,
    pub description_min_chars: usize,
    /// Shortest community post accepted
    pub community_min_chars: usize,
    /// Characters of a promoted community post used as the complaint title
    #[serde(default = "default_community_title_chars")]
    pub community_title_chars: usize,
    /// Shortest draft worth analysing while the user types
    pub analysis_min_chars: usize,
    /// Location used for community posts without one
    pub community_default_location: String,
}

fn default_community_title_chars() -> usize {
    60
}

/// Social feed import settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Longest title sent in a registration request
    pub registration_title_chars: usize,
    /// Characters of the post used as the imported complaint title
    pub preview_chars: usize,
    /// Location used when a post carries none
    pub default_location: String,
    pub default_author: String,
}

/// Dispatch email settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub platform_name: String,
    pub sender_email: String,
    /// Tracking link; the complaint id is appended
    pub track_url: String,
    pub signature: String,
    /// Offset used for the "FILED ON" timestamp
    pub utc_offset_minutes: i32,
    pub complaint_id_prefix: String,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TriageError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;
        if let Some(dir) = path.parent() {
            config.resolve_rules_file(dir);
        }

        // Apply environment variable overrides
        config.apply_env_overrides();

        // Validate configuration
        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            tracing::warn!(
                "Config file not found at {:?}, using defaults. Run 'civic-triage config init' to create one.",
                path
            );
            let mut config = Config::default();
            config.apply_env_overrides();
            ConfigValidator::validate(&config)?;
            return Ok(config);
        }

        Self::load(&path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Anchor a relative `rules.file` to the config file's directory
    fn resolve_rules_file(&mut self, config_dir: &Path) {
        if let Some(file) = &self.rules.file {
            if file.is_relative() && !file.starts_with("~") && !file.as_os_str().is_empty() {
                self.rules.file = Some(config_dir.join(file));
            }
        }
    }

    /// Build the rule registry this configuration points at
    pub fn rule_registry(&self) -> Result<RuleRegistry> {
        match &self.rules.file {
            Some(path) => {
                let path = expand_home(path)?;
                tracing::info!("Loading rules from {:?}", path);
                RuleRegistry::from_file(&path)
            }
            None => RuleRegistry::builtin(),
        }
    }

    /// Apply environment variable overrides
    /// Environment variables in format: CIVIC_TRIAGE_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        let overrides: Vec<(String, String)> = std::env::vars()
            .filter_map(|(k, v)| k.strip_prefix(ENV_PREFIX).map(|s| (s.to_string(), v)))
            .collect();
        self.apply_overrides(overrides);
    }

    /// Apply `SECTION__KEY` overrides
    pub fn apply_overrides(&mut self, overrides: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in overrides {
            if let Err(e) = self.set_value_from_env(&key, &value) {
                tracing::warn!("Failed to apply env override {}{}: {}", ENV_PREFIX, key, e);
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "RULES__FILE" => {
                self.rules.file = Some(PathBuf::from(value));
            }
            "INTAKE__TITLE_MIN_CHARS" => {
                self.intake.title_min_chars = parse_number(path, value)?;
            }
            "INTAKE__DESCRIPTION_MIN_CHARS" => {
                self.intake.description_min_chars = parse_number(path, value)?;
            }
            "INTAKE__COMMUNITY_MIN_CHARS" => {
                self.intake.community_min_chars = parse_number(path, value)?;
            }
            "FEED__DEFAULT_LOCATION" => {
                self.feed.default_location = value.to_string();
            }
            "DISPATCH__SENDER_EMAIL" => {
                self.dispatch.sender_email = value.to_string();
            }
            "DISPATCH__UTC_OFFSET_MINUTES" => {
                self.dispatch.utc_offset_minutes =
                    value.parse().map_err(|_| TriageError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as minutes", value),
                    })?;
            }
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TriageError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("civic-triage").join("config.toml"))
    }
}

fn parse_number(path: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| TriageError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Cannot parse '{}' as a number", value),
    })
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| TriageError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| TriageError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
            },
            rules: RulesFileConfig::default(),
            intake: IntakeConfig {
                title_min_chars: 10,
                description_min_chars: 30,
                community_min_chars: 20,
                community_title_chars: default_community_title_chars(),
                analysis_min_chars: 15,
                community_default_location: "Delhi".to_string(),
            },
            feed: FeedConfig {
                registration_title_chars: 100,
                preview_chars: 60,
                default_location: "Auto-detected from post".to_string(),
                default_author: "reddit_user".to_string(),
            },
            dispatch: DispatchConfig {
                platform_name: "Civic Mirror Platform".to_string(),
                sender_email: "noreply@civicmirror.in".to_string(),
                track_url: "https://civicmirror.in/track?id=".to_string(),
                signature: "Civic Mirror Automated Dispatch System".to_string(),
                utc_offset_minutes: 330,
                complaint_id_prefix: "CMR".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.intake.title_min_chars = 12;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.intake.title_min_chars, 12);
        assert_eq!(loaded.dispatch.complaint_id_prefix, "CMR");
        assert!(loaded.rules.file.is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, TriageError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(vec![
            ("INTAKE__TITLE_MIN_CHARS".to_string(), "5".to_string()),
            ("FEED__DEFAULT_LOCATION".to_string(), "Noida".to_string()),
            ("INTAKE__DESCRIPTION_MIN_CHARS".to_string(), "lots".to_string()),
        ]);
        assert_eq!(config.intake.title_min_chars, 5);
        assert_eq!(config.feed.default_location, "Noida");
        // Unparseable value leaves the default in place
        assert_eq!(config.intake.description_min_chars, 30);
    }

    #[test]
    fn test_custom_rules_file() {
        let dir = TempDir::new().unwrap();
        let rules_path = dir.path().join("rules.toml");
        std::fs::write(&rules_path, crate::patterns::RulesConfig::builtin_template()).unwrap();

        let mut config = Config::default();
        config.rules.file = Some(rules_path);
        let registry = config.rule_registry().unwrap();
        assert_eq!(registry.departments.len(), 9);
    }

    #[test]
    fn test_relative_rules_file_is_next_to_config() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("cfg");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            nested.join("rules.toml"),
            crate::patterns::RulesConfig::builtin_template(),
        )
        .unwrap();

        let mut config = Config::default();
        config.rules.file = Some(PathBuf::from("rules.toml"));
        let config_path = nested.join("config.toml");
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.rules.file.as_deref(), Some(nested.join("rules.toml").as_path()));
        assert!(loaded.rule_registry().is_ok());
    }

    #[test]
    fn test_home_and_absolute_rules_paths_untouched() {
        let mut config = Config::default();
        config.rules.file = Some(PathBuf::from("~/rules.toml"));
        config.resolve_rules_file(Path::new("/etc/civic-triage"));
        assert_eq!(config.rules.file, Some(PathBuf::from("~/rules.toml")));

        config.rules.file = Some(PathBuf::from("/srv/rules.toml"));
        config.resolve_rules_file(Path::new("/etc/civic-triage"));
        assert_eq!(config.rules.file, Some(PathBuf::from("/srv/rules.toml")));
    }
}
