use crate::config::Config;
use crate::error::{Result, TriageError, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_rules(config, &mut errors);
        Self::validate_intake(config, &mut errors);
        Self::validate_feed(config, &mut errors);
        Self::validate_dispatch(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TriageError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_rules(config: &Config, errors: &mut Vec<ValidationError>) {
        // File existence is checked when the registry is loaded; `~` is
        // expanded there too.
        if let Some(path) = &config.rules.file {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::new(
                    "rules.file",
                    "Rules file path cannot be empty",
                ));
            }
        }
    }

    fn validate_intake(config: &Config, errors: &mut Vec<ValidationError>) {
        let intake = &config.intake;

        if intake.title_min_chars == 0 {
            errors.push(ValidationError::new(
                "intake.title_min_chars",
                "Title minimum must be greater than 0",
            ));
        }

        if intake.description_min_chars == 0 {
            errors.push(ValidationError::new(
                "intake.description_min_chars",
                "Description minimum must be greater than 0",
            ));
        }

        if intake.community_title_chars == 0 {
            errors.push(ValidationError::new(
                "intake.community_title_chars",
                "Community title length must be greater than 0",
            ));
        }

        if intake.community_default_location.trim().is_empty() {
            errors.push(ValidationError::new(
                "intake.community_default_location",
                "Default community location cannot be empty",
            ));
        }
    }

    fn validate_feed(config: &Config, errors: &mut Vec<ValidationError>) {
        let feed = &config.feed;

        if feed.preview_chars == 0 {
            errors.push(ValidationError::new(
                "feed.preview_chars",
                "Preview length must be greater than 0",
            ));
        }

        if feed.registration_title_chars < feed.preview_chars {
            errors.push(ValidationError::new(
                "feed.registration_title_chars",
                format!(
                    "Registration title length ({}) must not be shorter than preview length ({})",
                    feed.registration_title_chars, feed.preview_chars
                ),
            ));
        }

        if feed.default_author.trim().is_empty() {
            errors.push(ValidationError::new(
                "feed.default_author",
                "Default author cannot be empty",
            ));
        }
    }

    fn validate_dispatch(config: &Config, errors: &mut Vec<ValidationError>) {
        let dispatch = &config.dispatch;

        if !Self::is_plausible_email(&dispatch.sender_email) {
            errors.push(ValidationError::new(
                "dispatch.sender_email",
                format!("Invalid sender address: {}", dispatch.sender_email),
            ));
        }

        // chrono::FixedOffset accepts strictly less than a day either way
        if dispatch.utc_offset_minutes.abs() >= 24 * 60 {
            errors.push(ValidationError::new(
                "dispatch.utc_offset_minutes",
                format!(
                    "UTC offset must be within ±1439 minutes, got {}",
                    dispatch.utc_offset_minutes
                ),
            ));
        }

        let prefix = &dispatch.complaint_id_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase()) {
            errors.push(ValidationError::new(
                "dispatch.complaint_id_prefix",
                format!("Prefix must be uppercase ASCII letters, got '{}'", prefix),
            ));
        }

        if !dispatch.track_url.starts_with("http://") && !dispatch.track_url.starts_with("https://")
        {
            errors.push(ValidationError::new(
                "dispatch.track_url",
                format!("Tracking URL must be http(s), got '{}'", dispatch.track_url),
            ));
        }
    }

    fn is_plausible_email(s: &str) -> bool {
        match s.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_empty_rules_path() {
        let mut config = Config::default();
        config.rules.file = Some(PathBuf::new());
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = Config::default();
        config.dispatch.sender_email = "nobody".to_string();
        config.dispatch.complaint_id_prefix = "cmr".to_string();
        config.intake.title_min_chars = 0;

        match ConfigValidator::validate(&config) {
            Err(TriageError::ConfigValidation { errors }) => {
                let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "intake.title_min_chars",
                        "dispatch.sender_email",
                        "dispatch.complaint_id_prefix",
                    ]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut config = Config::default();
        config.dispatch.utc_offset_minutes = 24 * 60;
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
