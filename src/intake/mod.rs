//! Complaint intake: web form validation, filing and community post promotion

use crate::analysis::Analyzer;
use crate::classifier::ClassificationResult;
use crate::config::{Config, IntakeConfig};
use crate::directory::{Authority, Department, Urgency};
use crate::error::{FieldError, Result, TriageError};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Department used when a promoted post has no classifier department
pub const FALLBACK_DEPARTMENT: Department = Department::Infrastructure;

/// Public complaint identifier, `<PREFIX>-<YEAR>-<NNNN>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComplaintId(String);

impl ComplaintId {
    /// Random id in `PREFIX-YEAR-1000..=9999`
    pub fn generate<R: Rng>(prefix: &str, year: i32, rng: &mut R) -> Self {
        let number: u16 = rng.gen_range(1000..=9999);
        Self(format!("{}-{}-{}", prefix, year, number))
    }

    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || TriageError::InvalidConfigValue {
            path: "complaint_id".to_string(),
            message: format!("Malformed complaint id '{}'", s),
        };

        let mut parts = s.split('-');
        let (Some(prefix), Some(year), Some(number), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let prefix_ok = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_uppercase());
        let digits = |p: &str| p.len() == 4 && p.chars().all(|c| c.is_ascii_digit());
        if prefix_ok && digits(year) && digits(number) {
            Ok(Self(s.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ComplaintId {
    type Error = TriageError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ComplaintId> for String {
    fn from(id: ComplaintId) -> Self {
        id.0
    }
}

/// Where a complaint entered the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintSource {
    WebForm,
    Community,
    Reddit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Open,
}

/// Citizen filing a complaint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submitter {
    pub name: String,
    pub email: String,
}

/// Complaint accepted onto the platform and routed to an authority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiledComplaint {
    pub complaint_id: ComplaintId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub department: Department,
    pub urgency: Urgency,
    pub authority: Authority,
    pub status: ComplaintStatus,
    pub source: ComplaintSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<Submitter>,
    pub filed_at: DateTime<Utc>,
}

/// Web form contents as typed by the citizen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub department: Option<Department>,
    pub urgency: Urgency,
    pub submitted_by: Option<Submitter>,
}

impl Default for ComplaintForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            department: None,
            urgency: Urgency::Medium,
            submitted_by: None,
        }
    }
}

impl ComplaintForm {
    /// Fill department and urgency from a classification
    ///
    /// The department is only replaced when the classifier found one.
    pub fn apply_suggestion(&mut self, suggestion: &ClassificationResult) {
        if let Some(department) = suggestion.department {
            self.department = Some(department);
        }
        self.urgency = suggestion.urgency;
    }
}

/// Post written on the community board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub author: String,
    pub text: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Validates and files complaints
#[derive(Clone)]
pub struct Intake {
    analyzer: Analyzer,
    limits: IntakeConfig,
    id_prefix: String,
}

impl Intake {
    pub fn new(analyzer: Analyzer, config: &Config) -> Self {
        Self {
            analyzer,
            limits: config.intake.clone(),
            id_prefix: config.dispatch.complaint_id_prefix.clone(),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Every field problem in the form, in form order
    pub fn validate(&self, form: &ComplaintForm) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if form.title.trim().chars().count() < self.limits.title_min_chars {
            errors.push(FieldError::new(
                "title",
                format!(
                    "Title must be at least {} characters.",
                    self.limits.title_min_chars
                ),
            ));
        }

        if form.description.trim().chars().count() < self.limits.description_min_chars {
            errors.push(FieldError::new(
                "description",
                format!(
                    "Description must be at least {} characters.",
                    self.limits.description_min_chars
                ),
            ));
        }

        if form.location.trim().is_empty() {
            errors.push(FieldError::new("location", "Please enter a location."));
        }

        if form.department.is_none() {
            errors.push(FieldError::new("department", "Please select a department."));
        }

        let authenticity = self.analyzer.score_authenticity(
            &form.title,
            &form.description,
            Some(form.location.as_str()),
        );
        if authenticity.is_fake {
            errors.push(FieldError::new(
                "authenticity",
                format!(
                    "Flagged as a potential fake complaint ({}). Please revise.",
                    authenticity.reasons.join("; ")
                ),
            ));
        }

        errors
    }

    /// Validate and file a web form complaint
    pub fn file<R: Rng>(
        &self,
        form: &ComplaintForm,
        filed_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<FiledComplaint> {
        let errors = self.validate(form);
        // validate() reports a missing department, so this only fails alongside it
        let (true, Some(department)) = (errors.is_empty(), form.department) else {
            tracing::info!(errors = errors.len(), "Complaint form rejected");
            return Err(TriageError::Intake { errors });
        };

        let complaint = FiledComplaint {
            complaint_id: ComplaintId::generate(&self.id_prefix, filed_at.year(), rng),
            title: form.title.trim().to_string(),
            description: form.description.trim().to_string(),
            location: form.location.trim().to_string(),
            department,
            urgency: form.urgency,
            authority: self.analyzer.rules().directory.authority(department).clone(),
            status: ComplaintStatus::Open,
            source: ComplaintSource::WebForm,
            source_handle: None,
            submitted_by: form.submitted_by.clone(),
            filed_at,
        };

        tracing::info!(
            complaint_id = %complaint.complaint_id,
            department = %complaint.department,
            urgency = %complaint.urgency,
            "Filed complaint"
        );
        Ok(complaint)
    }

    /// Turn a community post into a complaint when it describes a civic issue
    ///
    /// Posts below the community minimum are rejected; non-civic posts stay
    /// on the board and yield `None`.
    pub fn promote_post<R: Rng>(
        &self,
        post: &CommunityPost,
        filed_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<FiledComplaint>> {
        let text = post.text.trim();
        if text.chars().count() < self.limits.community_min_chars {
            return Err(TriageError::Intake {
                errors: vec![FieldError::new(
                    "text",
                    format!(
                        "Post must be at least {} characters.",
                        self.limits.community_min_chars
                    ),
                )],
            });
        }

        let classification = self.analyzer.classify(text, "");
        if !classification.is_civic {
            tracing::debug!(author = %post.author, "Community post is not a civic issue");
            return Ok(None);
        }

        let department = classification.department.unwrap_or(FALLBACK_DEPARTMENT);
        let location = post
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.limits.community_default_location)
            .to_string();

        let complaint = FiledComplaint {
            complaint_id: ComplaintId::generate(&self.id_prefix, filed_at.year(), rng),
            title: preview(text, self.limits.community_title_chars),
            description: text.to_string(),
            location,
            department,
            urgency: classification.urgency,
            authority: self.analyzer.rules().directory.authority(department).clone(),
            status: ComplaintStatus::Open,
            source: ComplaintSource::Community,
            source_handle: Some(post.author.clone()),
            submitted_by: None,
            filed_at,
        };

        tracing::info!(
            complaint_id = %complaint.complaint_id,
            department = %complaint.department,
            "Promoted community post"
        );
        Ok(Some(complaint))
    }
}

/// First `max_chars` characters, trimmed, followed by "..."
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim())
}
