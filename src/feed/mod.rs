//! Social feed triage
//!
//! Scans scraped posts one by one: fakes are rejected, genuine posts become
//! complaints routed to the department's authority, together with the
//! registration request the backend expects.

use crate::analysis::Analyzer;
use crate::authenticity::AuthenticityResult;
use crate::classifier::ClassificationResult;
use crate::config::{Config, FeedConfig};
use crate::intake::{
    ComplaintId, ComplaintSource, ComplaintStatus, FiledComplaint, FALLBACK_DEPARTMENT,
};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Scraped post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: String,
    /// Poster handle, e.g. `u/delhi_resident`
    #[serde(default)]
    pub handle: Option<String>,
    pub raw: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// Body of the backend complaint registration call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub reddit_id: String,
    pub title: String,
    pub body: String,
    pub author: String,
    pub permalink: String,
}

/// What happened to one post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedDecision {
    Rejected {
        post_id: String,
        authenticity: AuthenticityResult,
    },
    Imported {
        post_id: String,
        classification: ClassificationResult,
        complaint: Box<FiledComplaint>,
        /// Authority label shown once the notification goes out
        notified: String,
        registration: RegistrationRequest,
    },
}

impl FeedDecision {
    pub fn post_id(&self) -> &str {
        match self {
            FeedDecision::Rejected { post_id, .. } | FeedDecision::Imported { post_id, .. } => {
                post_id
            }
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, FeedDecision::Imported { .. })
    }
}

/// Running counters; `scanned == imported + rejected`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    pub scanned: usize,
    pub imported: usize,
    pub rejected: usize,
}

impl FeedStats {
    /// Imported share of scanned posts as a rounded percentage
    pub fn accuracy(&self) -> Option<u8> {
        if self.scanned == 0 {
            return None;
        }
        let percent = (self.imported * 100 + self.scanned / 2) / self.scanned;
        Some(percent.min(100) as u8)
    }
}

/// Result of triaging a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedReport {
    pub decisions: Vec<FeedDecision>,
    pub stats: FeedStats,
}

impl FeedReport {
    pub fn imported(&self) -> impl Iterator<Item = &FeedDecision> {
        self.decisions.iter().filter(|d| d.is_imported())
    }
}

/// Feed triage over a shared analyzer
#[derive(Clone)]
pub struct FeedTriage {
    analyzer: Analyzer,
    settings: FeedConfig,
    id_prefix: String,
}

impl FeedTriage {
    pub fn new(analyzer: Analyzer, config: &Config) -> Self {
        Self {
            analyzer,
            settings: config.feed.clone(),
            id_prefix: config.dispatch.complaint_id_prefix.clone(),
        }
    }

    /// Triage posts in order
    pub fn run<R: Rng>(&self, posts: &[FeedPost], now: DateTime<Utc>, rng: &mut R) -> FeedReport {
        let mut stats = FeedStats::default();
        let mut decisions = Vec::with_capacity(posts.len());

        for post in posts {
            stats.scanned += 1;
            let decision = self.triage(post, now, rng);
            if decision.is_imported() {
                stats.imported += 1;
            } else {
                stats.rejected += 1;
            }
            decisions.push(decision);
        }

        tracing::info!(
            scanned = stats.scanned,
            imported = stats.imported,
            rejected = stats.rejected,
            "Feed triage complete"
        );
        FeedReport { decisions, stats }
    }

    /// Decide a single post
    pub fn triage<R: Rng>(&self, post: &FeedPost, now: DateTime<Utc>, rng: &mut R) -> FeedDecision {
        let authenticity = self
            .analyzer
            .score_authenticity(&post.raw, "", post.location.as_deref());
        if authenticity.is_fake {
            tracing::debug!(post_id = %post.id, label = %authenticity.label, "Rejected feed post");
            return FeedDecision::Rejected {
                post_id: post.id.clone(),
                authenticity,
            };
        }

        let classification = self.analyzer.classify(&post.raw, "");
        let department = classification.department.unwrap_or(FALLBACK_DEPARTMENT);
        let authority = self.analyzer.rules().directory.authority(department).clone();
        let notified = authority.short_name.clone();

        let author = self.author(post);
        let location = post
            .location
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| self.settings.default_location.clone());

        let complaint = FiledComplaint {
            complaint_id: ComplaintId::generate(&self.id_prefix, now.year(), rng),
            title: format!(
                "{}...",
                strip_hashtags(&take_chars(&post.raw, self.settings.preview_chars))
            ),
            description: strip_hashtags(&post.raw),
            location,
            department,
            urgency: classification.urgency,
            authority,
            status: ComplaintStatus::Open,
            source: ComplaintSource::Reddit,
            source_handle: post.handle.clone(),
            submitted_by: None,
            filed_at: now,
        };

        let registration = RegistrationRequest {
            reddit_id: post.id.clone(),
            title: strip_hashtags(&take_chars(
                &post.raw,
                self.settings.registration_title_chars,
            )),
            body: strip_hashtags(&post.raw),
            author,
            permalink: post.permalink.clone().unwrap_or_default(),
        };

        tracing::debug!(
            post_id = %post.id,
            complaint_id = %complaint.complaint_id,
            department = %department,
            "Imported feed post"
        );

        FeedDecision::Imported {
            post_id: post.id.clone(),
            classification,
            complaint: Box::new(complaint),
            notified,
            registration,
        }
    }

    fn author(&self, post: &FeedPost) -> String {
        post.handle
            .as_deref()
            .map(|h| h.strip_prefix("u/").unwrap_or(h))
            .filter(|h| !h.is_empty())
            .map_or_else(|| self.settings.default_author.clone(), str::to_string)
    }
}

/// Remove `#word` tags and trim the result
pub fn strip_hashtags(text: &str) -> String {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '#' && chars.peek().copied().is_some_and(is_word) {
            while chars.peek().copied().is_some_and(is_word) {
                chars.next();
            }
        } else {
            out.push(c);
        }
    }

    out.trim().to_string()
}

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}
