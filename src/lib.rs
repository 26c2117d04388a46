//! civic-triage - rule-based triage for citizen civic complaints
//!
//! Classifies complaint text into a municipal department with an urgency and
//! confidence, flags fake or low-quality submissions, files complaints with
//! the responsible authority and triages scraped social media posts.

pub mod analysis;
pub mod authenticity;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod feed;
pub mod intake;
pub mod patterns;

pub use analysis::{classify, score_authenticity};
pub use error::{Result, TriageError};
