//! CLI command definitions and parsing
use crate::directory::{Department, Urgency};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "civic-triage",
    version,
    author = "neur0map",
    about = "Rule-based triage for citizen civic complaints",
    long_about = "civic-triage classifies citizen complaints into municipal departments, \
                  flags fake or low-quality submissions, files complaints with the responsible \
                  authority and triages scraped social media posts."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/civic-triage/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rules file overriding the one named in the config
    #[arg(short, long, global = true, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Suggest a department and urgency for a complaint
    Classify {
        /// Complaint title
        title: String,

        /// Complaint description
        #[arg(default_value = "")]
        body: String,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Check whether a complaint looks fake
    Check {
        /// Complaint title
        title: String,

        /// Complaint description
        #[arg(default_value = "")]
        body: String,

        /// Reported location
        #[arg(short, long)]
        location: Option<String>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Validate and file a complaint, printing the dispatch email
    File {
        /// Complaint title
        #[arg(short, long)]
        title: String,

        /// Complaint description
        #[arg(short, long)]
        description: String,

        /// Location of the issue
        #[arg(short, long)]
        location: String,

        /// Department (defaults to the classifier's suggestion)
        #[arg(long)]
        department: Option<Department>,

        /// Urgency (defaults to the classifier's suggestion)
        #[arg(short, long)]
        urgency: Option<Urgency>,

        /// Citizen name
        #[arg(long)]
        name: Option<String>,

        /// Citizen email
        #[arg(long)]
        email: Option<String>,

        /// Write the dispatch email as an .eml file
        #[arg(long, value_name = "FILE")]
        eml: Option<PathBuf>,
    },

    /// Triage a JSON array of scraped posts
    Feed {
        /// Path to the posts file (`-` for stdin)
        input: PathBuf,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration and rules files
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration and rules
    Init {
        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
