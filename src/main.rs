use chrono::Utc;
use civic_triage::analysis::Analyzer;
use civic_triage::cli::{Cli, Commands, ConfigAction};
use civic_triage::config::{expand_home, Config};
use civic_triage::dispatch::DispatchNotice;
use civic_triage::error::{Result, TriageError};
use civic_triage::feed::{FeedDecision, FeedPost, FeedTriage};
use civic_triage::intake::{ComplaintForm, Intake, Submitter};
use civic_triage::patterns::{RuleRegistry, RulesConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Handle commands
    match cli.command {
        Commands::Classify { title, body, json } => {
            let analyzer = load_analyzer(cli.config.as_deref(), cli.rules)?;
            cmd_classify(&analyzer, &title, &body, json)?;
        }
        Commands::Check {
            title,
            body,
            location,
            json,
        } => {
            let analyzer = load_analyzer(cli.config.as_deref(), cli.rules)?;
            cmd_check(&analyzer, &title, &body, location.as_deref(), json)?;
        }
        Commands::File {
            title,
            description,
            location,
            department,
            urgency,
            name,
            email,
            eml,
        } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let intake = Intake::new(build_analyzer(&config, cli.rules)?, &config);

            let mut form = ComplaintForm {
                title,
                description,
                location,
                ..ComplaintForm::default()
            };
            form.apply_suggestion(&intake.analyzer().classify(&form.title, &form.description));
            if department.is_some() {
                form.department = department;
            }
            if let Some(urgency) = urgency {
                form.urgency = urgency;
            }
            form.submitted_by = name.map(|name| Submitter {
                name,
                email: email.unwrap_or_default(),
            });

            cmd_file(&config, &intake, &form, eml)?;
        }
        Commands::Feed { input, json } => {
            let config = Config::load_or_default(cli.config.as_deref())?;
            let analyzer = build_analyzer(&config, cli.rules)?;
            cmd_feed(&config, analyzer, &input, json)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "civic_triage=debug"
    } else {
        "civic_triage=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_analyzer(config_path: Option<&Path>, rules: Option<PathBuf>) -> Result<Analyzer> {
    let config = Config::load_or_default(config_path)?;
    build_analyzer(&config, rules)
}

fn build_analyzer(config: &Config, rules: Option<PathBuf>) -> Result<Analyzer> {
    let registry = match rules {
        Some(path) => RuleRegistry::from_file(&expand_home(&path)?)?,
        None => config.rule_registry()?,
    };

    Ok(Analyzer::new(Arc::new(registry)).with_analysis_min_chars(config.intake.analysis_min_chars))
}

fn to_json<T: serde::Serialize>(value: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| TriageError::Json {
        source: e,
        context: context.to_string(),
    })
}

fn cmd_classify(analyzer: &Analyzer, title: &str, body: &str, json: bool) -> Result<()> {
    let result = analyzer.classify(title, body);

    if json {
        println!("{}", to_json(&result, "Failed to serialize classification")?);
        return Ok(());
    }

    match result.department {
        Some(department) => {
            let authority = analyzer.rules().directory.authority(department);
            println!("✓ Civic issue detected");
            println!("  Department: {}", department);
            println!("  Authority:  {} ({})", authority.name, authority.email);
        }
        None => println!("✗ No civic issue detected"),
    }
    println!(
        "  Urgency:    {} (SLA {})",
        result.urgency,
        result.urgency.sla_label()
    );
    println!("  Confidence: {}%", result.confidence);

    Ok(())
}

fn cmd_check(
    analyzer: &Analyzer,
    title: &str,
    body: &str,
    location: Option<&str>,
    json: bool,
) -> Result<()> {
    let result = analyzer.score_authenticity(title, body, location);

    if json {
        println!("{}", to_json(&result, "Failed to serialize authenticity result")?);
        return Ok(());
    }

    if result.is_fake {
        println!("✗ Flagged: {}", result.label);
        for reason in &result.reasons {
            println!("  - {}", reason);
        }
    } else {
        println!("✓ {}", result.label);
    }

    Ok(())
}

fn cmd_file(
    config: &Config,
    intake: &Intake,
    form: &ComplaintForm,
    eml: Option<PathBuf>,
) -> Result<()> {
    let complaint = match intake.file(form, Utc::now(), &mut rand::thread_rng()) {
        Ok(complaint) => complaint,
        Err(TriageError::Intake { errors }) => {
            println!("✗ Complaint not filed");
            for error in &errors {
                println!("  {}: {}", error.field, error.message);
            }
            return Err(TriageError::Intake { errors });
        }
        Err(e) => return Err(e),
    };

    let notice = DispatchNotice::new(&complaint, &config.dispatch);
    for step in notice.log_steps() {
        println!("[+{:>4}ms] {}", step.offset_ms, step.text);
    }
    println!();
    println!("{}", notice.plain_text());

    if let Some(path) = eml {
        std::fs::write(&path, notice.eml()).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to write email file: {:?}", path),
        })?;
        println!();
        println!("✓ Email saved to: {}", path.display());
    }

    Ok(())
}

fn cmd_feed(config: &Config, analyzer: Analyzer, input: &Path, json: bool) -> Result<()> {
    let content = if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).map_err(|e| TriageError::Io {
            source: e,
            context: "Failed to read posts from stdin".to_string(),
        })?
    } else {
        std::fs::read_to_string(input).map_err(|e| TriageError::Io {
            source: e,
            context: format!("Failed to read posts file: {:?}", input),
        })?
    };

    let posts: Vec<FeedPost> = serde_json::from_str(&content).map_err(|e| TriageError::Json {
        source: e,
        context: format!("Failed to parse posts from {:?}", input),
    })?;

    let triage = FeedTriage::new(analyzer, config);
    let report = triage.run(&posts, Utc::now(), &mut rand::thread_rng());

    if json {
        println!("{}", to_json(&report, "Failed to serialize feed report")?);
        return Ok(());
    }

    for decision in &report.decisions {
        match decision {
            FeedDecision::Rejected {
                post_id,
                authenticity,
            } => {
                println!("✗ {} rejected: {}", post_id, authenticity.label);
            }
            FeedDecision::Imported {
                post_id,
                complaint,
                notified,
                ..
            } => {
                println!(
                    "✓ {} → {} [{}] {} notified",
                    post_id,
                    complaint.complaint_id,
                    complaint.urgency.as_str().to_uppercase(),
                    notified
                );
            }
        }
    }

    println!();
    let accuracy = report
        .stats
        .accuracy()
        .map_or_else(|| "-".to_string(), |a| format!("{}%", a));
    println!(
        "Scanned: {}  Imported: {}  Rejected: {}  Accuracy: {}",
        report.stats.scanned, report.stats.imported, report.stats.rejected, accuracy
    );

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(config_path.as_deref())?;
            println!("{}", to_json(&config, "Failed to serialize config")?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            let registry = config.rule_registry()?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Departments: {}", registry.departments.len());
            for (department, authority) in registry.directory.iter() {
                println!("    {:<15} → {} <{}>", department.name(), authority.name, authority.email);
            }
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&config_dir).map_err(|e| TriageError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", config_dir),
            })?;

            let rules_path = config_dir.join("rules.toml");
            if force || !rules_path.exists() {
                std::fs::write(&rules_path, RulesConfig::builtin_template()).map_err(|e| {
                    TriageError::Io {
                        source: e,
                        context: format!("Failed to write rules.toml: {:?}", rules_path),
                    }
                })?;
            }

            // Relative to the config file, so the pair can be moved together
            let mut config = Config::default();
            config.rules.file = Some(PathBuf::from("rules.toml"));
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("✓ Rules installed");
            println!("  - rules.toml: Department keywords, authorities and authenticity rules");
        }
    }

    Ok(())
}
