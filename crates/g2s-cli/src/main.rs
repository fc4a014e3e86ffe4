//! google2snipe CLI
//!
//! Reconciles ChromeOS devices from a Google Workspace directory into a
//! Snipe-IT asset inventory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use g2s_connectors::{
    DirectoryConnector, FileDirectory, GeminiConnector, GoogleDirectoryConnector,
    SnipeItConnector,
};
use g2s_core::{
    normalize_hardware_address, Classification, ModelClassifier, PlannedAction,
    ReferenceResolver, SyncDriver, SyncOptions, SyncReport, UpsertEngine,
};
use g2s_observability::{command_span, init_logging_with_config, SyncMetrics};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, Instrument};

mod config;
mod progress;
mod validator;

use config::AppConfig;
use progress::SyncProgressBar;
use validator::ConfigValidator;

#[derive(Parser)]
#[command(name = "google2snipe")]
#[command(version)]
#[command(about = "Synchronize Google Workspace ChromeOS devices into Snipe-IT", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", default_value = "google2snipe.yaml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every directory device into Snipe-IT
    Sync {
        /// Only compute what would be written
        #[arg(long)]
        dry_run: bool,

        /// Stop after this many devices
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Devices reconciled at the same time
        #[arg(long, value_name = "N", default_value = "1")]
        concurrency: usize,

        /// Read devices from a JSON export instead of the directory API
        #[arg(long, value_name = "PATH")]
        devices_file: Option<PathBuf>,
    },

    /// Validate the configuration
    Validate,

    /// Show the effective configuration
    Config {
        /// Show secrets (use with caution)
        #[arg(long)]
        show_secrets: bool,
    },

    /// Classify a model name into an asset category
    Classify {
        /// Model name as reported by the directory
        model: String,
    },

    /// Print the normalized form of a hardware address
    Normalize {
        /// Hardware address, with or without separators
        address: String,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Sync { .. } => "sync",
            Commands::Validate => "validate",
            Commands::Config { .. } => "config",
            Commands::Classify { .. } => "classify",
            Commands::Normalize { .. } => "normalize",
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_with_env(&cli.config)?;

    init_logging_with_config(
        config.logging_config(cli.verbose, cli.format == OutputFormat::Json),
    )
    .context("Failed to initialize logging")?;

    let span = command_span!(cli.command.name());
    let format = cli.format;

    match cli.command {
        Commands::Sync {
            dry_run,
            limit,
            concurrency,
            devices_file,
        } => {
            let options = SyncOptions {
                concurrency: concurrency.max(1),
                limit,
            };
            cmd_sync(config, dry_run, options, devices_file, format)
                .instrument(span)
                .await
        }
        Commands::Validate => cmd_validate(&config),
        Commands::Config { show_secrets } => cmd_config(&config, show_secrets, format),
        Commands::Classify { model } => {
            cmd_classify(&config, &model, format)
                .instrument(span)
                .await
        }
        Commands::Normalize { address } => cmd_normalize(&address, format),
    }
}

async fn cmd_sync(
    mut config: AppConfig,
    dry_run: bool,
    options: SyncOptions,
    devices_file: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    if devices_file.is_some() {
        config.google.devices_file = devices_file;
    }
    let settings = config.sync_settings(dry_run);

    let validation = ConfigValidator::validate(&config, settings.dry_run);
    if format == OutputFormat::Text || validation.has_errors() {
        validation.print();
    }
    if validation.has_errors() {
        println!();
        println!(
            "{}",
            "Synchronization aborted due to configuration errors.".red().bold()
        );
        return Ok(ExitCode::FAILURE);
    }

    let directory: Arc<dyn DirectoryConnector> = match &config.google.devices_file {
        Some(path) => Arc::new(FileDirectory::new("devices-file", path)),
        None => Arc::new(
            GoogleDirectoryConnector::new(config.google_config())
                .context("Failed to create Google directory connector")?,
        ),
    };
    let snipeit = Arc::new(
        SnipeItConnector::new(config.snipeit_config())
            .context("Failed to create Snipe-IT connector")?,
    );
    let gemini = Arc::new(
        GeminiConnector::new(config.gemini_config())
            .context("Failed to create Gemini connector")?,
    );

    let devices = directory
        .list_devices()
        .await
        .context("Failed to fetch devices")?;
    info!(devices = devices.len(), "Devices fetched");

    let classifier = Arc::new(ModelClassifier::new(gemini, settings.categories.clone()));
    let resolver = Arc::new(ReferenceResolver::new(
        snipeit.clone(),
        classifier,
        settings.clone(),
    ));
    let engine = UpsertEngine::new(snipeit, resolver, settings.clone());
    let driver = SyncDriver::new(engine, options);

    let metrics = SyncMetrics::new();
    let progress = match format {
        OutputFormat::Text => SyncProgressBar::new(settings.dry_run, metrics),
        OutputFormat::Json => SyncProgressBar::hidden(metrics),
    };

    let report = driver.run(devices, &progress).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report, settings.dry_run),
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_report(report: &SyncReport, dry_run: bool) {
    println!();
    if dry_run {
        println!("{}", "Synchronization Summary (dry run)".bold());
    } else {
        println!("{}", "Synchronization Summary".bold());
    }
    println!("───────────────────────");
    println!("Processed: {}", report.processed);
    println!("Created:   {}", report.created.to_string().green());
    println!("Updated:   {}", report.updated.to_string().green());
    println!("Unchanged: {}", report.unchanged);
    if dry_run {
        println!("Planned:   {}", report.planned.to_string().yellow());
    }
    println!("Models:    {} created", report.models_created);
    if report.failed > 0 {
        println!("Failed:    {}", report.failed.to_string().red());
    } else {
        println!("Failed:    {}", report.failed);
    }
    println!("Duration:  {} ms", report.duration_ms);

    if !report.plans.is_empty() {
        println!();
        println!("{}", "Planned Actions:".yellow().bold());
        for plan in &report.plans {
            let action = match &plan.action {
                PlannedAction::Create {
                    model_id: Some(id), ..
                } => format!("create (model {})", id),
                PlannedAction::Create { model_id: None, .. } => {
                    "create (model will be created)".to_string()
                }
                PlannedAction::Update { asset_id, .. } => format!("update asset {}", asset_id),
            };
            println!("  {} {} {}", "•".yellow(), plan.serial, action);
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failures:".red().bold());
        for failure in &report.failures {
            println!(
                "  {} {} [{}] {}",
                "✗".red(),
                failure.serial,
                failure.kind,
                failure.error
            );
        }
    }
}

fn cmd_validate(config: &AppConfig) -> Result<ExitCode> {
    println!("{}", "Validating configuration...".cyan());

    let result = ConfigValidator::validate(config, config.sync.dry_run);
    result.print();

    println!();
    if result.has_errors() {
        println!("{}", "Configuration validation failed.".red().bold());
        Ok(ExitCode::FAILURE)
    } else {
        println!("{}", "Configuration is valid.".green().bold());
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_config(config: &AppConfig, show_secrets: bool, format: OutputFormat) -> Result<ExitCode> {
    let shown = if show_secrets {
        config.clone()
    } else {
        config.redact_secrets()
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&shown)?),
        OutputFormat::Text => print!("{}", serde_yaml::to_string(&shown)?),
    }

    Ok(ExitCode::SUCCESS)
}

async fn cmd_classify(config: &AppConfig, model: &str, format: OutputFormat) -> Result<ExitCode> {
    if config.gemini.api_key.is_empty() {
        anyhow::bail!("Gemini_APIKEY is required to classify models");
    }

    let connector = Arc::new(
        GeminiConnector::new(config.gemini_config())
            .context("Failed to create Gemini connector")?,
    );
    let classifier = ModelClassifier::new(connector, config.sync.categories.clone());
    let classification = classifier
        .classify(model)
        .await
        .with_context(|| format!("Failed to classify '{}'", model))?;

    if format == OutputFormat::Json {
        let output = match &classification {
            Classification::Parsed(label) => {
                serde_json::json!({ "model": model, "category": label })
            }
            Classification::Unparsed(raw) => {
                serde_json::json!({ "model": model, "category": null, "raw": raw })
            }
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &classification {
            Classification::Parsed(label) => println!("{} → {}", model, label.green()),
            Classification::Unparsed(raw) => {
                println!("{} {}", "No category in reply:".yellow(), raw);
            }
        }
    }

    match classification {
        Classification::Parsed(_) => Ok(ExitCode::SUCCESS),
        Classification::Unparsed(_) => Ok(ExitCode::FAILURE),
    }
}

fn cmd_normalize(address: &str, format: OutputFormat) -> Result<ExitCode> {
    let normalized = normalize_hardware_address(Some(address)).unwrap_or_default();

    if format == OutputFormat::Json {
        let output = serde_json::json!({ "input": address, "normalized": normalized });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", normalized);
    }

    Ok(ExitCode::SUCCESS)
}
