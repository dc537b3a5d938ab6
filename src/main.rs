//! Mortality Risk Predictor - Main Entry Point
//!
//! Makes sure the classifier is cached locally, collects one form
//! submission and prints the 28-day mortality risk assessment.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mortality_risk_predictor::{
    config::{AppConfig, ConfigSource, LoggingConfig, DEFAULT_CONFIG_PATH},
    feature_extractor::FeatureExtractor,
    form::{FieldKind, FIELDS},
    models::inference::OnnxClassifier,
    models::provisioner::ModelProvisioner,
    session::{render_result, run_session, SubmissionSource},
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mortality-risk", about = "28-day all-cause mortality risk prediction")]
struct Cli {
    /// Configuration file (default: config/config.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the assessment as a JSON record
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Fill in the form interactively (default)
    Form,
    /// Submit the form from a JSON file keyed by field name
    Predict {
        #[arg(long)]
        input: PathBuf,
    },
    /// List the form fields with their bounds and scaling ranges
    Fields,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_source) = match &cli.config {
        Some(path) => (
            AppConfig::load_from_path(path)?,
            ConfigSource::File(path.clone()),
        ),
        None => AppConfig::load()?,
    };
    init_logging(&config.logging)?;
    match &config_source {
        ConfigSource::File(path) => info!(path = %path.display(), "Configuration loaded"),
        ConfigSource::Defaults => {
            debug!(path = DEFAULT_CONFIG_PATH, "No config file, using defaults")
        }
    }

    let command = cli.command.clone().unwrap_or(Command::Form);
    let stdin = std::io::stdin();
    let source = match command {
        Command::Fields => {
            print_fields();
            return Ok(());
        }
        Command::Predict { input } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&text).context("Submission is not valid JSON")?;
            SubmissionSource::Json(value)
        }
        Command::Form => SubmissionSource::Form(stdin.lock()),
    };

    info!(path = %config.model.path.display(), "Starting mortality risk predictor");

    let provisioner = ModelProvisioner::from_config(&config.model);
    let onnx_threads = config.model.onnx_threads;
    // With --json, stdout carries only the JSON document
    let writer: Box<dyn Write> = if cli.json {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    let result = run_session(&provisioner, source, writer, |path| {
        OnnxClassifier::load(path, onnx_threads)
    })
    .await?;

    if !cli.json {
        println!();
        println!("Prediction Result");
    }
    println!("{}", render_result(result.as_ref(), cli.json)?);

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("mortality_risk_predictor={}", logging.level).parse()?)
        .add_directive(format!("mortality_risk={}", logging.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn print_fields() {
    let extractor = FeatureExtractor::new();
    println!(
        "{:<28} {:>16} {:>6} {:>8}   {}",
        "field", "form range", "step", "default", "scaling"
    );
    for spec in FIELDS.iter() {
        let scaling = match extractor.scale_range(spec.name) {
            Some(r) => format!("[{}, {}]", r.min, r.max),
            None => "pass-through".to_string(),
        };
        match spec.kind {
            FieldKind::Number { min, max, step } => println!(
                "{:<28} {:>16} {:>6} {:>8}   {}",
                spec.name,
                format!("[{}, {}]", min, max),
                step,
                min,
                scaling
            ),
            FieldKind::YesNo => println!(
                "{:<28} {:>16} {:>6} {:>8}   {}",
                spec.name, "No/Yes", "-", "No", scaling
            ),
        }
    }
}
