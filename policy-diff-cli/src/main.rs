//! policy-diff - expiring vs. renewal policy comparison
//!
//! Usage:
//!   policy-diff compare <EXPIRING> <RENEWAL>     Write a change report
//!   policy-diff eval <EXP_DIR> <REN_DIR> <TRUTH> Score against annotations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use policy_diff::{AlignmentKind, DiffConfig, Pipeline, PolicyKind, Report};
use policy_diff_eval::{default_eval_config, BatchRunner, PlainTextExtractor};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "policy-diff")]
#[command(about = "Paragraph-level change detection between policy documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output, overriding RUST_LOG (default: RUST_LOG, else warn)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare an expiring policy with its renewal
    Compare {
        /// Extracted text of the expiring policy
        expiring: PathBuf,

        /// Extracted text of the renewal policy
        renewal: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comparison policy (exact or threshold)
        #[arg(long)]
        policy: Option<PolicyKind>,

        /// Similarity cutoff in (0, 1]; implies the threshold policy
        #[arg(long)]
        threshold: Option<f64>,

        /// Paragraph alignment (greedy or optimal)
        #[arg(long)]
        alignment: Option<AlignmentKind>,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Html)]
        format: ReportFormat,

        /// Output file (defaults to diff_output.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate detection against annotated policy pairs
    Eval {
        expiring_dir: PathBuf,
        renewal_dir: PathBuf,
        truth_dir: PathBuf,

        /// TOML configuration file (defaults to the threshold policy)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Extension of the extracted text files
        #[arg(long, default_value = "txt")]
        extension: String,

        #[arg(long)]
        threshold: Option<f64>,

        /// Compare pairs in parallel
        #[arg(long)]
        parallel: bool,

        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Html,
    Text,
    Json,
}

impl ReportFormat {
    fn extension(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
        }
    }

    fn render(self, report: &Report) -> Result<String> {
        Ok(match self {
            ReportFormat::Html => report.to_html(),
            ReportFormat::Text => report.to_text(),
            ReportFormat::Json => report.to_json().context("Failed to serialize report")?,
        })
    }
}

fn load_config(path: Option<&Path>, fallback: DiffConfig) -> Result<DiffConfig> {
    match path {
        Some(path) => DiffConfig::load_existing(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(fallback),
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
fn cmd_compare(
    expiring: &Path,
    renewal: &Path,
    config: Option<&Path>,
    policy: Option<PolicyKind>,
    threshold: Option<f64>,
    alignment: Option<AlignmentKind>,
    format: ReportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config, DiffConfig::default())?;
    if let Some(threshold) = threshold {
        config.threshold = threshold;
        config.policy = PolicyKind::Threshold;
    }
    if let Some(policy) = policy {
        config.policy = policy;
    }
    if let Some(alignment) = alignment {
        config.alignment = alignment;
    }
    config.validate()?;
    tracing::debug!(
        policy = ?config.policy,
        threshold = config.threshold,
        alignment = ?config.alignment,
        "resolved configuration"
    );

    let pipeline = Pipeline::from_config(config.build_encoder()?, &config)?;
    let report = pipeline.compare_texts(&read_text(expiring)?, &read_text(renewal)?)?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("diff_output.{}", format.extension())));
    std::fs::write(&output, format.render(&report)?)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let changed = report.changed().count();
    if changed > 0 {
        println!(
            "Changes detected in {} of {} paragraphs",
            changed, report.left_paragraphs
        );
    } else {
        println!("No changes detected");
    }
    println!("Report written to {}", output.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_eval(
    expiring_dir: &Path,
    renewal_dir: &Path,
    truth_dir: &Path,
    config: Option<&Path>,
    extension: &str,
    threshold: Option<f64>,
    parallel: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(config, default_eval_config())?;
    if let Some(threshold) = threshold {
        config.threshold = threshold;
        config.policy = PolicyKind::Threshold;
    }
    config.validate()?;
    tracing::debug!(
        policy = ?config.policy,
        threshold = config.threshold,
        alignment = ?config.alignment,
        "resolved configuration"
    );

    let outcome = BatchRunner::new(config, PlainTextExtractor)
        .with_parallel(parallel)
        .run_dirs(expiring_dir, renewal_dir, truth_dir, extension)?;

    for skipped in &outcome.skipped {
        eprintln!("Skipping {}: {}", skipped.name, skipped.reason);
    }

    let metrics = outcome.metrics()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!();
        print!("{}", metrics.render());
    }
    Ok(())
}

/// `-v` forces debug. Otherwise a non-empty RUST_LOG wins, else warn.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        _ if verbose => EnvFilter::new("debug"),
        Some(spec) if !spec.trim().is_empty() => EnvFilter::new(spec),
        _ => EnvFilter::new("warn"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(cli.verbose, rust_log.as_deref()))
        .init();

    match cli.command {
        Commands::Compare {
            expiring,
            renewal,
            config,
            policy,
            threshold,
            alignment,
            format,
            output,
        } => cmd_compare(
            &expiring,
            &renewal,
            config.as_deref(),
            policy,
            threshold,
            alignment,
            format,
            output,
        ),
        Commands::Eval {
            expiring_dir,
            renewal_dir,
            truth_dir,
            config,
            extension,
            threshold,
            parallel,
            json,
        } => cmd_eval(
            &expiring_dir,
            &renewal_dir,
            &truth_dir,
            config.as_deref(),
            &extension,
            threshold,
            parallel,
            json,
        ),
    }
}
