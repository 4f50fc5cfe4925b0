//! Growth Engine: funnel diagnostics and financial projections from the
//! command line.
//!
//! Reads JSON inputs, runs the pure calculators and prints JSON (or
//! delimited text for projections) to stdout. Logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use growth_core::config::AppConfig;
use growth_core::types::{MetricSnapshot, Target};
use growth_funnel::{FunnelAnalyzer, FunnelProfile};
use growth_projection::{summarize, to_delimited, ExportOptions, ProjectionEngine, ProjectionInputs};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "growth-engine")]
#[command(about = "Funnel diagnostics and financial projection engine")]
#[command(version)]
struct Cli {
    /// Optional TOML config file (env vars with GROWTH_ENGINE__ prefix still apply)
    #[arg(long, global = true, env = "GROWTH_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diagnose a funnel snapshot against targets
    Funnel {
        /// MetricSnapshot JSON file
        #[arg(long)]
        snapshot: PathBuf,

        /// JSON array of targets (stage benchmarks are used for missing ones)
        #[arg(long)]
        targets: Option<PathBuf>,

        /// Funnel profile: inside_sales or ecommerce
        #[arg(long, default_value = "inside_sales")]
        profile: FunnelProfile,

        /// Minimum stage volume (overrides config for the chosen profile)
        #[arg(long)]
        min_sample: Option<u64>,
    },
    /// Project monthly financial statements
    Project {
        /// ProjectionInputs JSON file
        #[arg(long)]
        inputs: PathBuf,

        /// Base period label; `YYYY-MM` yields calendar labels
        #[arg(long, default_value = "Base")]
        label: String,

        /// Horizon in months (overrides the inputs file)
        #[arg(long)]
        horizon: Option<u32>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Serialize)]
struct ProjectionReport<'a> {
    #[serde(flatten)]
    projection: &'a growth_projection::Projection,
    insights: Vec<String>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "growth_engine=info,growth_funnel=info,growth_projection=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load config")?;

    match cli.command {
        Command::Funnel {
            snapshot,
            targets,
            profile,
            min_sample,
        } => {
            if let Some(min) = min_sample {
                match profile {
                    FunnelProfile::InsideSales => config.funnel.inside_sales.min_sample = min,
                    FunnelProfile::Ecommerce => config.funnel.ecommerce.min_sample = min,
                }
            }

            let snapshot: MetricSnapshot = read_json(&snapshot)?;
            let targets: Vec<Target> = match targets {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            info!(period = %snapshot.period, targets = targets.len(), "Running funnel diagnosis");

            let diagnosis = FunnelAnalyzer::new(config.funnel.clone())
                .analyze(&snapshot, profile, &targets)?;
            println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        }
        Command::Project {
            inputs,
            label,
            horizon,
            format,
        } => {
            // Fields missing from the inputs file fall back to the config.
            let mut raw: serde_json::Value = read_json(&inputs)?;
            if let Some(obj) = raw.as_object_mut() {
                obj.entry("horizon_months")
                    .or_insert(config.projection.horizon_months.into());
                obj.entry("alerts")
                    .or_insert(serde_json::to_value(config.projection.alerts)?);
            }
            let mut inputs: ProjectionInputs =
                serde_json::from_value(raw).context("invalid projection inputs")?;
            if let Some(h) = horizon {
                inputs.horizon_months = h;
            }
            info!(model = ?inputs.model, horizon = inputs.horizon_months, "Running projection");

            let projection = ProjectionEngine::new(&config.projection).project(&inputs, &label)?;
            match format {
                OutputFormat::Json => {
                    let report = ProjectionReport {
                        projection: &projection,
                        insights: summarize(&projection.months, &projection.alerts),
                    };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Csv => {
                    let options = ExportOptions::from(&config.export);
                    print!("{}", to_delimited(&projection.months, &options)?);
                }
            }
        }
    }

    Ok(())
}
