use ab_analysis_core::{CountryRecord, RawEvent};
use anyhow::{Context as _, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod pipeline;

/// Analyze a two-variant conversion experiment and emit a decision report
#[derive(Debug, Parser)]
#[command(name = "ab-analysis")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON array of raw events (user_id, timestamp, group, landing_page, converted)
    #[arg(long, env = "AB_ANALYSIS_EVENTS")]
    events: PathBuf,

    /// JSON array of user countries (user_id, country)
    #[arg(long, env = "AB_ANALYSIS_COUNTRIES")]
    countries: PathBuf,

    /// Configuration file layered over config/default and config/local
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write raw posterior draws for plotting
    #[arg(long)]
    posterior: Option<PathBuf>,

    /// Override the posterior sampling seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::AnalysisConfig::load(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.bayesian.seed = seed;
    }

    // Logs go to stderr so the report can be piped from stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ab_analysis={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(seed = config.bayesian.seed, "Configuration loaded");

    let events: Vec<RawEvent> = pipeline::load_rows(&args.events)?;
    let countries: Vec<CountryRecord> = pipeline::load_rows(&args.countries)?;
    tracing::info!(events = events.len(), countries = countries.len(), "Input loaded");

    let output = pipeline::run(&events, &countries, &config)?;
    let report = output.report.to_json().context("Failed to serialize report")?;

    match &args.output {
        Some(path) => {
            fs::write(path, &report)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            tracing::info!(path = ?path, "Report written");
        }
        None => println!("{}", report),
    }

    if let Some(path) = &args.posterior {
        let samples = serde_json::to_string(&output.posterior)
            .context("Failed to serialize posterior samples")?;
        fs::write(path, samples)
            .with_context(|| format!("Failed to write posterior samples to {:?}", path))?;
        tracing::info!(path = ?path, "Posterior samples written");
    }

    Ok(())
}
