//! Kinetic CLI
//!
//! Validate animation configs, simulate scroll sessions frame by frame, and
//! submit vitals to the prediction service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kinetic_services::{PredictionClient, PredictionRecord};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod simulate;

use config::KineticConfig;
use simulate::{Simulation, SimulationOptions};

#[derive(Parser)]
#[command(name = "kinetic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-driven animation engine CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a config file and every animation it describes
    Validate {
        /// Config file (defaults to ./kinetic.toml, then built-in)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Scroll through the page headlessly and print the final frame
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value = "600")]
        frames: u64,

        /// Frame rate (overrides [scheduler] fps)
        #[arg(long)]
        fps: Option<u32>,

        /// Pixels scrolled per frame
        #[arg(short, long, default_value = "12")]
        scroll_speed: f32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a vitals record to the prediction service
    Predict {
        /// JSON file with the nine vitals fields
        #[arg(short, long)]
        record: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate { config } => cmd_validate(config.as_deref()),

        Commands::Simulate {
            config,
            frames,
            fps,
            scroll_speed,
            json,
        } => cmd_simulate(config.as_deref(), frames, fps, scroll_speed, json),

        Commands::Predict { record, config } => cmd_predict(&record, config.as_deref()),
    }
}

fn cmd_validate(path: Option<&Path>) -> Result<()> {
    let config = KineticConfig::load(path)?;
    config.validate()?;

    info!(
        "Config OK: {} counters, {} parallax cards, {} reveal lists, {} loops ({} animations)",
        config.counters.len(),
        config.parallax.len(),
        config.reveals.len(),
        config.loops.len(),
        config.animation_count()
    );
    Ok(())
}

fn cmd_simulate(
    path: Option<&Path>,
    frames: u64,
    fps: Option<u32>,
    scroll_speed: f32,
    json: bool,
) -> Result<()> {
    let config = KineticConfig::load(path)?;
    let options = SimulationOptions {
        frames,
        fps: fps.unwrap_or(config.scheduler.fps),
        scroll_speed,
    };

    info!(
        "Simulating {} frames at {} fps, {}px per frame",
        options.frames, options.fps, options.scroll_speed
    );

    let mut simulation = Simulation::build(&config)?;
    let report = simulation.run(options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Frames:     {} ({:.0}ms)", report.frames, report.elapsed_ms);
    println!("Scroll:     {:.0}px", report.scroll_y);
    println!("Indicator:  {:.3}", report.indicator);
    println!();
    println!("Counters:");
    for counter in &report.counters {
        let marker = if counter.settled { "" } else { " (counting)" };
        println!("  {:<28} {}{}", counter.label, counter.text, marker);
    }
    println!();
    println!("Parallax:");
    for (name, values) in &report.parallax {
        let channels: Vec<String> = values
            .iter()
            .map(|(channel, value)| format!("{channel}={value:.3}"))
            .collect();
        println!("  {:<12} {}", name, channels.join(" "));
    }
    println!();
    println!("Reveals:");
    for reveal in &report.reveals {
        println!("  {:<12} {}/{} revealed", reveal.name, reveal.complete, reveal.total);
    }
    println!();
    println!("Loops:");
    for ambient in &report.loops {
        let channels: Vec<String> = ambient
            .values
            .iter()
            .map(|(channel, value)| format!("{channel}={value:.3}"))
            .collect();
        let state = if ambient.running { "" } else { " (done)" };
        println!("  {:<12} {}{}", ambient.name, channels.join(" "), state);
    }
    println!();
    println!("Active subscriptions: {}", report.active_subscriptions);
    if !report.auth_actions.is_empty() {
        println!("Auth actions: {}", report.auth_actions.join(", "));
    }

    Ok(())
}

fn cmd_predict(record_path: &Path, path: Option<&Path>) -> Result<()> {
    let config = KineticConfig::load(path)?;

    let content = fs::read_to_string(record_path)
        .with_context(|| format!("Failed to read {}", record_path.display()))?;
    let record: PredictionRecord = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", record_path.display()))?;

    let settings = &config.prediction;
    let client = PredictionClient::http(&settings.endpoint, settings.timeout())?
        .with_retry(settings.retry());

    info!("Submitting record to {}", settings.endpoint);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    match runtime.block_on(client.predict(&record)) {
        Ok(prediction) => {
            println!("Prediction: {prediction}");
            Ok(())
        }
        Err(e) => {
            error!("Prediction failed: {}", e);
            Err(e.into())
        }
    }
}
