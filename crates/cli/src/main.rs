//! Fonttik CLI - accessibility checks for game and UI captures
//!
//! Checks text size, contrast and (optionally) colorblind contrast of images
//! and videos, writing JSON results and annotated outlines next to each input.

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use fonttik_common::Configuration;
use fonttik_core::{collect_inputs, BatchProcessor};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod summary;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Jsonl,
}

#[derive(Parser)]
#[command(
    name = "fonttik",
    version,
    about = "Text size and contrast accessibility checks for images and video",
    after_help = "EXAMPLES:\n  \
                  # Check a screenshot with the default 1080p/720p/... guidelines\n  \
                  fonttik menu.png\n\n  \
                  # Check every capture in a directory on 4 threads\n  \
                  fonttik --threads 4 captures/\n\n  \
                  # Use a configuration file and collect results elsewhere\n  \
                  fonttik --config fonttik.json --output-dir results/ gameplay.mp4"
)]
struct Cli {
    /// Images, videos or directories containing them
    #[arg(value_name = "INPUTS", required = true)]
    inputs: Vec<PathBuf>,

    /// Configuration file (JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory for results (defaults to each input's directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Report failures as warnings
    #[arg(long)]
    fails_as_warnings: bool,

    /// Also simulate colour vision deficiencies for the contrast check
    #[arg(long)]
    colorblind: bool,

    /// Exit with a failure status when any check fails
    #[arg(long)]
    strict: bool,

    /// Summary format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn configuration(&self) -> Result<Configuration> {
        let mut config = match &self.config {
            Some(path) => Configuration::load(path)
                .with_context(|| format!("Failed to read configuration {}", path.display()))?,
            None => Configuration::default(),
        };

        let settings = &mut config.app_settings;
        if let Some(dir) = &self.output_dir {
            settings.output_dir = Some(dir.clone());
        }
        if let Some(threads) = self.threads {
            settings.worker_threads = threads;
        }
        settings.fails_as_warnings |= self.fails_as_warnings;
        config.colorblindness.enabled |= self.colorblind;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = Arc::new(cli.configuration()?);

    let inputs = collect_inputs(&cli.inputs);
    if inputs.is_empty() {
        anyhow::bail!("No supported media files found");
    }
    info!("Checking {} media files", inputs.len());

    let batch = BatchProcessor::new(Arc::clone(&config)).context("Failed to start workers")?;
    let outcomes = batch.process(&inputs);

    match cli.format {
        OutputFormat::Text => summary::print_text(&outcomes),
        OutputFormat::Jsonl => summary::print_jsonl(&outcomes),
    }

    let errors = outcomes.iter().filter(|o| !o.is_processed()).count();
    let failing = outcomes
        .iter()
        .filter(|o| o.is_processed() && !o.passed())
        .count();
    if errors > 0 {
        warn!("{} of {} items could not be processed", errors, outcomes.len());
        return Ok(ExitCode::FAILURE);
    }
    if cli.strict && failing > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
