use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;
use readmission_pipeline::utils::logging::console::print_run_summary;
use readmission_pipeline::{Pipeline, PipelineConfig, load_sources, write_outputs};

/// Build the readmission feature table and quality report from Parquet extracts
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding patients, diagnoses, lab_results and medications .parquet files
    #[arg(long, env = "READMISSION_INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory the feature table, metrics and report are written to
    #[arg(long, env = "READMISSION_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (defaults to the number of logical CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Show progress bars
    #[arg(long)]
    progress: bool,
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let start = Instant::now();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.runtime.worker_threads = threads;
    }
    config.runtime.show_progress |= args.progress;
    info!("Configuration:\n{config}");

    let sources = load_sources(&args.input_dir)
        .with_context(|| format!("Failed to load sources from {}", args.input_dir.display()))?;

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let output = pipeline.run(sources).context("Pipeline run failed")?;

    let files = write_outputs(&args.output_dir, &output.gold, &output.quality)
        .with_context(|| format!("Failed to write outputs to {}", args.output_dir.display()))?;
    info!("Feature table written to {}", files.features.display());

    print_run_summary(&output.quality, start.elapsed());
    Ok(())
}
