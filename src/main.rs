use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use pdf_outline::batch::{self, BatchOptions};
use pdf_outline::OutlineConfig;

/// Extract a title and H1-H3 outline from PDFs.
#[derive(Parser)]
#[command(name = "pdf-outline", version)]
struct Args {
    /// A .pdf, a .json span dump, or a directory of them
    #[arg(short, long)]
    input: PathBuf,

    /// Output file, or output directory when the input is a directory
    #[arg(short, long)]
    output: PathBuf,

    /// JSON file overriding heuristic thresholds
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Process directory inputs one at a time
    #[arg(long)]
    sequential: bool,

    /// Write single-line JSON
    #[arg(long)]
    compact: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // lopdf logs every decoded string at info.
    let default_filter = if args.verbose {
        "debug,lopdf=warn"
    } else {
        "info,lopdf=warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &args.config {
        Some(path) => OutlineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OutlineConfig::default(),
    };

    if args.input.is_dir() {
        run_directory(&args, &config)
    } else {
        run_file(&args.input, &args.output, &config, !args.compact)
    }
}

fn run_file(input: &Path, output: &Path, config: &OutlineConfig, pretty: bool) -> Result<()> {
    let outline = batch::process_file(input, config)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    batch::write_outline(&outline, output, pretty)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Successfully processed {}", input.display());
    Ok(())
}

fn run_directory(args: &Args, config: &OutlineConfig) -> Result<()> {
    let options = BatchOptions::default()
        .with_parallel(!args.sequential)
        .with_pretty(!args.compact);
    let report = batch::process_directory(&args.input, &args.output, config, &options)
        .with_context(|| format!("Failed to process directory {}", args.input.display()))?;

    log::info!(
        "Wrote {} outlines, {} failed",
        report.written.len(),
        report.failed.len()
    );
    if !report.is_success() {
        bail!("{} documents failed", report.failed.len());
    }
    Ok(())
}
