//! Promo Report - browse promotional item reports from the command line
//!
//! Loads a CSV report, applies filters, and prints regions, items, item
//! details or summary counts as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use promo_report::cli::{self, Args};
use promo_report::{DataLoader, DataSource};
use std::io;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut loader = DataLoader::new();
    let dataset = if args.reads_stdin() {
        let mut stdin = io::stdin().lock();
        loader.load(DataSource::Reader(&mut stdin))
    } else {
        loader.load_csv(&args.path)
    }
    .with_context(|| format!("loading {}", args.path.display()))?;

    let output = cli::run(&args, &dataset)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
