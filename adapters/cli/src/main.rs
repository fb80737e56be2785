#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays headless Tower Siege matches.

mod config;
mod runner;

use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{config::MatchConfig, runner::RunOptions};

/// Runs a Tower Siege match between computer opponents and prints the outcome.
#[derive(Debug, Parser)]
#[command(name = "tower-siege", version)]
struct Args {
    /// Seed for the layout generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML file overriding `[rules]` and `[opponent]` settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds after which an undecided match is abandoned.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,

    /// Simulated milliseconds advanced per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
}

/// Entry point for the Tower Siege command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load(path)?,
        None => MatchConfig::default(),
    };
    let options = RunOptions {
        seed: args.seed,
        tick: Duration::from_millis(args.tick_ms),
        max_duration: Duration::from_secs(args.max_seconds),
    };

    let summary = runner::run(&config, &options)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
