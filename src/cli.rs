//! Command-line interface for arena-duel

use clap::Parser;
use std::path::PathBuf;

/// Deterministic 1v1 arena combat simulator
#[derive(Parser, Debug)]
#[command(name = "arena-duel")]
#[command(about = "Deterministic 1v1 arena combat simulator")]
#[command(version)]
pub struct Args {
    /// Run a headless match with the specified JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the match log (overrides the config's output_path)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum match duration in seconds (overrides the config)
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<f32>,

    /// Run this many seeded matches and report win rates
    #[arg(long, value_name = "N")]
    pub batch: Option<usize>,

    /// Load class and ability content from a RON file instead of the bundled copy
    #[arg(long, value_name = "CONTENT_FILE")]
    pub content: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
