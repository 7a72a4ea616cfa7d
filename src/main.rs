//! arena-duel - deterministic 1v1 arena combat simulator
//!
//! Runs headless matches and seeded batches from a JSON config.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use arena_duel::arena::ability_config::ArenaContent;
use arena_duel::cli::{parse_args, Args};
use arena_duel::headless::{run_batch, run_headless_match, runner::batch_seeds, HeadlessMatchConfig};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let Some(config_path) = args.headless.as_deref() else {
        eprintln!("No mode selected. Pass --headless <CONFIG_FILE> (see --help).");
        std::process::exit(2);
    };

    let mut config = HeadlessMatchConfig::load_from_file(config_path).map_err(|e| e.to_string())?;
    if let Some(output) = &args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(secs) = args.max_duration {
        config.max_duration_secs = secs;
    }
    if let Some(count) = args.batch {
        config.batch_size = Some(count);
    }
    config.validate().map_err(|e| e.to_string())?;

    let content = match &args.content {
        Some(path) => ArenaContent::load_from_file(path),
        None => ArenaContent::bundled(),
    }
    .map_err(|e| e.to_string())?;
    let content = Arc::new(content);

    if config.batch_size.is_some() {
        let seeds = batch_seeds(&config);
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        let batch = run_batch(&config, content, &seeds, workers);
        println!(
            "{} vs {}: {} matches, {} / {} wins, {} draws, {} failed, avg {:.1}s",
            config.combatant1,
            config.combatant2,
            batch.completed(),
            batch.wins[0],
            batch.wins[1],
            batch.draws,
            batch.failed_seeds.len(),
            batch.average_duration_secs()
        );
        if !batch.failed_seeds.is_empty() {
            println!("Failed seeds: {:?}", batch.failed_seeds);
        }
        return Ok(());
    }

    run_headless_match(&config, content).map_err(|e| e.to_string())?;
    Ok(())
}
