//! Headless match execution
//!
//! Runs arena matches synchronously without any graphical output, suitable for
//! automated testing and balance sweeps.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bevy::log::{error, info};
use serde::Serialize;
use thiserror::Error;

use crate::arena::ability_config::{ArenaContent, ContentError};
use crate::arena::combat_core::{Match, MatchSummary};
use crate::combat::log::{CombatLog, MatchMetadata, SharedCombatLog};

use super::config::{ConfigError, HeadlessMatchConfig};

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Result of a completed headless match
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub summary: MatchSummary,
    /// Everything the match published, as log entries
    pub combat_log: CombatLog,
    pub metadata: MatchMetadata,
}

/// Run one match to completion and collect its log.
pub fn run_match(config: &HeadlessMatchConfig, content: Arc<ArenaContent>) -> Result<MatchResult, HeadlessError> {
    let match_config = config.to_match_config()?;
    match match_config.seed {
        Some(seed) => info!("Using deterministic RNG with seed: {}", seed),
        None => info!("Using non-deterministic RNG (no seed provided)"),
    }

    let (mut world, _handles) = Match::from_config(&match_config, content)?;
    let combat_log = SharedCombatLog::attach(&mut world);
    let summary = world.run_to_completion();

    match summary.winner {
        Some(winner) => info!(
            "Match ended! {} wins after {:.1}s ({:?})",
            summary.combatants[winner.index()].name,
            summary.duration_secs,
            summary.reason
        ),
        None => info!(
            "Match ended in a DRAW after {:.1}s ({:?})",
            summary.duration_secs, summary.reason
        ),
    }

    Ok(MatchResult {
        metadata: MatchMetadata::from_match(&world, match_config.map.name()),
        combat_log: combat_log.snapshot(),
        summary,
    })
}

/// Run a headless match with the given configuration, printing the outcome and
/// saving the log when an output path is configured.
pub fn run_headless_match(
    config: &HeadlessMatchConfig,
    content: Arc<ArenaContent>,
) -> Result<MatchResult, HeadlessError> {
    println!("Starting headless match simulation...");
    println!("  Combatant 1: {}", config.combatant1);
    println!("  Combatant 2: {}", config.combatant2);
    println!("  Map: {}", config.map);
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let result = run_match(config, content)?;

    match result.summary.winner {
        Some(winner) => println!(
            "Winner: {} after {:.1}s",
            result.summary.combatants[winner.index()].name,
            result.summary.duration_secs
        ),
        None => println!("Draw after {:.1}s", result.summary.duration_secs),
    }
    for combatant in &result.summary.combatants {
        println!(
            "  {}: {:.0}/{:.0} hp, {:.0} damage dealt, {:.0} taken",
            combatant.name,
            combatant.final_health,
            combatant.max_health,
            combatant.stats.damage_dealt,
            combatant.stats.damage_taken
        );
    }

    if let Some(path) = config.output_path.as_deref() {
        match result.combat_log.save_to_file(&result.metadata, Some(path)) {
            Ok(filename) => println!("Match complete. Log saved to: {}", filename),
            Err(e) => eprintln!("Failed to save combat log: {}", e),
        }
    }

    Ok(result)
}

/// Aggregate outcome of a batch of seeded matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Completed matches, in seed order
    pub results: Vec<MatchSummary>,
    /// Wins per combatant slot
    pub wins: [usize; 2],
    pub draws: usize,
    /// Seeds whose match failed or panicked
    pub failed_seeds: Vec<u64>,
}

impl BatchSummary {
    pub fn completed(&self) -> usize {
        self.results.len()
    }

    pub fn average_duration_secs(&self) -> f32 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.duration_secs).sum::<f32>() / self.results.len() as f32
    }

    /// Fraction of completed matches won by `slot`.
    pub fn win_rate(&self, slot: usize) -> f32 {
        match (self.wins.get(slot), self.results.len()) {
            (Some(&wins), total) if total > 0 => wins as f32 / total as f32,
            _ => 0.0,
        }
    }
}

/// Seeds for a batch: `batch_size` consecutive seeds starting at the
/// configured seed (or 0).
pub fn batch_seeds(config: &HeadlessMatchConfig) -> Vec<u64> {
    let start = config.random_seed.unwrap_or(0);
    let count = config.batch_size.unwrap_or(1) as u64;
    (start..start.saturating_add(count)).collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn run_seed(config: &HeadlessMatchConfig, content: &Arc<ArenaContent>, seed: u64) -> Option<MatchSummary> {
    let mut seeded = config.clone();
    seeded.random_seed = Some(seed);
    seeded.output_path = None;

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<MatchSummary, HeadlessError> {
        let match_config = seeded.to_match_config()?;
        let (mut world, _handles) = Match::from_config(&match_config, content.clone())?;
        Ok(world.run_to_completion())
    }));

    match outcome {
        Ok(Ok(summary)) => Some(summary),
        Ok(Err(e)) => {
            error!("Match with seed {} failed: {}", seed, e);
            None
        }
        Err(payload) => {
            error!("Match with seed {} panicked: {}", seed, panic_message(payload.as_ref()));
            None
        }
    }
}

/// Run one match per seed, spread over up to `workers` threads. Matches share
/// nothing but the read-only content; a failing seed is logged and skipped.
pub fn run_batch(
    config: &HeadlessMatchConfig,
    content: Arc<ArenaContent>,
    seeds: &[u64],
    workers: usize,
) -> BatchSummary {
    let workers = workers.clamp(1, seeds.len().max(1));
    let chunk_size = seeds.len().div_ceil(workers).max(1);
    info!("Running {} matches on {} worker(s)", seeds.len(), workers);

    let outcomes: Vec<(u64, Option<MatchSummary>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = seeds
            .chunks(chunk_size)
            .map(|chunk| {
                let content = &content;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&seed| (seed, run_seed(config, content, seed)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(seeds.len());
        for (handle, chunk) in handles.into_iter().zip(seeds.chunks(chunk_size)) {
            match handle.join() {
                Ok(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                Err(payload) => {
                    error!("Batch worker panicked: {}", panic_message(payload.as_ref()));
                    outcomes.extend(chunk.iter().map(|&seed| (seed, None)));
                }
            }
        }
        outcomes
    });

    let mut batch = BatchSummary::default();
    for (seed, outcome) in outcomes {
        match outcome {
            Some(summary) => {
                match summary.winner {
                    Some(winner) => batch.wins[winner.index()] += 1,
                    None => batch.draws += 1,
                }
                batch.results.push(summary);
            }
            None => batch.failed_seeds.push(seed),
        }
    }

    info!(
        "Batch complete: {} matches, wins {:?}, {} draws, {} failed",
        batch.completed(),
        batch.wins,
        batch.draws,
        batch.failed_seeds.len()
    );
    batch
}
