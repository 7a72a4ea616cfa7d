//! Headless mode for agentic testing
//!
//! This module runs arena matches without any graphical output, suitable for
//! automated testing, balance sweeps and AI agent integration.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless match
//! cargo run --release -- --headless match_config.json
//!
//! # Run 500 seeded matches
//! cargo run --release -- --headless match_config.json --batch 500
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "combatant1": "Warrior",
//!   "combatant2": "Mage",
//!   "map": "PillaredArena",
//!   "max_duration_secs": 120,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ConfigError, HeadlessMatchConfig};
pub use runner::{run_batch, run_headless_match, run_match, BatchSummary, HeadlessError, MatchResult};
