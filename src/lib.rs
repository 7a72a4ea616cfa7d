//! arena-duel - deterministic 1v1 arena combat engine
//!
//! Two combatants, one fixed-timestep simulation: auras, crowd control with
//! diminishing returns, casts and channels, line of sight, scripted and human
//! decision makers. The engine lives in [`arena`]; [`combat`] hosts it in a
//! bevy app and [`headless`] runs it to completion from a JSON config.
//!
//! This library exposes the core modules for testing and reuse.

pub mod arena;
pub mod cli;
pub mod combat;
pub mod headless;

// Re-export commonly used types
pub use arena::{ArenaContent, CharacterClass, Match, MatchConfig, MatchSummary};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::ArenaSimPlugin;
pub use headless::HeadlessMatchConfig;
