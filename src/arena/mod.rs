//! Arena engine
//!
//! The deterministic duel simulation. Nothing in here depends on a window,
//! a renderer or the ECS scheduler; [`crate::combat`] hosts a [`Match`] inside
//! bevy and [`crate::headless`] drives one directly.

pub mod abilities;
pub mod ability_config;
pub mod auras;
pub mod casting;
pub mod class_ai;
pub mod combat_core;
pub mod constants;
pub mod cooldowns;
pub mod crowd_control;
pub mod formulas;
pub mod geometry;
pub mod hazards;
pub mod lockouts;
pub mod match_config;
pub mod movement;
pub mod resources;
pub mod rng;
pub mod stats;
pub mod terrain;
pub mod unit;
pub mod validation;

pub use abilities::{AbilityDef, AbilityId, Effect, SpellSchool};
pub use ability_config::{ArenaContent, ContentError};
pub use combat_core::{Match, MatchOutcome, MatchSummary};
pub use match_config::{ArenaMap, CharacterClass, ControllerKind, Difficulty, MatchConfig};
pub use unit::{ActorId, Unit};
pub use validation::CastFailure;
