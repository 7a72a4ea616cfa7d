//! Combat system
//!
//! Hosts an arena [`Match`] inside a bevy app:
//! - The match lives in the [`ArenaMatch`] resource and advances one tick per
//!   `FixedUpdate` run, at the engine's tick rate
//! - Every notification the match publishes is forwarded as a
//!   [`CombatNotification`] event; presentation reads those and never writes
//!   back into the match
//! - The [`log::CombatLog`] resource is kept up to date from the same stream
//! - A human-controlled slot is driven through the [`PlayerInput`] resource

use std::sync::Arc;

use bevy::prelude::*;

pub mod events;
pub mod log;
pub mod systems;

use crate::arena::ability_config::ArenaContent;
use crate::arena::class_ai::input::{InputCommand, InputHandle};
use crate::arena::combat_core::{Match, MatchSummary};
use crate::arena::constants::TICK_RATE;
use crate::arena::match_config::MatchConfig;
use crate::arena::unit::ActorId;
use events::CombatEvent;
use systems::*;

/// Plugin for the combat system
pub struct ArenaSimPlugin {
    config: MatchConfig,
    content: Arc<ArenaContent>,
}

impl ArenaSimPlugin {
    pub fn new(config: MatchConfig, content: Arc<ArenaContent>) -> Self {
        Self { config, content }
    }
}

impl Plugin for ArenaSimPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CombatNotification>()
            .add_event::<MatchFinished>()
            .insert_resource(Time::<Fixed>::from_hz(TICK_RATE as f64))
            .insert_resource(self.config.clone())
            .init_resource::<SimulationSpeed>()
            .add_systems(FixedUpdate, (advance_match, record_combat_log).chain())
            .add_systems(Update, sync_simulation_speed);

        match Match::from_config(&self.config, self.content.clone()) {
            Ok((mut arena, handles)) => {
                arena.enable_event_buffer();
                app.insert_resource(log::CombatLog::for_match(&arena))
                    .insert_resource(PlayerInput { handles })
                    .insert_resource(ArenaMatch(arena));
            }
            Err(e) => {
                error!("Failed to create match: {}", e);
                app.init_resource::<log::CombatLog>();
            }
        }
    }
}

/// The running match.
#[derive(Resource, Deref, DerefMut)]
pub struct ArenaMatch(pub Match);

/// A match notification, stamped with the tick it was published on.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct CombatNotification {
    pub tick: u64,
    pub event: CombatEvent,
}

/// Sent once, on the tick the match ends.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct MatchFinished(pub MatchSummary);

/// Input handles of the human-controlled slots.
#[derive(Resource, Clone, Debug, Default)]
pub struct PlayerInput {
    handles: [Option<InputHandle>; 2],
}

impl PlayerInput {
    pub fn handle(&self, actor: ActorId) -> Option<&InputHandle> {
        self.handles.get(actor.index()).and_then(Option::as_ref)
    }

    /// Push a command for `actor`. Returns false when the slot is not human.
    pub fn send(&self, actor: ActorId, command: InputCommand) -> bool {
        match self.handle(actor) {
            Some(handle) => {
                handle.push(command);
                true
            }
            None => false,
        }
    }
}

/// Controls the speed of the combat simulation
#[derive(Resource)]
pub struct SimulationSpeed {
    /// Speed multiplier (0.0 = paused, 0.5 = half speed, 1.0 = normal, 2.0 = double, 3.0 = triple)
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn half_speed(&mut self) {
        self.multiplier = 0.5;
    }

    pub fn normal_speed(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn double_speed(&mut self) {
        self.multiplier = 2.0;
    }

    pub fn triple_speed(&mut self) {
        self.multiplier = 3.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }
}
