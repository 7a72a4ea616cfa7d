//! Combat systems
//!
//! ECS systems that drive the hosted match.

use bevy::prelude::*;

use super::events::StampedEvent;
use super::log::CombatLog;
use super::{ArenaMatch, CombatNotification, MatchFinished, SimulationSpeed};

/// Advance the match by one tick and forward what it published.
pub fn advance_match(
    arena: Option<ResMut<ArenaMatch>>,
    mut notifications: EventWriter<CombatNotification>,
    mut finished: EventWriter<MatchFinished>,
) {
    let Some(mut arena) = arena else {
        return;
    };
    if arena.is_finished() {
        return;
    }

    arena.tick();

    for StampedEvent { tick, event } in arena.drain_events() {
        notifications.send(CombatNotification { tick, event });
    }

    if let Some(summary) = arena.summary() {
        info!(
            "Match finished after {:.1}s ({:?})",
            summary.duration_secs, summary.reason
        );
        finished.send(MatchFinished(summary));
    }
}

/// Feed forwarded notifications into the combat log
pub fn record_combat_log(
    mut notifications: EventReader<CombatNotification>,
    mut combat_log: ResMut<CombatLog>,
) {
    for notification in notifications.read() {
        combat_log.record(notification.tick, &notification.event);
    }
}

/// Apply the simulation speed to virtual time, which paces `FixedUpdate`.
pub fn sync_simulation_speed(speed: Res<SimulationSpeed>, time: Option<ResMut<Time<Virtual>>>) {
    let Some(mut time) = time else {
        return;
    };
    if !speed.is_changed() {
        return;
    }
    if speed.is_paused() {
        time.pause();
    } else {
        time.unpause();
        time.set_relative_speed(speed.multiplier);
    }
}
