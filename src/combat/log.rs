//! Combat logging
//!
//! Records all combat events for display and post-match analysis. Every entry
//! carries a human-readable message; the ones that matter for aggregation
//! (damage, healing, crowd control, deaths, casts) also carry structured data
//! so queries never have to parse text.
//!
//! The log is fed from the match's notification stream, either through
//! [`CombatLog::record`] or by subscribing a [`SharedCombatLog`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::Resource;
use serde::Serialize;

use super::events::{AuraRemoval, CancelCause, CombatEvent, EventSink, MatchEndReason};
use crate::arena::abilities::AbilityId;
use crate::arena::combat_core::Match;
use crate::arena::constants::ticks_to_secs;
use crate::arena::crowd_control::{CcType, ImmuneReason};
use crate::arena::unit::ActorId;

/// Combatant identity in the log ("Team 1 Warrior").
pub type CombatantId = String;

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Ability used or cast started
    AbilityUsed,
    /// Ability failed validation or was cancelled
    CastFailed,
    /// Cast or channel interrupted
    Interrupt,
    /// Buff/debuff applied
    AuraApplied,
    /// Buff/debuff removed
    AuraRemoved,
    /// Crowd control applied, resisted or broken
    CrowdControl,
    Stealth,
    /// Ground hazard placed or expired
    Hazard,
    /// Combatant died
    Death,
    /// Match event (start, end, etc.)
    MatchEvent,
}

/// Machine-readable payload of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum StructuredEventData {
    Damage {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
    },
    Healing {
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
    },
    CrowdControl {
        source: CombatantId,
        target: CombatantId,
        cc_type: String,
        duration_secs: f32,
    },
    Death {
        victim: CombatantId,
        killer: Option<CombatantId>,
    },
    AbilityCast {
        caster: CombatantId,
        ability: String,
        target: Option<CombatantId>,
        interrupted: bool,
    },
}

/// A single entry in the combat log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatLogEntry {
    /// Timestamp in match time (seconds since match start)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Final state of one combatant, written next to the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombatantMetadata {
    pub name: CombatantId,
    pub class_name: String,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub damage_absorbed: f32,
    pub final_position: (f32, f32, f32),
}

/// Match-level information saved with the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchMetadata {
    pub arena_name: String,
    /// Winning team (1 or 2), `None` for a draw
    pub winner: Option<u8>,
    pub end_reason: Option<MatchEndReason>,
    pub duration_secs: f32,
    pub random_seed: Option<u64>,
    pub team1: Vec<CombatantMetadata>,
    pub team2: Vec<CombatantMetadata>,
}

impl MatchMetadata {
    /// Snapshot a match, finished or not.
    pub fn from_match(world: &Match, arena_name: &str) -> Self {
        let outcome = world.outcome();
        let combatant = |slot: usize| {
            let unit = &world.units()[slot];
            CombatantMetadata {
                name: unit.name.clone(),
                class_name: unit.class.name().to_string(),
                max_health: unit.max_health,
                final_health: unit.health,
                damage_dealt: unit.tally.damage_dealt,
                damage_taken: unit.tally.damage_taken,
                healing_done: unit.tally.healing_done,
                damage_absorbed: unit.tally.damage_absorbed,
                final_position: (unit.position.x, unit.position.y, unit.position.z),
            }
        };
        let ticks = outcome.map_or(world.current_tick(), |o| o.ended_at + 1);
        Self {
            arena_name: arena_name.to_string(),
            winner: outcome.and_then(|o| o.winner).map(|w| w.0 + 1),
            end_reason: outcome.map(|o| o.reason),
            duration_secs: ticks_to_secs(ticks),
            random_seed: world.seed(),
            team1: vec![combatant(0)],
            team2: vec![combatant(1)],
        }
    }
}

#[derive(Serialize)]
struct SavedLog<'a> {
    metadata: &'a MatchMetadata,
    entries: &'a [CombatLogEntry],
}

/// The combat log resource storing all events
#[derive(Resource, Debug, Clone, Default, Serialize)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current match time
    pub match_time: f32,
    /// Registered combatants, in slot order
    combatants: Vec<CombatantId>,
    /// Casts and channels started but not yet resolved, per caster
    #[serde(skip)]
    in_flight: HashMap<CombatantId, AbilityId>,
}

impl CombatLog {
    /// A log with both combatants of `world` registered.
    pub fn for_match(world: &Match) -> Self {
        let mut log = Self::default();
        for unit in world.units() {
            log.register_combatant(unit.name.clone());
        }
        log
    }

    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
        self.combatants.clear();
        self.in_flight.clear();
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None);
    }

    fn push(&mut self, event_type: CombatLogEventType, message: String, data: Option<StructuredEventData>) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
            data,
        });
    }

    pub fn register_combatant(&mut self, id: CombatantId) {
        if !self.combatants.contains(&id) {
            self.combatants.push(id);
        }
    }

    pub fn all_combatants(&self) -> Vec<CombatantId> {
        self.combatants.clone()
    }

    pub fn log_damage(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
        message: String,
    ) {
        let data = StructuredEventData::Damage {
            source,
            target,
            ability,
            amount,
            is_killing_blow,
        };
        self.push(CombatLogEventType::Damage, message, Some(data));
    }

    pub fn log_healing(&mut self, source: CombatantId, target: CombatantId, ability: String, amount: f32, message: String) {
        let data = StructuredEventData::Healing {
            source,
            target,
            ability,
            amount,
        };
        self.push(CombatLogEventType::Healing, message, Some(data));
    }

    pub fn log_crowd_control(
        &mut self,
        source: CombatantId,
        target: CombatantId,
        cc_type: String,
        duration_secs: f32,
        message: String,
    ) {
        let data = StructuredEventData::CrowdControl {
            source,
            target,
            cc_type,
            duration_secs,
        };
        self.push(CombatLogEventType::CrowdControl, message, Some(data));
    }

    pub fn log_death(&mut self, victim: CombatantId, killer: Option<CombatantId>, message: String) {
        let data = StructuredEventData::Death { victim, killer };
        self.push(CombatLogEventType::Death, message, Some(data));
    }

    pub fn log_ability_cast(
        &mut self,
        caster: CombatantId,
        ability: String,
        target: Option<CombatantId>,
        message: String,
    ) {
        let data = StructuredEventData::AbilityCast {
            caster,
            ability,
            target,
            interrupted: false,
        };
        self.push(CombatLogEventType::AbilityUsed, message, Some(data));
    }

    /// Flag the most recent cast of `ability` by `caster` as interrupted.
    pub fn mark_cast_interrupted(&mut self, caster: &str, ability: &str) {
        let latest = self.entries.iter_mut().rev().find_map(|entry| match &mut entry.data {
            Some(StructuredEventData::AbilityCast {
                caster: c,
                ability: a,
                interrupted,
                ..
            }) if c == caster && a == ability => Some(interrupted),
            _ => None,
        });
        if let Some(interrupted) = latest {
            *interrupted = true;
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn data(&self) -> impl Iterator<Item = &StructuredEventData> {
        self.entries.iter().filter_map(|e| e.data.as_ref())
    }

    /// Damage dealt by `source`, per ability name.
    pub fn damage_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::Damage {
                source: s, ability, amount, ..
            } = data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    pub fn total_damage_dealt(&self, source: &str) -> f32 {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::Damage { source: s, amount, .. } if s == source => Some(*amount),
                _ => None,
            })
            .sum()
    }

    pub fn total_damage_taken(&self, target: &str) -> f32 {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::Damage { target: t, amount, .. } if t == target => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Healing done by `source`, per ability name.
    pub fn healing_by_ability(&self, source: &str) -> HashMap<String, f32> {
        let mut totals = HashMap::new();
        for data in self.data() {
            if let StructuredEventData::Healing {
                source: s, ability, amount, ..
            } = data
            {
                if s == source {
                    *totals.entry(ability.clone()).or_insert(0.0) += amount;
                }
            }
        }
        totals
    }

    pub fn total_healing_done(&self, source: &str) -> f32 {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::Healing { source: s, amount, .. } if s == source => Some(*amount),
                _ => None,
            })
            .sum()
    }

    pub fn killing_blows(&self, source: &str) -> usize {
        self.data()
            .filter(|d| {
                matches!(d, StructuredEventData::Damage { source: s, is_killing_blow: true, .. } if s == source)
            })
            .count()
    }

    /// Seconds of crowd control applied by `source`.
    pub fn cc_done_seconds(&self, source: &str) -> f32 {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::CrowdControl {
                    source: s, duration_secs, ..
                } if s == source => Some(*duration_secs),
                _ => None,
            })
            .sum()
    }

    /// Seconds of crowd control suffered by `target`.
    pub fn cc_received_seconds(&self, target: &str) -> f32 {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::CrowdControl {
                    target: t, duration_secs, ..
                } if t == target => Some(*duration_secs),
                _ => None,
            })
            .sum()
    }

    /// Crowd control entries that landed on `target`, as (kind, seconds).
    pub fn cc_applied_to(&self, target: &str) -> Vec<(&str, f32)> {
        self.data()
            .filter_map(|d| match d {
                StructuredEventData::CrowdControl {
                    target: t,
                    cc_type,
                    duration_secs,
                    ..
                } if t == target => Some((cc_type.as_str(), *duration_secs)),
                _ => None,
            })
            .collect()
    }

    pub fn combatant_survived(&self, id: &str) -> bool {
        !self
            .data()
            .any(|d| matches!(d, StructuredEventData::Death { victim, .. } if victim == id))
    }

    /// Cast timeline of `caster` as (time, ability, interrupted).
    pub fn ability_casts_for(&self, caster: &str) -> Vec<(f32, &str, bool)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::AbilityCast {
                    caster: c,
                    ability,
                    interrupted,
                    ..
                }) if c == caster => Some((e.timestamp, ability.as_str(), *interrupted)),
                _ => None,
            })
            .collect()
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write metadata and entries as pretty JSON. Without a path the file goes
    /// to `match_logs/` with a timestamped name. Returns the path written.
    pub fn save_to_file(&self, metadata: &MatchMetadata, path: Option<&str>) -> std::io::Result<String> {
        let filename = match path {
            Some(path) => path.to_string(),
            None => {
                let stamp = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or_default();
                format!("match_logs/match_{}.json", stamp)
            }
        };
        if let Some(dir) = Path::new(&filename).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let saved = SavedLog {
            metadata,
            entries: &self.entries,
        };
        let json = serde_json::to_string_pretty(&saved).map_err(std::io::Error::other)?;
        std::fs::write(&filename, json)?;
        Ok(filename)
    }

    // ------------------------------------------------------------------
    // Notification intake
    // ------------------------------------------------------------------

    fn name(&self, actor: ActorId) -> CombatantId {
        self.combatants
            .get(actor.index())
            .cloned()
            .unwrap_or_else(|| format!("Combatant {}", actor))
    }

    fn source_name(&self, actor: Option<ActorId>) -> CombatantId {
        actor.map_or_else(|| "Environment".to_string(), |a| self.name(a))
    }

    /// Turn one match notification into log entries.
    pub fn record(&mut self, tick: u64, event: &CombatEvent) {
        self.match_time = ticks_to_secs(tick);
        match event {
            CombatEvent::MatchStarted { seed, .. } => {
                let message = match seed {
                    Some(seed) => format!("Match started (seed {})!", seed),
                    None => "Match started!".to_string(),
                };
                self.log(CombatLogEventType::MatchEvent, message);
            }
            CombatEvent::MatchEnded { winner, reason } => {
                let how = match reason {
                    MatchEndReason::Death => "",
                    MatchEndReason::Timeout => " on time",
                };
                let message = match winner {
                    Some(w) => format!("{} wins{}!", self.name(*w), how),
                    None => format!("Match ended in a draw{}", how),
                };
                self.log(CombatLogEventType::MatchEvent, message);
            }
            CombatEvent::CastStarted { caster, ability, target, .. }
            | CombatEvent::ChannelStarted { caster, ability, target, .. } => {
                let caster_name = self.name(*caster);
                let verb = if matches!(event, CombatEvent::ChannelStarted { .. }) {
                    "channeling"
                } else {
                    "casting"
                };
                let message = format!("{} begins {} {}", caster_name, verb, ability.name());
                self.in_flight.insert(caster_name.clone(), *ability);
                let target = (target != caster).then(|| self.name(*target));
                self.log_ability_cast(caster_name, ability.name().to_string(), target, message);
            }
            CombatEvent::CastSucceeded { caster, ability, target } => {
                let caster_name = self.name(*caster);
                // Timed casts were logged when they started
                if self.in_flight.get(&caster_name) == Some(ability) {
                    self.in_flight.remove(&caster_name);
                    return;
                }
                let (target, message) = if target == caster {
                    (None, format!("{} uses {}", caster_name, ability.name()))
                } else {
                    let target_name = self.name(*target);
                    let message = format!("{} uses {} on {}", caster_name, ability.name(), target_name);
                    (Some(target_name), message)
                };
                self.log_ability_cast(caster_name, ability.name().to_string(), target, message);
            }
            CombatEvent::CastFailed { caster, ability, reason } => {
                let message = format!("{} failed to use {}: {}", self.name(*caster), ability.name(), reason);
                self.log(CombatLogEventType::CastFailed, message);
            }
            CombatEvent::CastInterrupted {
                caster,
                ability,
                school,
                lockout_ticks,
                by,
            } => {
                let caster_name = self.name(*caster);
                self.in_flight.remove(&caster_name);
                self.mark_cast_interrupted(&caster_name, ability.name());
                let message = format!(
                    "{} interrupts {}'s {} ({} locked for {:.1}s)",
                    self.source_name(*by),
                    caster_name,
                    ability.name(),
                    school.name(),
                    ticks_to_secs(*lockout_ticks)
                );
                self.log(CombatLogEventType::Interrupt, message);
            }
            CombatEvent::CastCancelled { caster, ability, cause } => {
                let caster_name = self.name(*caster);
                self.in_flight.remove(&caster_name);
                let why = match cause {
                    CancelCause::Moved => "moved",
                    CancelCause::CrowdControl => "crowd controlled",
                    CancelCause::Died => "died",
                    CancelCause::TargetLost => "target lost",
                    CancelCause::Requested => "cancelled",
                };
                let message = format!("{}'s {} was cancelled ({})", caster_name, ability.name(), why);
                self.log(CombatLogEventType::CastFailed, message);
            }
            CombatEvent::ChannelEnded { caster, completed: true, .. } => {
                let caster_name = self.name(*caster);
                self.in_flight.remove(&caster_name);
            }
            CombatEvent::DamageDealt {
                source,
                target,
                via,
                amount,
                absorbed,
                is_crit,
                immune,
                killing_blow,
                ..
            } => {
                let source_name = self.source_name(*source);
                let target_name = self.name(*target);
                let attack = match source {
                    Some(_) => format!("{}'s {}", source_name, via.name()),
                    None => via.name().to_string(),
                };
                if *immune {
                    self.log(
                        CombatLogEventType::Damage,
                        format!("{} is immune to {}", target_name, attack),
                    );
                    return;
                }
                let mut message = format!("{} hits {} for {:.0} damage", attack, target_name, amount);
                if *absorbed > 0.0 {
                    message.push_str(&format!(" ({:.0} absorbed)", absorbed));
                }
                if *is_crit {
                    message.push_str(" (Critical)");
                }
                if *killing_blow {
                    message.push_str(" (Killing Blow)");
                }
                self.log_damage(
                    source_name,
                    target_name,
                    via.name().to_string(),
                    *amount,
                    *killing_blow,
                    message,
                );
            }
            CombatEvent::HealingDone {
                source,
                target,
                via,
                amount,
                is_crit,
                ..
            } => {
                let source_name = self.source_name(*source);
                let target_name = self.name(*target);
                let crit = if *is_crit { " (Critical)" } else { "" };
                let message = format!("{}'s {} heals {} for {:.0}{}", source_name, via.name(), target_name, amount, crit);
                self.log_healing(source_name, target_name, via.name().to_string(), *amount, message);
            }
            CombatEvent::AuraApplied {
                target,
                aura,
                stacks,
                refreshed,
                ..
            } => {
                let target_name = self.name(*target);
                let message = if *refreshed && *stacks > 1 {
                    format!("{} on {} refreshed ({} stacks)", aura.name(), target_name, stacks)
                } else if *refreshed {
                    format!("{} on {} refreshed", aura.name(), target_name)
                } else {
                    format!("{} gains {}", target_name, aura.name())
                };
                self.log(CombatLogEventType::AuraApplied, message);
            }
            CombatEvent::AbsorbGranted { target, aura, amount } => {
                let message = format!("{} gains {} ({:.0} absorb)", self.name(*target), aura.name(), amount);
                self.log(CombatLogEventType::AuraApplied, message);
            }
            CombatEvent::AuraRemoved { target, aura, reason } => {
                let target_name = self.name(*target);
                let message = match reason {
                    AuraRemoval::Expired | AuraRemoval::HolderDied => {
                        format!("{} fades from {}", aura.name(), target_name)
                    }
                    AuraRemoval::Dispelled => format!("{} is dispelled from {}", aura.name(), target_name),
                    AuraRemoval::Consumed => format!("{} on {} is consumed", aura.name(), target_name),
                };
                self.log(CombatLogEventType::AuraRemoved, message);
            }
            CombatEvent::CcApplied {
                source,
                target,
                kind,
                duration_ticks,
            } => {
                let source_name = self.source_name(*source);
                let target_name = self.name(*target);
                let seconds = ticks_to_secs(*duration_ticks);
                let message = format!(
                    "{} is {} by {} for {:.1}s",
                    target_name,
                    cc_past_tense(*kind),
                    source_name,
                    seconds
                );
                self.log_crowd_control(source_name, target_name, kind.name().to_string(), seconds, message);
            }
            CombatEvent::CcImmune { target, kind, reason, .. } => {
                let why = match reason {
                    ImmuneReason::Immunity => "immune",
                    ImmuneReason::DiminishingReturns => "immune (diminishing returns)",
                };
                let message = format!("{} is {} to {}", self.name(*target), why, kind.name());
                self.log(CombatLogEventType::CrowdControl, message);
            }
            CombatEvent::CcRemoved { target, kind, broken } => {
                let message = if *broken {
                    format!("{} on {} breaks", kind.name(), self.name(*target))
                } else {
                    format!("{} fades from {}", kind.name(), self.name(*target))
                };
                self.log(CombatLogEventType::CrowdControl, message);
            }
            CombatEvent::StealthEntered { actor } => {
                let message = format!("{} vanishes into stealth", self.name(*actor));
                self.log(CombatLogEventType::Stealth, message);
            }
            CombatEvent::StealthBroken { actor } => {
                let message = format!("{} is revealed", self.name(*actor));
                self.log(CombatLogEventType::Stealth, message);
            }
            CombatEvent::Dodged { actor, .. } => {
                let message = format!("{} dodges", self.name(*actor));
                self.log(CombatLogEventType::AbilityUsed, message);
            }
            CombatEvent::HazardPlaced {
                source, kind, radius, ..
            } => {
                let message = match source {
                    Some(s) => format!("{} places a {} ({:.0}m)", self.name(*s), kind.name(), radius),
                    None => format!("A {} erupts ({:.0}m)", kind.name(), radius),
                };
                self.log(CombatLogEventType::Hazard, message);
            }
            CombatEvent::HazardExpired { id } => {
                self.log(CombatLogEventType::Hazard, format!("Hazard {} dissipates", id));
            }
            CombatEvent::UnitDied { victim, killer } => {
                let victim_name = self.name(*victim);
                let killer_name = killer.map(|k| self.name(k));
                let message = match &killer_name {
                    Some(k) => format!("{} has been slain by {}", victim_name, k),
                    None => format!("{} has died", victim_name),
                };
                self.log_death(victim_name, killer_name, message);
            }
            CombatEvent::MatchTicked { .. }
            | CombatEvent::CastPushedBack { .. }
            | CombatEvent::ChannelTicked { .. }
            | CombatEvent::ChannelEnded { .. }
            | CombatEvent::AutoAttack { .. }
            | CombatEvent::ResourceGained { .. } => {}
        }
    }
}

fn cc_past_tense(kind: CcType) -> &'static str {
    match kind {
        CcType::Stun => "stunned",
        CcType::Root => "rooted",
        CcType::Fear => "feared",
        CcType::Disorient => "disoriented",
        CcType::Incapacitate => "incapacitated",
        CcType::Silence => "silenced",
        CcType::Disarm => "disarmed",
    }
}

/// A combat log that can be subscribed to a match and read afterwards.
#[derive(Clone, Debug, Default)]
pub struct SharedCombatLog(Arc<Mutex<CombatLog>>);

impl SharedCombatLog {
    pub fn new(log: CombatLog) -> Self {
        Self(Arc::new(Mutex::new(log)))
    }

    /// Create a log for `world` and subscribe it.
    pub fn attach(world: &mut Match) -> Self {
        let shared = Self::new(CombatLog::for_match(world));
        world.subscribe(shared.clone());
        shared
    }

    pub fn lock(&self) -> MutexGuard<'_, CombatLog> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the log as it stands.
    pub fn snapshot(&self) -> CombatLog {
        self.lock().clone()
    }
}

impl EventSink for SharedCombatLog {
    fn on_event(&mut self, tick: u64, event: &CombatEvent) {
        self.lock().record(tick, event);
    }
}
