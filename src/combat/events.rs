//! Combat events
//!
//! Domain notifications published by the match for rendering, audio, UI and
//! logging. Subscribers receive every event synchronously in publication
//! order; they observe the simulation and never feed back into it.

use bevy::math::Vec3;

use crate::arena::abilities::{AbilityId, SpellSchool};
use crate::arena::auras::AuraId;
use crate::arena::crowd_control::{CcType, ImmuneReason};
use crate::arena::hazards::HazardKind;
use crate::arena::unit::ActorId;
use crate::arena::validation::CastFailure;

/// What produced a hit or a heal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectSource {
    Ability(AbilityId),
    AutoAttack,
    Aura(AuraId),
    Hazard(u32),
}

impl EffectSource {
    pub fn name(&self) -> &'static str {
        match self {
            EffectSource::Ability(ability) => ability.name(),
            EffectSource::AutoAttack => "Auto Attack",
            EffectSource::Aura(aura) => aura.name(),
            EffectSource::Hazard(_) => "Hazard",
        }
    }
}

/// Why a cast or channel stopped early.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelCause {
    Moved,
    CrowdControl,
    Died,
    TargetLost,
    Requested,
}

/// Why an aura went away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuraRemoval {
    Expired,
    Dispelled,
    Consumed,
    HolderDied,
}

/// How a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MatchEndReason {
    /// One or both combatants died
    Death,
    /// Tick budget exhausted; decided on remaining health percentage
    Timeout,
}

/// A domain notification.
#[derive(Clone, Debug, PartialEq)]
pub enum CombatEvent {
    MatchStarted {
        tick_budget: u64,
        seed: Option<u64>,
    },
    MatchTicked {
        tick: u64,
    },
    MatchEnded {
        winner: Option<ActorId>,
        reason: MatchEndReason,
    },
    CastStarted {
        caster: ActorId,
        ability: AbilityId,
        target: ActorId,
        cast_ticks: u64,
    },
    CastSucceeded {
        caster: ActorId,
        ability: AbilityId,
        target: ActorId,
    },
    CastFailed {
        caster: ActorId,
        ability: AbilityId,
        reason: CastFailure,
    },
    CastPushedBack {
        caster: ActorId,
        ability: AbilityId,
        completes_at: u64,
    },
    CastInterrupted {
        caster: ActorId,
        ability: AbilityId,
        school: SpellSchool,
        lockout_ticks: u64,
        by: Option<ActorId>,
    },
    CastCancelled {
        caster: ActorId,
        ability: AbilityId,
        cause: CancelCause,
    },
    ChannelStarted {
        caster: ActorId,
        ability: AbilityId,
        target: ActorId,
        duration_ticks: u64,
    },
    ChannelTicked {
        caster: ActorId,
        ability: AbilityId,
        tick_index: u32,
    },
    ChannelEnded {
        caster: ActorId,
        ability: AbilityId,
        completed: bool,
    },
    AutoAttack {
        attacker: ActorId,
        target: ActorId,
    },
    DamageDealt {
        source: Option<ActorId>,
        target: ActorId,
        via: EffectSource,
        school: SpellSchool,
        /// Damage that reached health
        amount: f32,
        absorbed: f32,
        is_crit: bool,
        immune: bool,
        killing_blow: bool,
    },
    HealingDone {
        source: Option<ActorId>,
        target: ActorId,
        via: EffectSource,
        amount: f32,
        overheal: f32,
        is_crit: bool,
    },
    AuraApplied {
        source: ActorId,
        target: ActorId,
        aura: AuraId,
        stacks: u8,
        refreshed: bool,
        duration_ticks: u64,
    },
    AuraRemoved {
        target: ActorId,
        aura: AuraId,
        reason: AuraRemoval,
    },
    AbsorbGranted {
        target: ActorId,
        aura: AuraId,
        amount: f32,
    },
    CcApplied {
        /// `None` for environmental hazards
        source: Option<ActorId>,
        target: ActorId,
        kind: CcType,
        duration_ticks: u64,
    },
    CcImmune {
        source: Option<ActorId>,
        target: ActorId,
        kind: CcType,
        reason: ImmuneReason,
    },
    CcRemoved {
        target: ActorId,
        kind: CcType,
        broken: bool,
    },
    ResourceGained {
        actor: ActorId,
        kind: crate::arena::resources::ResourceType,
        amount: f32,
    },
    StealthEntered {
        actor: ActorId,
    },
    StealthBroken {
        actor: ActorId,
    },
    Dodged {
        actor: ActorId,
        direction: Vec3,
    },
    HazardPlaced {
        id: u32,
        source: Option<ActorId>,
        kind: HazardKind,
        position: Vec3,
        radius: f32,
    },
    HazardExpired {
        id: u32,
    },
    UnitDied {
        victim: ActorId,
        killer: Option<ActorId>,
    },
}

/// A subscriber to combat events.
pub trait EventSink: Send + Sync {
    fn on_event(&mut self, tick: u64, event: &CombatEvent);
}

impl<F> EventSink for F
where
    F: FnMut(u64, &CombatEvent) + Send + Sync,
{
    fn on_event(&mut self, tick: u64, event: &CombatEvent) {
        self(tick, event)
    }
}

/// An event together with the tick it was published on.
#[derive(Clone, Debug, PartialEq)]
pub struct StampedEvent {
    pub tick: u64,
    pub event: CombatEvent,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

/// Publish/subscribe channel owned by a match.
///
/// Besides push-style sinks the bus can keep a pull-style buffer, drained by
/// hosts that forward events elsewhere once per tick.
#[derive(Default)]
pub struct EventBus {
    sinks: Vec<(SubscriptionId, Box<dyn EventSink>)>,
    next_id: u32,
    buffer: Option<Vec<StampedEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.sinks.push((id, Box::new(sink)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(sid, _)| *sid != id);
        self.sinks.len() != before
    }

    /// Start keeping published events until [`EventBus::drain`] is called.
    pub fn enable_buffer(&mut self) {
        self.buffer.get_or_insert_with(Vec::new);
    }

    pub fn publish(&mut self, tick: u64, event: CombatEvent) {
        for (_, sink) in self.sinks.iter_mut() {
            sink.on_event(tick, &event);
        }
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.push(StampedEvent { tick, event });
        }
    }

    pub fn drain(&mut self) -> Vec<StampedEvent> {
        self.buffer.as_mut().map(std::mem::take).unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .field("buffered", &self.buffer.as_ref().map(Vec::len))
            .finish()
    }
}
