//! Combat Core
//!
//! The [`Match`] owns both combatants and advances them one fixed step at a
//! time. Every tick runs the same pipeline, in this order:
//! 1. Decision makers observe the match and issue orders
//! 2. Queued actions are validated and started
//! 3. Casts complete and channels tick
//! 4. Movement (dodge rolls, fear wander, move targets)
//! 5. Auto-attacks
//! 6. Timers: resources, cooldowns, lockouts, auras, crowd control, absorbs
//! 7. Arena hazards
//! 8. Win check
//!
//! Nothing inside a tick is reordered and nothing is applied partially, so a
//! seeded match replays identically.

use std::sync::Arc;

use bevy::log::{debug, info, trace};
use bevy::math::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::abilities::{AbilityDef, AbilityId, CustomBehavior, Effect, EffectTarget, SpellSchool, Targeting};
use super::ability_config::{ArenaContent, ContentError};
use super::auras::{AbsorbShield, Aura, AuraApplication, AuraCategory, AuraId, AuraSpec, AuraTick, TickBehavior};
use super::casting::{effective_cast_ticks, CastSlot, CastState, ChannelState};
use super::class_ai::input::InputHandle;
use super::class_ai::{controller_for, DecisionMaker, MoveIntent, Orders};
use super::constants::{
    secs_to_ticks, ticks_to_secs, CHANNEL_TICK_INTERVAL, DODGE_COOLDOWN_TICKS, DODGE_IMMUNITY_TICKS,
    DODGE_SLOW_MULTIPLIER, DODGE_SLOW_RADIUS, DODGE_SLOW_TICKS, FEAR_DIRECTION_TICKS, FEAR_SPEED_MULTIPLIER,
    GCD_TICKS,
};
use super::crowd_control::{CcOptions, CcOutcome, CcType, ImmuneReason};
use super::formulas::{apply_damage_with_absorb, compute_damage, compute_healing, roll_range, Attacker, HitKind};
use super::geometry::{horizontal_direction, horizontal_distance};
use super::hazards::{ActiveHazard, HazardKind, HazardSpec, ScheduledHazard};
use super::match_config::{CharacterClass, MatchConfig};
use super::movement::{step_towards, DodgeState};
use super::resources::ResourceType;
use super::rng::GameRng;
use super::stats::{StatKind, StatModifier};
use super::terrain::ArenaLayout;
use super::unit::{ActorId, Unit, UnitStats};
use super::validation::{validate_cast, CastFailure, ValidationMode};
use crate::combat::events::{
    AuraRemoval, CancelCause, CombatEvent, EffectSource, EventBus, EventSink, MatchEndReason, StampedEvent,
    SubscriptionId,
};

/// An ability use waiting for the next action phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueuedAction {
    pub actor: ActorId,
    pub ability: AbilityId,
    /// Falls back to the actor's selected target when `None`
    pub target: Option<ActorId>,
}

/// How and when a match ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// `None` for a draw
    pub winner: Option<ActorId>,
    pub reason: MatchEndReason,
    pub ended_at: u64,
}

/// One damage instance handed to [`Match::deal_damage`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// `None` for environmental damage
    pub source: Option<ActorId>,
    pub target: ActorId,
    pub via: EffectSource,
    pub school: SpellSchool,
    /// Amount before modifiers, mitigation and crits
    pub base: f32,
    pub kind: HitKind,
    pub guaranteed_crit: bool,
}

/// End-of-match report for one combatant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatantSummary {
    pub actor: ActorId,
    pub class: CharacterClass,
    pub name: String,
    pub max_health: f32,
    pub final_health: f32,
    pub survived: bool,
    pub stats: UnitStats,
}

/// Result of a finished match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub winner: Option<ActorId>,
    pub loser: Option<ActorId>,
    pub reason: MatchEndReason,
    pub duration_ticks: u64,
    pub duration_secs: f32,
    pub seed: Option<u64>,
    pub combatants: [CombatantSummary; 2],
}

impl MatchSummary {
    pub fn winner_class(&self) -> Option<CharacterClass> {
        self.winner.map(|w| self.combatants[w.index()].class)
    }
}

/// Who is doing what to whom while effects resolve.
#[derive(Clone, Copy, Debug)]
struct EffectContext {
    caster: ActorId,
    target: ActorId,
    ability: Option<AbilityId>,
    school: SpellSchool,
    via: EffectSource,
}

impl EffectContext {
    fn for_ability(caster: ActorId, target: ActorId, ability: AbilityId, school: SpellSchool) -> Self {
        Self {
            caster,
            target,
            ability: Some(ability),
            school,
            via: EffectSource::Ability(ability),
        }
    }

    /// Hooks run with the aura's source as caster and its holder as target.
    fn for_aura(aura: &Aura) -> Self {
        Self {
            caster: aura.source,
            target: aura.holder,
            ability: aura.ability,
            school: aura.school,
            via: EffectSource::Aura(aura.id()),
        }
    }

    fn resolve(&self, side: EffectTarget) -> ActorId {
        match side {
            EffectTarget::Target => self.target,
            EffectTarget::Caster => self.caster,
        }
    }
}

/// A two-combatant duel.
pub struct Match {
    content: Arc<ArenaContent>,
    units: [Unit; 2],
    controllers: [Option<Box<dyn DecisionMaker>>; 2],
    targets: [Option<ActorId>; 2],
    queue: Vec<QueuedAction>,
    current_tick: u64,
    tick_budget: u64,
    rng: GameRng,
    layout: ArenaLayout,
    hazards: Vec<ActiveHazard>,
    scheduled_hazards: Vec<ScheduledHazard>,
    next_hazard_id: u32,
    bus: EventBus,
    outcome: Option<MatchOutcome>,
    started: bool,
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("current_tick", &self.current_tick)
            .field("tick_budget", &self.tick_budget)
            .field("units", &self.units)
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl Match {
    /// Build a match with no controllers attached.
    pub fn new(config: &MatchConfig, content: Arc<ArenaContent>) -> Result<Self, ContentError> {
        let layout = config.arena_layout();
        let spawns = [
            layout.resolve_position(config.spawn_position(0)),
            layout.resolve_position(config.spawn_position(1)),
        ];
        let build = |slot: usize| -> Result<Unit, ContentError> {
            let class = config.combatants[slot].class;
            let def = content.class(class).ok_or(ContentError::MissingClass(class))?;
            let facing = horizontal_direction(spawns[slot], spawns[1 - slot]);
            Ok(Unit::from_class(ActorId(slot as u8), class, def, spawns[slot], facing))
        };
        let units = [build(0)?, build(1)?];

        let rng = match config.seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using random RNG (non-deterministic)");
                GameRng::from_entropy()
            }
        };

        Ok(Self {
            content,
            units,
            controllers: [None, None],
            targets: [Some(ActorId::SECOND), Some(ActorId::FIRST)],
            queue: Vec::new(),
            current_tick: 0,
            tick_budget: config.tick_budget(),
            rng,
            layout,
            hazards: Vec::new(),
            scheduled_hazards: config.hazards.clone(),
            next_hazard_id: 0,
            bus: EventBus::default(),
            outcome: None,
            started: false,
        })
    }

    /// Build a match and attach the controllers named by the configuration.
    /// Human-controlled slots return the handle their commands are pushed through.
    pub fn from_config(
        config: &MatchConfig,
        content: Arc<ArenaContent>,
    ) -> Result<(Self, [Option<InputHandle>; 2]), ContentError> {
        let mut arena = Self::new(config, content)?;
        let mut handles = [None, None];
        for (slot, setup) in config.combatants.iter().enumerate() {
            let actor = ActorId(slot as u8);
            let (controller, handle) = controller_for(setup.controller, actor);
            arena.set_controller(actor, controller);
            handles[slot] = handle;
        }
        Ok((arena, handles))
    }

    pub fn set_controller(&mut self, actor: ActorId, controller: Box<dyn DecisionMaker>) {
        if let Some(slot) = self.controllers.get_mut(actor.index()) {
            *slot = Some(controller);
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn unit(&self, id: ActorId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub fn unit_mut(&mut self, id: ActorId) -> Option<&mut Unit> {
        self.units.get_mut(id.index())
    }

    pub fn units(&self) -> &[Unit; 2] {
        &self.units
    }

    /// The other combatant.
    pub fn opponent_of(&self, id: ActorId) -> Option<&Unit> {
        self.unit(id).and_then(|_| self.unit(id.opponent()))
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn tick_budget(&self) -> u64 {
        self.tick_budget
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    pub fn content(&self) -> &ArenaContent {
        &self.content
    }

    pub fn target_of(&self, actor: ActorId) -> Option<ActorId> {
        self.targets.get(actor.index()).copied().flatten()
    }

    pub fn hazards(&self) -> &[ActiveHazard] {
        &self.hazards
    }

    pub fn pending_actions(&self) -> &[QueuedAction] {
        &self.queue
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn seed(&self) -> Option<u64> {
        self.rng.seed
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> SubscriptionId {
        self.bus.subscribe(sink)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Keep published events until [`Match::drain_events`] is called.
    pub fn enable_event_buffer(&mut self) {
        self.bus.enable_buffer();
    }

    pub fn drain_events(&mut self) -> Vec<StampedEvent> {
        self.bus.drain()
    }

    fn publish(&mut self, event: CombatEvent) {
        self.bus.publish(self.current_tick, event);
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Queue an ability use. It is resolved in the action phase of the next
    /// tick, never in the middle of one.
    pub fn queue_action(&mut self, actor: ActorId, ability: AbilityId, target: Option<ActorId>) {
        self.queue.push(QueuedAction { actor, ability, target });
    }

    /// Side-effect free check of whether `actor` could start `ability` now.
    pub fn validate(&self, actor: ActorId, ability: AbilityId, target: Option<ActorId>) -> Result<(), CastFailure> {
        self.validate_at(actor, ability, target, self.current_tick)
    }

    /// [`Match::validate`] against an explicit tick.
    pub fn validate_at(
        &self,
        actor: ActorId,
        ability: AbilityId,
        target: Option<ActorId>,
        tick: u64,
    ) -> Result<(), CastFailure> {
        let caster = self.unit(actor).ok_or(CastFailure::InvalidTarget)?;
        let def = self.content.ability(ability).ok_or(CastFailure::NotEquipped)?;
        let target = match def.targeting {
            Targeting::SelfOnly => Some(caster),
            Targeting::Enemy => target.and_then(|t| self.unit(t)),
        };
        validate_cast(caster, ability, def, target, &self.layout, tick, ValidationMode::Start)
    }

    pub fn set_move_target(&mut self, actor: ActorId, destination: Option<Vec3>) {
        let layout = &self.layout;
        if let Some(unit) = self.units.get_mut(actor.index()) {
            unit.move_target = destination.map(|d| layout.clamp_to_bounds(d));
        }
    }

    /// Select a target. Unknown ids clear the selection.
    pub fn set_target(&mut self, actor: ActorId, target: Option<ActorId>) {
        let resolved = target.filter(|t| t.index() < self.units.len());
        if let Some(slot) = self.targets.get_mut(actor.index()) {
            *slot = resolved;
        }
    }

    /// Ask for a dodge roll in `direction`; it starts in the next movement phase.
    pub fn request_dodge(&mut self, actor: ActorId, direction: Vec3) {
        if let Some(unit) = self.units.get_mut(actor.index()) {
            unit.pending_dodge = Some(direction);
        }
    }

    /// Stop the actor's cast or channel without resolving it.
    pub fn cancel_cast(&mut self, actor: ActorId, cause: CancelCause) -> bool {
        let Some(unit) = self.units.get_mut(actor.index()) else {
            return false;
        };
        match unit.cast.cancel() {
            CastSlot::Idle => false,
            CastSlot::Casting(cast) => {
                debug!("{} stops casting {} ({:?})", unit.name, cast.ability.name(), cause);
                self.publish(CombatEvent::CastCancelled {
                    caster: actor,
                    ability: cast.ability,
                    cause,
                });
                true
            }
            CastSlot::Channeling(channel) => {
                debug!("{} stops channeling {} ({:?})", unit.name, channel.ability.name(), cause);
                self.publish(CombatEvent::CastCancelled {
                    caster: actor,
                    ability: channel.ability,
                    cause,
                });
                self.publish(CombatEvent::ChannelEnded {
                    caster: actor,
                    ability: channel.ability,
                    completed: false,
                });
                true
            }
        }
    }

    /// Interrupt the target's cast or channel and lock its school.
    /// Returns false when there was nothing interruptible in progress.
    pub fn interrupt(&mut self, target: ActorId, lockout_ticks: u64, source: Option<ActorId>) -> bool {
        let now = self.current_tick;
        let Some(unit) = self.units.get_mut(target.index()) else {
            return false;
        };
        if !unit.is_alive() || !unit.cast.is_interruptible() {
            return false;
        }
        let interrupted = unit.cast.cancel();
        let (Some(ability), Some(school)) = (interrupted.ability(), interrupted.school()) else {
            return false;
        };
        unit.lockouts.lock(school, now + lockout_ticks);
        info!(
            "{}'s {} interrupted, {} locked for {:.1}s",
            unit.name,
            ability.name(),
            school.name(),
            ticks_to_secs(lockout_ticks)
        );

        if let Some(src) = source.and_then(|s| self.units.get_mut(s.index())) {
            src.tally.interrupts += 1;
        }
        self.publish(CombatEvent::CastInterrupted {
            caster: target,
            ability,
            school,
            lockout_ticks,
            by: source,
        });
        if interrupted.is_channeling() {
            self.publish(CombatEvent::ChannelEnded {
                caster: target,
                ability,
                completed: false,
            });
        }
        true
    }

    /// Apply crowd control with diminishing returns. Stuns, fears and
    /// incapacitates also cancel the target's cast or channel.
    pub fn apply_crowd_control(
        &mut self,
        source: Option<ActorId>,
        target: ActorId,
        kind: CcType,
        base_ticks: u64,
        break_on_damage: Option<f32>,
    ) -> CcOutcome {
        let now = self.current_tick;
        let Some(unit) = self.units.get_mut(target.index()) else {
            return CcOutcome::Immune(ImmuneReason::Immunity);
        };
        if !unit.is_alive() {
            return CcOutcome::Immune(ImmuneReason::Immunity);
        }
        let options = CcOptions {
            break_on_damage,
            target_immune: unit.is_cc_immune(),
        };
        let outcome = unit.cc.apply(source, kind, base_ticks, now, options);
        match outcome {
            CcOutcome::Applied { duration_ticks } => {
                debug!("{} is affected by {} for {} ticks", unit.name, kind.name(), duration_ticks);
                if kind.prevents_movement() {
                    unit.move_target = None;
                }
                if kind.wanders() {
                    unit.wander_direction = Vec3::ZERO;
                }
                let cancel = kind.cancels_casts() && !unit.cast.is_idle();
                if let Some(src) = source.and_then(|s| self.units.get_mut(s.index())) {
                    src.tally.cc_applied += 1;
                }
                self.publish(CombatEvent::CcApplied {
                    source,
                    target,
                    kind,
                    duration_ticks,
                });
                if cancel {
                    self.cancel_cast(target, CancelCause::CrowdControl);
                }
            }
            CcOutcome::Immune(reason) => {
                debug!("{} is immune to {} ({:?})", unit.name, kind.name(), reason);
                self.publish(CombatEvent::CcImmune {
                    source,
                    target,
                    kind,
                    reason,
                });
            }
        }
        outcome
    }

    /// Resolve one damage instance. Returns the damage that reached health.
    pub fn deal_damage(&mut self, hit: Hit) -> f32 {
        let t = hit.target.index();
        if !self.units.get(t).is_some_and(Unit::is_alive) {
            return 0.0;
        }
        let attacker = hit
            .source
            .and_then(|s| self.units.get(s.index()))
            .map(|u| Attacker::damage(&u.stats))
            .unwrap_or(Attacker::NEUTRAL);

        let target = &self.units[t];
        if target.is_damage_immune() {
            self.publish(CombatEvent::DamageDealt {
                source: hit.source,
                target: hit.target,
                via: hit.via,
                school: hit.school,
                amount: 0.0,
                absorbed: 0.0,
                is_crit: false,
                immune: true,
                killing_blow: false,
            });
            return 0.0;
        }
        let bonus = target.auras.damage_taken_bonus();
        let roll = compute_damage(
            hit.base,
            attacker,
            &target.stats,
            bonus,
            hit.school,
            hit.kind,
            hit.guaranteed_crit,
            &mut self.rng,
        );
        let incoming = roll.amount;

        let unit = &mut self.units[t];
        let shields_before: SmallVec<[AuraId; 2]> = unit.absorbs.iter().map(|s| s.id).collect();
        let (to_health, absorbed) = apply_damage_with_absorb(incoming, &mut unit.health, &mut unit.absorbs);
        let consumed: SmallVec<[AuraId; 2]> = shields_before
            .into_iter()
            .filter(|id| !unit.absorbs.has(*id))
            .collect();
        unit.tally.damage_taken += to_health;
        unit.tally.damage_absorbed += absorbed;
        let killing_blow = unit.health <= 0.0;
        trace!(
            "{} takes {:.1} from {} ({:.1} absorbed)",
            unit.name,
            to_health,
            hit.via.name(),
            absorbed
        );

        if let Some(src) = hit.source.filter(|s| *s != hit.target) {
            if let Some(attacker) = self.units.get_mut(src.index()) {
                attacker.tally.damage_dealt += to_health;
            }
        }
        self.publish(CombatEvent::DamageDealt {
            source: hit.source,
            target: hit.target,
            via: hit.via,
            school: hit.school,
            amount: to_health,
            absorbed,
            is_crit: roll.is_crit,
            immune: false,
            killing_blow,
        });
        for aura in consumed {
            self.publish(CombatEvent::AuraRemoved {
                target: hit.target,
                aura,
                reason: AuraRemoval::Consumed,
            });
        }

        if killing_blow {
            self.kill(hit.target, hit.source);
            return to_health;
        }
        if incoming > 0.0 {
            self.after_damage_taken(hit, incoming);
        }
        to_health
    }

    /// Reactions of a surviving unit to an incoming hit.
    fn after_damage_taken(&mut self, hit: Hit, incoming: f32) {
        if hit.kind == HitKind::Direct {
            self.break_stealth(hit.target);
        }

        let unit = &mut self.units[hit.target.index()];
        let broken = unit.cc.on_damage(incoming);
        let pushed_back = if hit.school.is_physical() && unit.cast.apply_pushback() {
            match unit.cast {
                CastSlot::Casting(cast) => Some(cast),
                _ => None,
            }
        } else {
            None
        };
        if let Some(gain) = unit.damage_taken_resource {
            unit.resources.gain(gain.kind, incoming * gain.per_damage);
        }

        for entry in broken {
            self.publish(CombatEvent::CcRemoved {
                target: hit.target,
                kind: entry.kind,
                broken: true,
            });
        }
        if let Some(cast) = pushed_back {
            self.publish(CombatEvent::CastPushedBack {
                caster: hit.target,
                ability: cast.ability,
                completes_at: cast.completes_at,
            });
        }
    }

    /// Heal `target`. Returns the effective amount (overheal excluded).
    fn heal(
        &mut self,
        source: Option<ActorId>,
        target: ActorId,
        via: EffectSource,
        base: f32,
        kind: HitKind,
        guaranteed_crit: bool,
    ) -> f32 {
        let t = target.index();
        if !self.units.get(t).is_some_and(Unit::is_alive) {
            return 0.0;
        }
        let healer = source
            .and_then(|s| self.units.get(s.index()))
            .map(|u| Attacker::healing(&u.stats))
            .unwrap_or(Attacker::NEUTRAL);
        let bonus = self.units[t].auras.healing_taken_bonus();
        let roll = compute_healing(
            base,
            healer,
            &self.units[t].stats,
            bonus,
            kind,
            guaranteed_crit,
            &mut self.rng,
        );

        let unit = &mut self.units[t];
        let amount = roll.amount.min(unit.max_health - unit.health).max(0.0);
        unit.health += amount;
        let overheal = roll.amount - amount;
        if let Some(src) = source.and_then(|s| self.units.get_mut(s.index())) {
            src.tally.healing_done += amount;
        }
        self.publish(CombatEvent::HealingDone {
            source,
            target,
            via,
            amount,
            overheal,
            is_crit: roll.is_crit,
        });
        amount
    }

    fn kill(&mut self, victim: ActorId, killer: Option<ActorId>) {
        self.cancel_cast(victim, CancelCause::Died);
        let unit = &mut self.units[victim.index()];
        unit.dead = true;
        unit.health = 0.0;
        unit.move_target = None;
        unit.dodge = None;
        unit.pending_dodge = None;
        unit.stealthed = false;
        unit.cc.clear();
        unit.absorbs.clear();
        // Hooks are skipped: a dead holder takes no further effects
        let removed = unit.auras.clear(&mut unit.stats);
        info!("{} has died", unit.name);

        for aura in removed {
            self.publish(CombatEvent::AuraRemoved {
                target: victim,
                aura: aura.id(),
                reason: AuraRemoval::HolderDied,
            });
        }
        self.publish(CombatEvent::UnitDied { victim, killer });
    }

    fn break_stealth(&mut self, actor: ActorId) {
        let unit = &mut self.units[actor.index()];
        if unit.stealthed {
            unit.stealthed = false;
            debug!("{} leaves stealth", unit.name);
            self.publish(CombatEvent::StealthBroken { actor });
        }
    }

    fn enter_stealth(&mut self, actor: ActorId) {
        let unit = &mut self.units[actor.index()];
        if unit.stealthed || !unit.is_alive() {
            return;
        }
        unit.stealthed = true;
        debug!("{} enters stealth", unit.name);
        // The opponent loses its selection
        let opponent = actor.opponent();
        if self.targets[opponent.index()] == Some(actor) {
            self.targets[opponent.index()] = None;
        }
        self.publish(CombatEvent::StealthEntered { actor });
    }

    /// Apply or refresh an aura. Fresh applications run the `on_apply` hook.
    fn apply_aura(
        &mut self,
        source: ActorId,
        holder: ActorId,
        spec: &AuraSpec,
        school: SpellSchool,
        ability: Option<AbilityId>,
    ) {
        let now = self.current_tick;
        let Some(unit) = self.units.get_mut(holder.index()).filter(|u| u.is_alive()) else {
            return;
        };
        let aura = Aura::new(spec.clone(), source, holder, school, ability, now);
        let duration_ticks = aura.expires_at.saturating_sub(now);
        let hook_ctx = EffectContext::for_aura(&aura);
        let application = unit.auras.apply(aura, &mut unit.stats);
        trace!("{} gains {} ({:?})", unit.name, spec.id.name(), application);

        let (stacks, refreshed) = match application {
            AuraApplication::Applied => (1, false),
            AuraApplication::Refreshed { stacks } => (stacks, true),
        };
        self.publish(CombatEvent::AuraApplied {
            source,
            target: holder,
            aura: spec.id,
            stacks,
            refreshed,
            duration_ticks,
        });
        if let (AuraApplication::Applied, Some(hook)) = (application, spec.on_apply.as_deref()) {
            self.resolve_effect(hook, hook_ctx);
        }
    }

    /// Remove an aura, reverse its modifiers and run its `on_remove` hook.
    fn remove_aura(&mut self, holder: ActorId, id: AuraId, reason: AuraRemoval) -> Option<Aura> {
        let unit = &mut self.units[holder.index()];
        let aura = unit.auras.remove(id, &mut unit.stats)?;
        self.publish(CombatEvent::AuraRemoved {
            target: holder,
            aura: id,
            reason,
        });
        if let Some(hook) = aura.spec.on_remove.as_deref() {
            self.resolve_effect(hook, EffectContext::for_aura(&aura));
        }
        Some(aura)
    }

    /// Place a hazard at `position`. Owned hazards never hit their owner.
    pub fn place_hazard(&mut self, source: Option<ActorId>, spec: &HazardSpec, position: Vec3) -> u32 {
        let id = self.next_hazard_id;
        self.next_hazard_id += 1;
        let position = self.layout.clamp_to_bounds(position);
        let hazard = ActiveHazard::new(id, spec, position, source, self.current_tick);
        debug!("{} placed at ({:.1}, {:.1})", hazard.kind.name(), position.x, position.z);
        self.publish(CombatEvent::HazardPlaced {
            id,
            source,
            kind: hazard.kind.clone(),
            position,
            radius: hazard.radius,
        });
        self.hazards.push(hazard);
        id
    }

    // ------------------------------------------------------------------
    // Tick pipeline
    // ------------------------------------------------------------------

    /// Advance the simulation by exactly one tick. Does nothing once finished.
    pub fn tick(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        if !self.started {
            self.started = true;
            info!(
                "Match started: {} vs {} ({} tick budget)",
                self.units[0].name, self.units[1].name, self.tick_budget
            );
            self.publish(CombatEvent::MatchStarted {
                tick_budget: self.tick_budget,
                seed: self.rng.seed,
            });
        }

        self.decision_phase();
        self.action_phase();
        self.cast_phase();
        self.movement_phase();
        self.auto_attack_phase();
        self.timer_phase();
        self.hazard_phase();

        let now = self.current_tick;
        self.publish(CombatEvent::MatchTicked { tick: now });
        self.check_match_end();
        for unit in &self.units {
            unit.debug_validate();
        }
        self.current_tick += 1;
    }

    /// Tick until the match ends and report the result.
    pub fn run_to_completion(&mut self) -> MatchSummary {
        loop {
            if let Some(outcome) = self.outcome {
                return self.build_summary(outcome);
            }
            self.tick();
        }
    }

    /// Report of the finished match, `None` while it is still running.
    pub fn summary(&self) -> Option<MatchSummary> {
        self.outcome.map(|outcome| self.build_summary(outcome))
    }

    fn build_summary(&self, outcome: MatchOutcome) -> MatchSummary {
        let duration_ticks = outcome.ended_at + 1;
        let combatant = |unit: &Unit| CombatantSummary {
            actor: unit.id,
            class: unit.class,
            name: unit.name.clone(),
            max_health: unit.max_health,
            final_health: unit.health,
            survived: unit.is_alive(),
            stats: unit.tally,
        };
        MatchSummary {
            winner: outcome.winner,
            loser: outcome.winner.map(|w| w.opponent()),
            reason: outcome.reason,
            duration_ticks,
            duration_secs: ticks_to_secs(duration_ticks),
            seed: self.rng.seed,
            combatants: [combatant(&self.units[0]), combatant(&self.units[1])],
        }
    }

    fn decision_phase(&mut self) {
        let now = self.current_tick;
        let mut issued: SmallVec<[Orders; 2]> = SmallVec::new();
        for slot in 0..self.controllers.len() {
            let Some(mut controller) = self.controllers[slot].take() else {
                continue;
            };
            let actor = ActorId(slot as u8);
            if self.units[slot].is_alive() {
                let mut orders = Orders::new(actor);
                controller.decide(self, &mut orders, now);
                issued.push(orders);
            }
            self.controllers[slot] = Some(controller);
        }
        for orders in issued {
            self.apply_orders(orders);
        }
    }

    fn apply_orders(&mut self, orders: Orders) {
        let actor = orders.actor();
        if let Some(target) = orders.target {
            self.set_target(actor, target);
        }
        if orders.cancel {
            self.cancel_cast(actor, CancelCause::Requested);
        }
        match orders.move_intent {
            Some(MoveIntent::MoveTo(destination)) => self.set_move_target(actor, Some(destination)),
            Some(MoveIntent::Stop) => self.set_move_target(actor, None),
            None => {}
        }
        if let Some(direction) = orders.dodge {
            self.request_dodge(actor, direction);
        }
        for (ability, target) in orders.actions {
            self.queue_action(actor, ability, target);
        }
    }

    fn action_phase(&mut self) {
        let queue = std::mem::take(&mut self.queue);
        for action in queue {
            self.resolve_action(action);
        }
    }

    fn resolve_action(&mut self, action: QueuedAction) {
        let content = Arc::clone(&self.content);
        let Some(def) = content.ability(action.ability) else {
            debug!("Dropping unknown ability {:?}", action.ability);
            return;
        };
        if action.actor.index() >= self.units.len() {
            debug!("Dropping action for unknown actor {}", action.actor);
            return;
        }
        let target = match def.targeting {
            Targeting::SelfOnly => Some(action.actor),
            Targeting::Enemy => action.target.or_else(|| self.target_of(action.actor)),
        };

        if let Err(reason) = self.validate(action.actor, action.ability, target) {
            self.report_failure(action.actor, action.ability, reason);
            return;
        }
        let Some(target) = target else {
            return;
        };

        if let Some(channel) = &def.channel {
            self.start_channel(action.actor, action.ability, def, target, channel.duration_secs);
        } else if def.cast_ticks() > 0 {
            self.start_cast(action.actor, action.ability, def, target);
        } else {
            self.execute(action.actor, action.ability, def, target, ValidationMode::Start);
        }
    }

    /// Missing or malformed targets drop the action silently; every other
    /// failure is announced.
    fn report_failure(&mut self, caster: ActorId, ability: AbilityId, reason: CastFailure) {
        if reason == CastFailure::InvalidTarget {
            debug!("Dropping {} from {}: {}", ability.name(), caster, reason);
            return;
        }
        debug!("{} failed for {}: {}", ability.name(), caster, reason);
        self.publish(CombatEvent::CastFailed { caster, ability, reason });
    }

    fn start_cast(&mut self, actor: ActorId, ability: AbilityId, def: &AbilityDef, target: ActorId) {
        let now = self.current_tick;
        let target_pos = self.units[target.index()].position;
        let unit = &mut self.units[actor.index()];
        let cast_ticks = effective_cast_ticks(def.cast_ticks(), unit.stats.get(StatKind::Haste));
        unit.cast = CastSlot::Casting(CastState {
            ability,
            target,
            school: def.school,
            started_at: now,
            completes_at: now + cast_ticks,
            pushbacks: 0,
            uninterruptible: def.flags.uninterruptible,
            castable_while_moving: def.flags.castable_while_moving,
        });
        if !def.flags.ignores_gcd {
            unit.gcd_until = now + GCD_TICKS;
        }
        if !def.flags.castable_while_moving {
            unit.move_target = None;
        }
        if target != actor {
            unit.face(target_pos);
        }
        debug!("{} begins casting {} ({} ticks)", unit.name, ability.name(), cast_ticks);
        self.publish(CombatEvent::CastStarted {
            caster: actor,
            ability,
            target,
            cast_ticks,
        });
    }

    fn start_channel(
        &mut self,
        actor: ActorId,
        ability: AbilityId,
        def: &AbilityDef,
        target: ActorId,
        duration_secs: f32,
    ) {
        let now = self.current_tick;
        let duration_ticks = secs_to_ticks(duration_secs).max(1);
        self.pay_for(actor, ability, def, ValidationMode::Start);
        if target != actor {
            self.break_stealth(actor);
        }

        let target_pos = self.units[target.index()].position;
        let unit = &mut self.units[actor.index()];
        unit.cast = CastSlot::Channeling(ChannelState {
            ability,
            target,
            school: def.school,
            started_at: now,
            ends_at: now + duration_ticks,
            next_tick_at: now + CHANNEL_TICK_INTERVAL,
            ticks_done: 0,
            uninterruptible: def.flags.uninterruptible,
            castable_while_moving: def.flags.castable_while_moving,
        });
        if !def.flags.castable_while_moving {
            unit.move_target = None;
        }
        if target != actor {
            unit.face(target_pos);
        }
        debug!("{} begins channeling {}", unit.name, ability.name());
        self.publish(CombatEvent::ChannelStarted {
            caster: actor,
            ability,
            target,
            duration_ticks,
        });
    }

    /// Resource spend, global cooldown and cooldown consumption.
    fn pay_for(&mut self, actor: ActorId, ability: AbilityId, def: &AbilityDef, mode: ValidationMode) {
        let now = self.current_tick;
        let unit = &mut self.units[actor.index()];
        for cost in &def.costs {
            unit.resources.spend(cost.kind, cost.amount);
        }
        // A completing cast already started the global cooldown when it began
        if mode == ValidationMode::Start && !def.flags.ignores_gcd {
            unit.gcd_until = now + GCD_TICKS;
        }
        unit.cooldowns.consume(ability, def.charges, def.cooldown_ticks(), now);
        unit.tally.abilities_used += 1;
    }

    /// Resolve an ability: re-validate, pay, break stealth, apply effects.
    fn execute(
        &mut self,
        actor: ActorId,
        ability: AbilityId,
        def: &AbilityDef,
        target: ActorId,
        mode: ValidationMode,
    ) -> bool {
        let check = {
            let caster = &self.units[actor.index()];
            let target_unit = match def.targeting {
                Targeting::SelfOnly => Some(caster),
                Targeting::Enemy => self.unit(target),
            };
            validate_cast(caster, ability, def, target_unit, &self.layout, self.current_tick, mode)
        };
        if let Err(reason) = check {
            self.report_failure(actor, ability, reason);
            return false;
        }

        self.pay_for(actor, ability, def, mode);
        if target != actor {
            self.break_stealth(actor);
        }
        let ctx = EffectContext::for_ability(actor, target, ability, def.school);
        for effect in def.effects() {
            self.resolve_effect(&effect, ctx);
        }
        debug!("{} uses {}", self.units[actor.index()].name, ability.name());
        self.publish(CombatEvent::CastSucceeded {
            caster: actor,
            ability,
            target,
        });
        true
    }

    fn cast_phase(&mut self) {
        let now = self.current_tick;
        let content = Arc::clone(&self.content);
        for slot in 0..self.units.len() {
            let actor = ActorId(slot as u8);
            if !self.units[slot].is_alive() {
                continue;
            }
            if let CastSlot::Channeling(channel) = self.units[slot].cast {
                if !self.units[channel.target.index()].is_alive() {
                    self.cancel_cast(actor, CancelCause::TargetLost);
                    continue;
                }
            }

            let poll = self.units[slot].cast.poll(now);
            if let Some(cast) = poll.cast_completed {
                if let Some(def) = content.ability(cast.ability) {
                    self.execute(actor, cast.ability, def, cast.target, ValidationMode::Completion);
                }
            }
            if let Some((channel, tick_index)) = poll.channel_tick {
                if let Some(spec) = content.ability(channel.ability).and_then(|d| d.channel.as_ref()) {
                    let ctx = EffectContext::for_ability(actor, channel.target, channel.ability, channel.school);
                    self.resolve_effect(&spec.tick, ctx);
                }
                self.publish(CombatEvent::ChannelTicked {
                    caster: actor,
                    ability: channel.ability,
                    tick_index,
                });
            }
            if let Some(channel) = poll.channel_completed {
                self.publish(CombatEvent::ChannelEnded {
                    caster: actor,
                    ability: channel.ability,
                    completed: true,
                });
            }
        }
    }

    fn movement_phase(&mut self) {
        let now = self.current_tick;
        for slot in 0..self.units.len() {
            let actor = ActorId(slot as u8);
            if !self.units[slot].is_alive() {
                continue;
            }

            if let Some(direction) = self.units[slot].pending_dodge.take() {
                let unit = &self.units[slot];
                if unit.can_move() && unit.dodge.is_none() && now >= unit.dodge_ready_at {
                    self.start_dodge(actor, direction);
                }
            }

            let unit = &mut self.units[slot];
            let before = unit.position;
            if let Some(mut dodge) = unit.dodge {
                let step = dodge.direction * DodgeState::step_distance();
                unit.position = self.layout.resolve_position(unit.position + step);
                dodge.remaining_ticks = dodge.remaining_ticks.saturating_sub(1);
                unit.dodge = (dodge.remaining_ticks > 0).then_some(dodge);
                continue;
            }
            let wandering = unit.cc.is_wandering();
            if !wandering && !unit.can_move() {
                continue;
            }

            if wandering {
                if unit.wander_direction == Vec3::ZERO || now >= unit.wander_redirect_at {
                    let (x, z) = self.rng.random_direction();
                    unit.wander_direction = Vec3::new(x, 0.0, z);
                    unit.wander_redirect_at = now + FEAR_DIRECTION_TICKS;
                }
                let step = unit.wander_direction * unit.speed_per_tick() * FEAR_SPEED_MULTIPLIER;
                unit.position = self.layout.resolve_position(unit.position + step);
                unit.facing = unit.wander_direction;
            } else if let Some(destination) = unit.move_target {
                let (next, arrived) = step_towards(unit.position, destination, unit.speed_per_tick());
                unit.face(destination);
                unit.position = self.layout.resolve_position(next);
                if arrived {
                    unit.move_target = None;
                }
            }

            let moved = horizontal_distance(before, unit.position) > f32::EPSILON;
            if moved && unit.cast.blocks_movement() {
                self.cancel_cast(actor, CancelCause::Moved);
            }
        }
    }

    fn start_dodge(&mut self, actor: ActorId, direction: Vec3) {
        let now = self.current_tick;
        let dodge = DodgeState::new(direction);
        if dodge.direction == Vec3::ZERO {
            return;
        }
        if !self.units[actor.index()].cast.is_idle() {
            self.cancel_cast(actor, CancelCause::Moved);
        }
        let unit = &mut self.units[actor.index()];
        unit.dodge = Some(dodge);
        unit.move_target = None;
        unit.dodge_ready_at = now + DODGE_COOLDOWN_TICKS;
        let origin = unit.position;
        debug!("{} dodges", unit.name);

        let immunity = AuraSpec {
            damage_immunity: true,
            dispellable: false,
            ..AuraSpec::new(
                AuraId::DodgeImmunity,
                AuraCategory::Buff,
                ticks_to_secs(DODGE_IMMUNITY_TICKS),
            )
        };
        self.apply_aura(actor, actor, &immunity, SpellSchool::Physical, None);

        let slow = AuraSpec {
            stat_mods: vec![StatModifier {
                stat: StatKind::MoveSpeed,
                multiplier: DODGE_SLOW_MULTIPLIER,
            }],
            ..AuraSpec::new(AuraId::DodgeSlow, AuraCategory::Debuff, ticks_to_secs(DODGE_SLOW_TICKS))
        };
        let enemy = actor.opponent();
        let enemy_unit = &self.units[enemy.index()];
        if enemy_unit.is_alive() && horizontal_distance(origin, enemy_unit.position) <= DODGE_SLOW_RADIUS {
            self.apply_aura(actor, enemy, &slow, SpellSchool::Physical, None);
        }
        self.publish(CombatEvent::Dodged {
            actor,
            direction: dodge.direction,
        });
    }

    fn auto_attack_phase(&mut self) {
        let now = self.current_tick;
        for slot in 0..self.units.len() {
            let actor = ActorId(slot as u8);
            let Some(target) = self.target_of(actor).filter(|t| *t != actor) else {
                continue;
            };
            let attacker = &self.units[slot];
            let defender = &self.units[target.index()];
            if !attacker.can_auto_attack() || now < attacker.next_swing_at {
                continue;
            }
            if !defender.is_alive() || defender.stealthed {
                continue;
            }
            if attacker.distance_to(defender) > attacker.auto_attack.range
                || !self.layout.has_line_of_sight(attacker.position, defender.position)
            {
                continue;
            }

            let swing = attacker.auto_attack.clone();
            let base = roll_range(swing.min_damage, swing.max_damage, &mut self.rng);
            let unit = &mut self.units[slot];
            unit.next_swing_at = now + secs_to_ticks(swing.interval_secs).max(1);
            if let Some(grant) = unit.swing_resource {
                unit.resources.gain(grant.kind, grant.amount);
            }
            self.publish(CombatEvent::AutoAttack {
                attacker: actor,
                target,
            });
            self.deal_damage(Hit {
                source: Some(actor),
                target,
                via: EffectSource::AutoAttack,
                school: SpellSchool::Physical,
                base,
                kind: HitKind::Direct,
                guaranteed_crit: false,
            });
        }
    }

    fn timer_phase(&mut self) {
        let now = self.current_tick;
        for slot in 0..self.units.len() {
            let holder = ActorId(slot as u8);
            let unit = &mut self.units[slot];
            if !unit.is_alive() {
                continue;
            }
            unit.resources.tick();
            unit.cooldowns.tick(now);
            unit.lockouts.tick(now);
            let report = unit.auras.tick(now, &mut unit.stats);
            let ended_cc = unit.cc.tick(now);
            let expired_shields = unit.absorbs.expire(now);

            for aura in report.expired {
                self.publish(CombatEvent::AuraRemoved {
                    target: holder,
                    aura: aura.id(),
                    reason: AuraRemoval::Expired,
                });
                if let Some(hook) = aura.spec.on_remove.as_deref() {
                    self.resolve_effect(hook, EffectContext::for_aura(&aura));
                }
            }
            for tick in report.ticked {
                self.resolve_aura_tick(tick);
            }
            for entry in ended_cc {
                self.publish(CombatEvent::CcRemoved {
                    target: holder,
                    kind: entry.kind,
                    broken: false,
                });
            }
            for shield in expired_shields {
                self.publish(CombatEvent::AuraRemoved {
                    target: holder,
                    aura: shield.id,
                    reason: AuraRemoval::Expired,
                });
            }
        }
    }

    /// Periodic damage/healing of one aura tick. A custom tick behavior
    /// replaces the aura's default damage and healing.
    fn resolve_aura_tick(&mut self, tick: AuraTick) {
        let via = EffectSource::Aura(tick.id);
        if let Some(behavior) = &tick.behavior {
            let dealt = self.deal_damage(Hit {
                source: Some(tick.source),
                target: tick.holder,
                via,
                school: tick.school,
                base: behavior.damage_for_tick(tick.ticks_done, tick.stacks),
                kind: HitKind::Periodic,
                guaranteed_crit: tick.guaranteed_crit,
            });
            if let TickBehavior::Drain { heal_fraction, .. } = behavior {
                if dealt > 0.0 {
                    self.heal(
                        Some(tick.source),
                        tick.source,
                        via,
                        dealt * heal_fraction,
                        HitKind::Periodic,
                        false,
                    );
                }
            }
            return;
        }

        let stacks = tick.stacks.max(1) as f32;
        if tick.tick_damage > 0.0 {
            self.deal_damage(Hit {
                source: Some(tick.source),
                target: tick.holder,
                via,
                school: tick.school,
                base: tick.tick_damage * stacks,
                kind: HitKind::Periodic,
                guaranteed_crit: tick.guaranteed_crit,
            });
        }
        if tick.tick_healing > 0.0 {
            self.heal(
                Some(tick.source),
                tick.holder,
                via,
                tick.tick_healing * stacks,
                HitKind::Periodic,
                tick.guaranteed_crit,
            );
        }
    }

    fn hazard_phase(&mut self) {
        let now = self.current_tick;

        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.scheduled_hazards)
            .into_iter()
            .partition(|h| secs_to_ticks(h.at_secs) <= now);
        self.scheduled_hazards = pending;
        for scheduled in due {
            self.place_hazard(None, &scheduled.spec, Vec3::new(scheduled.x, 0.0, scheduled.z));
        }

        let (expired, active): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.hazards).into_iter().partition(|h| h.is_expired(now));
        self.hazards = active;
        for hazard in expired {
            self.publish(CombatEvent::HazardExpired { id: hazard.id });
        }

        for index in 0..self.hazards.len() {
            if !self.hazards[index].poll_pulse(now) {
                continue;
            }
            let hazard = self.hazards[index].clone();
            for slot in 0..self.units.len() {
                let actor = ActorId(slot as u8);
                let unit = &self.units[slot];
                if !unit.is_alive() || !hazard.affects(actor) || !hazard.contains(unit.position) {
                    continue;
                }
                match hazard.kind {
                    HazardKind::DamageZone { damage, school } => {
                        self.deal_damage(Hit {
                            source: hazard.source,
                            target: actor,
                            via: EffectSource::Hazard(hazard.id),
                            school,
                            base: damage,
                            kind: HitKind::Periodic,
                            guaranteed_crit: false,
                        });
                    }
                    HazardKind::RootZone { root_secs } => {
                        self.apply_crowd_control(hazard.source, actor, CcType::Root, secs_to_ticks(root_secs), None);
                    }
                }
            }
        }
    }

    fn check_match_end(&mut self) {
        let now = self.current_tick;
        let [a, b] = &self.units;
        let decided = match (a.is_alive(), b.is_alive()) {
            (false, false) => Some((None, MatchEndReason::Death)),
            (false, true) => Some((Some(b.id), MatchEndReason::Death)),
            (true, false) => Some((Some(a.id), MatchEndReason::Death)),
            (true, true) if now + 1 >= self.tick_budget => {
                let (pa, pb) = (a.health_pct(), b.health_pct());
                let winner = if (pa - pb).abs() <= f32::EPSILON {
                    None
                } else if pa > pb {
                    Some(a.id)
                } else {
                    Some(b.id)
                };
                Some((winner, MatchEndReason::Timeout))
            }
            (true, true) => None,
        };

        if let Some((winner, reason)) = decided {
            match winner {
                Some(w) => info!(
                    "Match ended at tick {}: {} wins ({:?})",
                    now,
                    self.units[w.index()].name,
                    reason
                ),
                None => info!("Match ended at tick {} in a DRAW ({:?})", now, reason),
            }
            self.outcome = Some(MatchOutcome {
                winner,
                reason,
                ended_at: now,
            });
            self.publish(CombatEvent::MatchEnded { winner, reason });
        }
    }

    // ------------------------------------------------------------------
    // Effect dispatcher
    // ------------------------------------------------------------------

    fn resolve_effect(&mut self, effect: &Effect, ctx: EffectContext) {
        let now = self.current_tick;
        match effect {
            Effect::DirectDamage(spec) => {
                let base = roll_range(spec.min, spec.max, &mut self.rng);
                self.deal_damage(Hit {
                    source: Some(ctx.caster),
                    target: ctx.target,
                    via: ctx.via,
                    school: spec.school.unwrap_or(ctx.school),
                    base,
                    kind: HitKind::Direct,
                    guaranteed_crit: spec.guaranteed_crit,
                });
            }
            Effect::Heal(spec) => {
                let base = roll_range(spec.min, spec.max, &mut self.rng);
                let target = ctx.resolve(spec.target);
                self.heal(Some(ctx.caster), target, ctx.via, base, HitKind::Direct, spec.guaranteed_crit);
            }
            Effect::PeriodicDamage(spec) | Effect::StatAura(spec) => {
                let holder = ctx.resolve(spec.target);
                self.apply_aura(ctx.caster, holder, spec, ctx.school, ctx.ability);
            }
            Effect::CrowdControl(spec) => {
                self.apply_crowd_control(
                    Some(ctx.caster),
                    ctx.target,
                    spec.kind,
                    secs_to_ticks(spec.duration_secs),
                    spec.break_on_damage,
                );
            }
            Effect::Absorb(spec) => {
                let unit = &mut self.units[ctx.caster.index()];
                if !unit.is_alive() {
                    return;
                }
                unit.absorbs.grant(AbsorbShield {
                    id: spec.id,
                    source: ctx.caster,
                    remaining: spec.amount,
                    expires_at: now + secs_to_ticks(spec.duration_secs),
                });
                self.publish(CombatEvent::AbsorbGranted {
                    target: ctx.caster,
                    aura: spec.id,
                    amount: spec.amount,
                });
            }
            Effect::ResourceGrant(grant) => {
                let gained = self.units[ctx.caster.index()].resources.gain(grant.kind, grant.amount);
                if gained > 0.0 {
                    self.publish(CombatEvent::ResourceGained {
                        actor: ctx.caster,
                        kind: grant.kind,
                        amount: gained,
                    });
                }
            }
            Effect::Interrupt { lockout_secs } => {
                self.interrupt(ctx.target, secs_to_ticks(*lockout_secs), Some(ctx.caster));
            }
            Effect::Stealth => self.enter_stealth(ctx.caster),
            Effect::Dispel => self.dispel(ctx),
            Effect::PlaceHazard(spec) => {
                let anchor = self.units[ctx.resolve(spec.anchor).index()].position;
                self.place_hazard(Some(ctx.caster), spec, anchor);
            }
            Effect::Composite(children) => {
                for child in children {
                    self.resolve_effect(child, ctx);
                }
            }
            Effect::Custom(behavior) => self.resolve_custom(behavior, ctx),
        }
    }

    /// Remove the most recent dispellable debuff from ourselves, or buff from an enemy.
    fn dispel(&mut self, ctx: EffectContext) {
        let category = if ctx.target == ctx.caster {
            AuraCategory::Debuff
        } else {
            AuraCategory::Buff
        };
        let unit = &mut self.units[ctx.target.index()];
        let Some(aura) = unit.auras.dispel_one(category, &mut unit.stats) else {
            return;
        };
        debug!("{} dispelled from {}", aura.id().name(), unit.name);
        self.publish(CombatEvent::AuraRemoved {
            target: ctx.target,
            aura: aura.id(),
            reason: AuraRemoval::Dispelled,
        });
        if let Some(hook) = aura.spec.on_dispel.as_deref() {
            self.resolve_effect(hook, EffectContext::for_aura(&aura));
        }
    }

    fn resolve_custom(&mut self, behavior: &CustomBehavior, ctx: EffectContext) {
        let now = self.current_tick;
        match behavior {
            CustomBehavior::Detonate {
                aura,
                multiplier,
                fallback,
            } => {
                let existing = self.units[ctx.target.index()].auras.get(*aura).cloned();
                match existing {
                    Some(found) => {
                        let per_tick = match &found.spec.on_tick {
                            Some(behavior) => behavior.damage_for_tick(found.ticks_done + 1, found.stacks),
                            None => found.spec.tick_damage * found.stacks.max(1) as f32,
                        };
                        let base = per_tick * found.remaining_ticks(now) as f32 * multiplier;
                        self.remove_aura(ctx.target, *aura, AuraRemoval::Consumed);
                        self.deal_damage(Hit {
                            source: Some(ctx.caster),
                            target: ctx.target,
                            via: ctx.via,
                            school: found.school,
                            base,
                            kind: HitKind::Direct,
                            guaranteed_crit: false,
                        });
                    }
                    None => self.resolve_effect(&Effect::DirectDamage(fallback.clone()), ctx),
                }
            }
            CustomBehavior::ComboFinisher {
                damage_per_point,
                stun_secs_per_point,
            } => {
                let spent = ctx
                    .ability
                    .and_then(|a| self.content.ability(a))
                    .map_or(0.0, |d| d.cost_of(ResourceType::ComboPoints));
                let points = self.units[ctx.caster.index()].resources.drain(ResourceType::ComboPoints) + spent;
                debug!("Finisher with {} combo points", points);
                if *damage_per_point > 0.0 && points > 0.0 {
                    self.deal_damage(Hit {
                        source: Some(ctx.caster),
                        target: ctx.target,
                        via: ctx.via,
                        school: ctx.school,
                        base: points * damage_per_point,
                        kind: HitKind::Direct,
                        guaranteed_crit: false,
                    });
                }
                if *stun_secs_per_point > 0.0 && points > 0.0 {
                    self.apply_crowd_control(
                        Some(ctx.caster),
                        ctx.target,
                        CcType::Stun,
                        secs_to_ticks(points * stun_secs_per_point),
                        None,
                    );
                }
            }
        }
    }
}
