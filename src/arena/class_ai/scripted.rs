//! Scripted Controller
//!
//! One controller drives every class; class flavour comes from the abilities
//! a unit has equipped and how they score.
//!
//! Each tick the controller:
//! 1. Re-acquires a target when the current one died or vanished into stealth
//! 2. Picks a behavior state from health, range and what is off cooldown
//! 3. Moves according to that state
//! 4. Scores every ability that currently validates and picks the best
//!    positive one, queued after the difficulty's reaction delay
//!
//! ## Scoring
//! - Interrupts score near-maximal only while the target casts something
//!   interruptible
//! - Defensives scale with missing health; below the emergency threshold they
//!   score at least 500
//! - Crowd control scores negative against immune or DR-immune targets
//! - Damage over time scores high only while its aura is missing on the target

use bevy::log::debug;
use bevy::math::Vec3;

use super::{most_urgent_debuff, CombatContext, DecisionMaker, Orders};
use crate::arena::abilities::{AbilityDef, AbilityId, CustomBehavior, Effect, EffectTarget, Targeting};
use crate::arena::auras::AuraId;
use crate::arena::combat_core::Match;
use crate::arena::constants::{
    BURST_HP_THRESHOLD, DEFENSIVE_HP_THRESHOLD, EMERGENCY_HP_THRESHOLD, MELEE_RANGE, SAFE_KITING_DISTANCE,
};
use crate::arena::crowd_control::CcType;
use crate::arena::match_config::Difficulty;
use crate::arena::movement::find_best_kiting_direction;
use crate::arena::geometry::horizontal_direction;
use crate::arena::resources::ResourceType;
use crate::arena::stats::StatKind;
use crate::arena::unit::{ActorId, Unit};

/// High-level behavior of the scripted controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BehaviorState {
    /// Low health: defensives first
    Emergency,
    /// Target is low: spend burst
    BurstWindow,
    /// Crowd control is available and lands
    CcChain,
    /// Default engaged state
    Pressure,
    /// Ranged unit with a melee enemy on top of it
    Kite,
    /// Out of range or line of sight
    Chase,
    /// Ranged unit breaking line of sight behind a pillar
    DefensivePositioning,
}

impl BehaviorState {
    /// Longest a state is held before the controller re-engages.
    pub fn max_duration_ticks(&self) -> u64 {
        match self {
            BehaviorState::Emergency => 100,
            BehaviorState::BurstWindow => 160,
            BehaviorState::CcChain => 120,
            BehaviorState::Pressure => 200,
            BehaviorState::Kite => 80,
            BehaviorState::Chase => 200,
            BehaviorState::DefensivePositioning => 80,
        }
    }

    /// States that may be held indefinitely by re-entering them.
    fn is_engaging(&self) -> bool {
        matches!(self, BehaviorState::Pressure | BehaviorState::Chase)
    }
}

/// What an ability does, as far as scoring cares.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AbilityProfile {
    /// Expected direct damage (channels: all ticks)
    pub damage: f32,
    pub heals: bool,
    pub absorb: bool,
    pub defensive_aura: bool,
    pub burst_aura: bool,
    pub debuff: Option<AuraId>,
    pub dot: Option<AuraId>,
    pub cc: Option<CcType>,
    pub interrupt: bool,
    pub stealth: bool,
    pub dispel: bool,
    pub hazard: bool,
    pub detonate: Option<AuraId>,
    pub finisher: bool,
}

impl AbilityProfile {
    pub fn of(def: &AbilityDef) -> Self {
        let mut profile = Self::default();
        for effect in def.effects() {
            effect.visit(&mut |e| profile.note(e, 1.0));
        }
        if let Some(channel) = &def.channel {
            let ticks = channel.duration_secs.max(1.0);
            channel.tick.visit(&mut |e| profile.note(e, ticks));
        }
        profile
    }

    fn note(&mut self, effect: &Effect, repeats: f32) {
        match effect {
            Effect::DirectDamage(spec) => self.damage += spec.average() * repeats,
            Effect::Heal(_) => self.heals = true,
            Effect::PeriodicDamage(aura) if aura.target == EffectTarget::Target => self.dot = Some(aura.id),
            Effect::PeriodicDamage(_) => {}
            Effect::CrowdControl(cc) => self.cc = Some(cc.kind),
            Effect::StatAura(aura) if aura.target == EffectTarget::Caster => {
                let protective = aura.damage_immunity
                    || aura.cc_immunity
                    || aura
                        .stat_mods
                        .iter()
                        .any(|m| m.stat == StatKind::DamageTaken && m.multiplier < 1.0);
                if protective {
                    self.defensive_aura = true;
                } else {
                    self.burst_aura = true;
                }
            }
            Effect::StatAura(aura) => self.debuff = Some(aura.id),
            Effect::Absorb(_) => self.absorb = true,
            Effect::ResourceGrant(_) | Effect::Composite(_) => {}
            Effect::Interrupt { .. } => self.interrupt = true,
            Effect::Stealth => self.stealth = true,
            Effect::Dispel => self.dispel = true,
            Effect::PlaceHazard(_) => self.hazard = true,
            Effect::Custom(CustomBehavior::Detonate { aura, .. }) => self.detonate = Some(*aura),
            Effect::Custom(CustomBehavior::ComboFinisher {
                stun_secs_per_point, ..
            }) => {
                self.finisher = true;
                if *stun_secs_per_point > 0.0 {
                    self.cc = Some(CcType::Stun);
                }
            }
        }
    }

    /// Protects the user without hurting anyone.
    pub fn is_defensive(&self) -> bool {
        self.absorb || self.defensive_aura || (self.heals && self.damage <= 0.0)
    }
}

/// Score a defensive ability from the user's health fraction.
pub fn defensive_score(health_pct: f32) -> f32 {
    if health_pct < EMERGENCY_HP_THRESHOLD {
        500.0 + (1.0 - health_pct) * 400.0
    } else if health_pct < DEFENSIVE_HP_THRESHOLD {
        150.0 + (1.0 - health_pct) * 200.0
    } else {
        -1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct PendingAction {
    ability: AbilityId,
    target: Option<ActorId>,
    ready_at: u64,
}

/// Reference scripted decision maker.
#[derive(Debug)]
pub struct ScriptedController {
    actor: ActorId,
    difficulty: Difficulty,
    state: BehaviorState,
    state_entered_at: u64,
    /// A state that ran out its duration, blocked until the tick given
    suppressed: Option<(BehaviorState, u64)>,
    pending: Option<PendingAction>,
}

impl ScriptedController {
    pub fn new(actor: ActorId, difficulty: Difficulty) -> Self {
        Self {
            actor,
            difficulty,
            state: BehaviorState::Chase,
            state_entered_at: 0,
            suppressed: None,
            pending: None,
        }
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Nearest live, visible enemy. In a duel that is the opponent or nobody.
    fn acquire_target(&self, ctx: &CombatContext) -> Option<ActorId> {
        if let Some(current) = ctx.target_unit() {
            if current.id != self.actor && current.is_alive() && !current.stealthed {
                return Some(current.id);
            }
        }
        ctx.enemy_unit()
            .filter(|enemy| enemy.is_alive() && !enemy.stealthed)
            .map(|enemy| enemy.id)
    }

    /// Conservative stand-in for tracking enemy cooldowns: assume the enemy
    /// always has a defensive available.
    fn enemy_defensive_may_be_ready(&self, _ctx: &CombatContext) -> bool {
        true
    }

    fn has_ready(&self, ctx: &CombatContext, me: &Unit, wanted: impl Fn(&AbilityProfile) -> bool) -> bool {
        let target = ctx.world.target_of(self.actor);
        me.abilities.iter().any(|ability| {
            ctx.world.content().ability(*ability).is_some_and(|def| {
                wanted(&AbilityProfile::of(def)) && ctx.world.validate(self.actor, *ability, aim(def, target)).is_ok()
            })
        })
    }

    /// Desired state before the duration cap is applied.
    fn evaluate_state(&self, ctx: &CombatContext) -> BehaviorState {
        let Some(me) = ctx.self_unit() else {
            return BehaviorState::Chase;
        };
        let hp = me.health_pct();
        let ranged = me.preferred_range > MELEE_RANGE;

        if hp < EMERGENCY_HP_THRESHOLD {
            return BehaviorState::Emergency;
        }
        let Some(target) = ctx.target_unit() else {
            return BehaviorState::Chase;
        };
        let distance = me.distance_to(target);
        let enemy_is_melee = target.preferred_range <= MELEE_RANGE;

        if ranged && enemy_is_melee && distance < SAFE_KITING_DISTANCE && !ctx.is_ccd(target.id) {
            if hp < DEFENSIVE_HP_THRESHOLD && !ctx.world.layout().pillars.is_empty() {
                return BehaviorState::DefensivePositioning;
            }
            return BehaviorState::Kite;
        }
        if distance > me.preferred_range || !ctx.has_line_of_sight_to_target() {
            return BehaviorState::Chase;
        }
        if target.health_pct() < BURST_HP_THRESHOLD {
            return BehaviorState::BurstWindow;
        }
        let cc_ready = self.has_ready(ctx, me, |p| p.cc.is_some() && !p.finisher);
        if cc_ready && !ctx.is_ccd(target.id) && !target.is_cc_immune() {
            return BehaviorState::CcChain;
        }
        BehaviorState::Pressure
    }

    /// Pressure when the target is reachable, otherwise chase it.
    fn engage_state(&self, ctx: &CombatContext) -> BehaviorState {
        match (ctx.self_unit(), ctx.target_unit()) {
            (Some(me), Some(target))
                if me.distance_to(target) <= me.preferred_range && ctx.has_line_of_sight_to_target() =>
            {
                BehaviorState::Pressure
            }
            _ => BehaviorState::Chase,
        }
    }

    fn update_state(&mut self, ctx: &CombatContext, tick: u64) {
        let held_for = tick.saturating_sub(self.state_entered_at);
        let limit = self.state.max_duration_ticks();
        let mut desired = self.evaluate_state(ctx);

        // Time is up: block the state for as long again and re-engage
        if desired == self.state && held_for >= limit && !self.state.is_engaging() {
            self.suppressed = Some((self.state, tick + limit));
        }
        if let Some((blocked, until)) = self.suppressed {
            if tick >= until {
                self.suppressed = None;
            } else if desired == blocked {
                desired = self.engage_state(ctx);
            }
        }

        if desired != self.state {
            debug!("{} AI: {:?} -> {:?}", self.actor, self.state, desired);
            self.state = desired;
            self.state_entered_at = tick;
        } else if held_for >= limit {
            self.state_entered_at = tick;
        }
    }

    fn plan_movement(&self, ctx: &CombatContext, orders: &mut Orders, tick: u64) {
        let Some(me) = ctx.self_unit() else {
            return;
        };
        if !me.cast.is_idle() && me.cast.blocks_movement() {
            return;
        }
        let Some(target) = ctx.target_unit().filter(|t| t.id != self.actor) else {
            orders.stop();
            return;
        };
        let layout = ctx.world.layout();
        let distance = me.distance_to(target);
        let engage_range = if me.preferred_range <= MELEE_RANGE {
            MELEE_RANGE * 0.8
        } else {
            me.preferred_range * 0.9
        };

        match self.state {
            BehaviorState::Kite | BehaviorState::Emergency if me.preferred_range > MELEE_RANGE => {
                let away = find_best_kiting_direction(layout, me.position, target.position, SAFE_KITING_DISTANCE);
                if distance <= MELEE_RANGE + 1.0 && tick >= me.dodge_ready_at && me.dodge.is_none() && away != Vec3::ZERO
                {
                    orders.dodge(away);
                }
                if away != Vec3::ZERO {
                    orders.move_to(me.position + away * SAFE_KITING_DISTANCE);
                }
            }
            BehaviorState::DefensivePositioning => match layout.nearest_pillar(me.position) {
                Some(pillar) => orders.move_to(layout.hiding_spot(pillar, target.position)),
                None => {
                    let away = find_best_kiting_direction(layout, me.position, target.position, SAFE_KITING_DISTANCE);
                    orders.move_to(me.position + away * SAFE_KITING_DISTANCE);
                }
            },
            _ => {
                let in_sight = ctx.has_line_of_sight_to_target();
                if distance > engage_range || !in_sight {
                    let approach = if in_sight {
                        target.position + horizontal_direction(target.position, me.position) * engage_range
                    } else {
                        target.position
                    };
                    orders.move_to(approach);
                } else if me.move_target.is_some() {
                    orders.stop();
                }
            }
        }
    }

    /// Score one ability that already validates. Positive scores are usable.
    pub fn score(&self, ctx: &CombatContext, def: &AbilityDef) -> f32 {
        let Some(me) = ctx.self_unit() else {
            return -1.0;
        };
        let profile = AbilityProfile::of(def);
        let hp = me.health_pct();
        let target = ctx.target_unit().filter(|t| t.id != self.actor);

        if profile.interrupt {
            return match target {
                Some(t) if t.cast.is_interruptible() => 900.0,
                _ => -1.0,
            };
        }
        if profile.is_defensive() {
            return defensive_score(hp);
        }
        if profile.dispel {
            return match most_urgent_debuff(me) {
                Some((_, priority)) => 100.0 + priority as f32,
                None => -1.0,
            };
        }
        if profile.stealth {
            return match target {
                _ if me.stealthed => -1.0,
                Some(t) if me.distance_to(t) < 12.0 => -1.0,
                _ => 300.0,
            };
        }

        let Some(target) = target else {
            return -1.0;
        };
        let burst = if self.state == BehaviorState::BurstWindow { 1.3 } else { 1.0 };

        if profile.finisher {
            let points = me.resources.current(ResourceType::ComboPoints);
            let worth_it = points >= 4.0
                || (points >= 1.0 && (self.state == BehaviorState::BurstWindow || target.health_pct() < 0.2));
            if !worth_it {
                return -1.0;
            }
            return 200.0 + points * 60.0;
        }
        if let Some(aura) = profile.detonate {
            return if target.auras.has(aura) { 420.0 } else { 40.0 };
        }
        if let Some(aura) = profile.dot {
            return if target.auras.has(aura) { -1.0 } else { 350.0 };
        }
        if let Some(kind) = profile.cc {
            let wasted = target.is_cc_immune()
                || ctx.is_ccd(target.id)
                || kind
                    .dr_category()
                    .is_some_and(|category| ctx.is_dr_immune(target.id, category));
            if wasted {
                return -100.0;
            }
            let mut score = 300.0;
            if self.state == BehaviorState::CcChain {
                score += 200.0;
            }
            if hp < DEFENSIVE_HP_THRESHOLD {
                score += 100.0;
            }
            return score;
        }
        if profile.hazard {
            return if target.cc.prevents_movement() { 450.0 } else { 120.0 };
        }
        if profile.burst_aura {
            if self.state == BehaviorState::BurstWindow {
                return 400.0;
            }
            return if self.enemy_defensive_may_be_ready(ctx) { 80.0 } else { 300.0 };
        }

        let mut score = -1.0;
        if profile.damage > 0.0 {
            score = (profile.damage.min(350.0) + 50.0) * burst;
            let melee_threat = target.preferred_range <= MELEE_RANGE && me.distance_to(target) <= MELEE_RANGE + 1.0;
            if (def.cast_ticks() > 0 || def.channel.is_some()) && melee_threat {
                score *= 0.5;
            }
            if profile.heals {
                score += (1.0 - hp) * 200.0;
            }
        }
        if let Some(aura) = profile.debuff {
            if !target.auras.has(aura) {
                score = score.max(0.0) + 150.0;
            }
        }
        score
    }

    /// Highest-scoring ability that validates right now, if its score is positive.
    pub fn choose_action(&self, world: &Match) -> Option<(AbilityId, Option<ActorId>, f32)> {
        let ctx = CombatContext::new(world, self.actor);
        let me = ctx.self_unit()?;
        let selected = world.target_of(self.actor);

        let mut best: Option<(AbilityId, Option<ActorId>, f32)> = None;
        for ability in &me.abilities {
            let Some(def) = world.content().ability(*ability) else {
                continue;
            };
            let target = aim(def, selected);
            if world.validate(self.actor, *ability, target).is_err() {
                continue;
            }
            let score = self.score(&ctx, def);
            if score > 0.0 && best.map_or(true, |(_, _, s)| score > s) {
                best = Some((*ability, target, score));
            }
        }
        best
    }
}

fn aim(def: &AbilityDef, selected: Option<ActorId>) -> Option<ActorId> {
    match def.targeting {
        Targeting::SelfOnly => None,
        Targeting::Enemy => selected,
    }
}

impl DecisionMaker for ScriptedController {
    fn decide(&mut self, world: &Match, orders: &mut Orders, tick: u64) {
        let ctx = CombatContext::new(world, self.actor);
        if ctx.self_unit().map_or(true, |me| !me.is_alive()) {
            return;
        }

        let target = self.acquire_target(&ctx);
        let retargeted = target != world.target_of(self.actor);
        if retargeted {
            orders.set_target(target);
        }

        self.update_state(&ctx, tick);
        self.plan_movement(&ctx, orders, tick);

        if let Some(pending) = self.pending {
            if tick < pending.ready_at {
                return;
            }
            self.pending = None;
            if world.validate(self.actor, pending.ability, pending.target).is_ok() {
                orders.queue_action(pending.ability, pending.target);
            }
            return;
        }

        if retargeted {
            // The new selection applies after this call; score against it next tick
            return;
        }
        let Some((ability, target, score)) = self.choose_action(world) else {
            return;
        };
        debug!("{} AI picks {} (score {:.0})", self.actor, ability.name(), score);
        let delay = self.difficulty.reaction_delay_ticks();
        if delay == 0 {
            orders.queue_action(ability, target);
        } else {
            self.pending = Some(PendingAction {
                ability,
                target,
                ready_at: tick + delay,
            });
        }
    }
}
