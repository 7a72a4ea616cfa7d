//! Aura & Status Effect State
//!
//! Timed buffs and debuffs attached to a unit. Includes:
//! - Apply/refresh with capped stacks
//! - Periodic tick scheduling (DoTs, HoTs, custom on-tick behaviors)
//! - Stat modifiers owned by the aura and reversed on removal
//! - Absorb shields, consumed in the order they were granted
//!
//! The manager only mutates state and reports what happened; the match
//! orchestrator resolves the resulting damage, healing and hooks.

use serde::{Deserialize, Serialize};

use super::abilities::{AbilityId, Effect, EffectTarget, SpellSchool};
use super::constants::secs_to_ticks;
use super::stats::{StatBlock, StatModifier};
use super::unit::ActorId;

/// Identity of every aura the engine knows about. Re-applying the same id
/// refreshes instead of adding a second copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuraId {
    MortalWound,
    Hamstring,
    ShieldWall,
    Chilled,
    IceBarrier,
    ArcanePower,
    Exposed,
    Rupture,
    Evasion,
    Corruption,
    Agony,
    DodgeImmunity,
    DodgeSlow,
}

impl AuraId {
    pub fn name(&self) -> &'static str {
        match self {
            AuraId::MortalWound => "Mortal Wound",
            AuraId::Hamstring => "Hamstring",
            AuraId::ShieldWall => "Shield Wall",
            AuraId::Chilled => "Chilled",
            AuraId::IceBarrier => "Ice Barrier",
            AuraId::ArcanePower => "Arcane Power",
            AuraId::Exposed => "Exposed",
            AuraId::Rupture => "Rupture",
            AuraId::Evasion => "Evasion",
            AuraId::Corruption => "Corruption",
            AuraId::Agony => "Agony",
            AuraId::DodgeImmunity => "Dodge",
            AuraId::DodgeSlow => "Dazed",
        }
    }
}

/// Helpful or harmful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuraCategory {
    Buff,
    #[default]
    Debuff,
}

/// Custom per-tick behavior. When present it replaces the default
/// tick damage/healing of the aura.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TickBehavior {
    /// Damage grows by `step` every tick from `start`, capped at `max` (per stack).
    Ramping { start: f32, step: f32, max: f32 },
    /// Damage the holder and heal the aura's source for a share of what landed.
    Drain { damage: f32, heal_fraction: f32 },
}

impl TickBehavior {
    /// Raw damage for the `ticks_done`-th tick (1-based).
    pub fn damage_for_tick(&self, ticks_done: u32, stacks: u8) -> f32 {
        let per_stack = match self {
            TickBehavior::Ramping { start, step, max } => {
                (start + step * ticks_done.saturating_sub(1) as f32).min(*max)
            }
            TickBehavior::Drain { damage, .. } => *damage,
        };
        per_stack * stacks.max(1) as f32
    }
}

fn one() -> u8 {
    1
}

fn yes() -> bool {
    true
}

/// Content description of an aura.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuraSpec {
    pub id: AuraId,
    #[serde(default)]
    pub category: AuraCategory,
    pub duration_secs: f32,
    #[serde(default)]
    pub target: EffectTarget,
    #[serde(default)]
    pub tick_interval_secs: f32,
    /// Damage per tick per stack
    #[serde(default)]
    pub tick_damage: f32,
    /// Healing per tick per stack
    #[serde(default)]
    pub tick_healing: f32,
    #[serde(default)]
    pub stat_mods: Vec<StatModifier>,
    /// Additive incoming damage bonus, summed across auras
    #[serde(default)]
    pub damage_taken_bonus: f32,
    /// Additive incoming healing bonus, summed across auras
    #[serde(default)]
    pub healing_taken_bonus: f32,
    #[serde(default = "one")]
    pub max_stacks: u8,
    #[serde(default = "yes")]
    pub dispellable: bool,
    /// Periodic ticks always crit
    #[serde(default)]
    pub guaranteed_crit: bool,
    #[serde(default)]
    pub damage_immunity: bool,
    #[serde(default)]
    pub cc_immunity: bool,
    #[serde(default)]
    pub on_apply: Option<Box<Effect>>,
    #[serde(default)]
    pub on_tick: Option<TickBehavior>,
    #[serde(default)]
    pub on_remove: Option<Box<Effect>>,
    #[serde(default)]
    pub on_dispel: Option<Box<Effect>>,
}

impl AuraSpec {
    /// A plain aura with nothing but an id, category and duration.
    pub fn new(id: AuraId, category: AuraCategory, duration_secs: f32) -> Self {
        Self {
            id,
            category,
            duration_secs,
            target: EffectTarget::Target,
            tick_interval_secs: 0.0,
            tick_damage: 0.0,
            tick_healing: 0.0,
            stat_mods: Vec::new(),
            damage_taken_bonus: 0.0,
            healing_taken_bonus: 0.0,
            max_stacks: 1,
            dispellable: true,
            guaranteed_crit: false,
            damage_immunity: false,
            cc_immunity: false,
            on_apply: None,
            on_tick: None,
            on_remove: None,
            on_dispel: None,
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.tick_interval_secs > 0.0
            && (self.tick_damage > 0.0 || self.tick_healing > 0.0 || self.on_tick.is_some())
    }
}

/// An aura instance on a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Aura {
    pub spec: AuraSpec,
    pub source: ActorId,
    pub holder: ActorId,
    pub school: SpellSchool,
    pub ability: Option<AbilityId>,
    pub applied_at: u64,
    pub expires_at: u64,
    pub tick_interval: u64,
    pub next_tick_at: Option<u64>,
    pub ticks_done: u32,
    pub stacks: u8,
}

impl Aura {
    pub fn new(
        spec: AuraSpec,
        source: ActorId,
        holder: ActorId,
        school: SpellSchool,
        ability: Option<AbilityId>,
        now: u64,
    ) -> Self {
        let tick_interval = if spec.is_periodic() {
            secs_to_ticks(spec.tick_interval_secs).max(1)
        } else {
            0
        };
        let expires_at = now + secs_to_ticks(spec.duration_secs);
        Self {
            source,
            holder,
            school,
            ability,
            applied_at: now,
            expires_at,
            tick_interval,
            next_tick_at: (tick_interval > 0).then_some(now + tick_interval),
            ticks_done: 0,
            stacks: 1,
            spec,
        }
    }

    pub fn id(&self) -> AuraId {
        self.spec.id
    }

    pub fn is_harmful(&self) -> bool {
        self.spec.category == AuraCategory::Debuff
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Ticks this aura would still deliver if left alone.
    pub fn remaining_ticks(&self, now: u64) -> u32 {
        match self.next_tick_at {
            Some(next) if self.tick_interval > 0 && next < self.expires_at && now < self.expires_at => {
                ((self.expires_at - 1 - next) / self.tick_interval + 1) as u32
            }
            _ => 0,
        }
    }
}

/// Result of applying an aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuraApplication {
    Applied,
    Refreshed { stacks: u8 },
}

/// A periodic tick reported by [`AuraManager::tick`].
#[derive(Clone, Debug, PartialEq)]
pub struct AuraTick {
    pub id: AuraId,
    pub source: ActorId,
    pub holder: ActorId,
    pub school: SpellSchool,
    pub ability: Option<AbilityId>,
    pub stacks: u8,
    pub ticks_done: u32,
    pub tick_damage: f32,
    pub tick_healing: f32,
    pub guaranteed_crit: bool,
    pub behavior: Option<TickBehavior>,
}

/// Everything that happened to a unit's auras during one tick.
#[derive(Clone, Debug, Default)]
pub struct AuraTickReport {
    pub ticked: Vec<AuraTick>,
    pub expired: Vec<Aura>,
}

/// All auras on one unit, in application order.
#[derive(Clone, Debug, Default)]
pub struct AuraManager {
    auras: Vec<Aura>,
}

impl AuraManager {
    /// Apply or refresh. Refreshing resets expiry to the new aura's expiry and
    /// adds a stack up to the cap; stat modifiers are applied only once.
    pub fn apply(&mut self, aura: Aura, stats: &mut StatBlock) -> AuraApplication {
        if let Some(existing) = self.auras.iter_mut().find(|a| a.id() == aura.id()) {
            existing.expires_at = aura.expires_at;
            existing.source = aura.source;
            if existing.stacks < existing.spec.max_stacks.max(1) {
                existing.stacks += 1;
            }
            return AuraApplication::Refreshed {
                stacks: existing.stacks,
            };
        }
        for modifier in &aura.spec.stat_mods {
            stats.add_modifier(aura.id(), *modifier);
        }
        self.auras.push(aura);
        AuraApplication::Applied
    }

    /// Expire finished auras, then advance periodic schedules.
    pub fn tick(&mut self, now: u64, stats: &mut StatBlock) -> AuraTickReport {
        let mut report = AuraTickReport::default();
        let mut i = 0;
        while i < self.auras.len() {
            if self.auras[i].is_expired(now) {
                let aura = self.auras.remove(i);
                stats.remove_modifiers(aura.id());
                report.expired.push(aura);
                continue;
            }
            let aura = &mut self.auras[i];
            if let Some(due) = aura.next_tick_at {
                if now >= due {
                    aura.ticks_done += 1;
                    aura.next_tick_at = Some(due + aura.tick_interval);
                    report.ticked.push(AuraTick {
                        id: aura.id(),
                        source: aura.source,
                        holder: aura.holder,
                        school: aura.school,
                        ability: aura.ability,
                        stacks: aura.stacks,
                        ticks_done: aura.ticks_done,
                        tick_damage: aura.spec.tick_damage,
                        tick_healing: aura.spec.tick_healing,
                        guaranteed_crit: aura.spec.guaranteed_crit,
                        behavior: aura.spec.on_tick.clone(),
                    });
                }
            }
            i += 1;
        }
        report
    }

    pub fn remove(&mut self, id: AuraId, stats: &mut StatBlock) -> Option<Aura> {
        let index = self.auras.iter().position(|a| a.id() == id)?;
        let aura = self.auras.remove(index);
        stats.remove_modifiers(id);
        Some(aura)
    }

    /// Remove the most recently applied dispellable aura of the given category.
    pub fn dispel_one(&mut self, category: AuraCategory, stats: &mut StatBlock) -> Option<Aura> {
        let index = self
            .auras
            .iter()
            .rposition(|a| a.spec.dispellable && a.spec.category == category)?;
        let aura = self.auras.remove(index);
        stats.remove_modifiers(aura.id());
        Some(aura)
    }

    /// Remove everything (death).
    pub fn clear(&mut self, stats: &mut StatBlock) -> Vec<Aura> {
        let removed: Vec<Aura> = self.auras.drain(..).collect();
        for aura in &removed {
            stats.remove_modifiers(aura.id());
        }
        removed
    }

    pub fn get(&self, id: AuraId) -> Option<&Aura> {
        self.auras.iter().find(|a| a.id() == id)
    }

    pub fn has(&self, id: AuraId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Aura> {
        self.auras.iter()
    }

    pub fn len(&self) -> usize {
        self.auras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auras.is_empty()
    }

    pub fn has_damage_immunity(&self) -> bool {
        self.auras.iter().any(|a| a.spec.damage_immunity)
    }

    pub fn has_cc_immunity(&self) -> bool {
        self.auras.iter().any(|a| a.spec.cc_immunity)
    }

    /// Sum of additive incoming-damage bonuses.
    pub fn damage_taken_bonus(&self) -> f32 {
        self.auras.iter().map(|a| a.spec.damage_taken_bonus).sum()
    }

    /// Sum of additive incoming-healing bonuses.
    pub fn healing_taken_bonus(&self) -> f32 {
        self.auras.iter().map(|a| a.spec.healing_taken_bonus).sum()
    }
}

/// A damage-absorbing shield.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AbsorbShield {
    pub id: AuraId,
    pub source: ActorId,
    pub remaining: f32,
    pub expires_at: u64,
}

/// Absorb shields on one unit, consumed oldest first.
#[derive(Clone, Debug, Default)]
pub struct AbsorbShields {
    shields: Vec<AbsorbShield>,
}

impl AbsorbShields {
    /// Grant a shield. Re-granting the same id replaces it in place.
    pub fn grant(&mut self, shield: AbsorbShield) {
        match self.shields.iter_mut().find(|s| s.id == shield.id) {
            Some(existing) => *existing = shield,
            None => self.shields.push(shield),
        }
    }

    /// Soak up to `amount` damage, returning how much was absorbed.
    pub fn absorb(&mut self, amount: f32) -> f32 {
        let mut left = amount.max(0.0);
        for shield in self.shields.iter_mut() {
            if left <= 0.0 {
                break;
            }
            let taken = shield.remaining.min(left);
            shield.remaining -= taken;
            left -= taken;
        }
        self.shields.retain(|s| s.remaining > 0.0);
        amount.max(0.0) - left
    }

    pub fn expire(&mut self, now: u64) -> Vec<AbsorbShield> {
        let (expired, kept): (Vec<_>, Vec<_>) =
            self.shields.drain(..).partition(|s| now >= s.expires_at);
        self.shields = kept;
        expired
    }

    pub fn total(&self) -> f32 {
        self.shields.iter().map(|s| s.remaining).sum()
    }

    pub fn has(&self, id: AuraId) -> bool {
        self.shields.iter().any(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbsorbShield> {
        self.shields.iter()
    }

    pub fn clear(&mut self) {
        self.shields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::stats::{BaseStats, StatKind};

    fn dot_spec() -> AuraSpec {
        AuraSpec {
            tick_interval_secs: 1.0,
            tick_damage: 10.0,
            max_stacks: 3,
            ..AuraSpec::new(AuraId::Corruption, AuraCategory::Debuff, 6.0)
        }
    }

    fn aura(spec: AuraSpec, now: u64) -> Aura {
        Aura::new(spec, ActorId(0), ActorId(1), SpellSchool::Shadow, None, now)
    }

    #[test]
    fn test_reapply_refreshes_and_caps_stacks() {
        let mut stats = StatBlock::new(&BaseStats::default());
        let mut auras = AuraManager::default();

        assert_eq!(auras.apply(aura(dot_spec(), 0), &mut stats), AuraApplication::Applied);
        for expected in [2, 3, 3] {
            let outcome = auras.apply(aura(dot_spec(), 50), &mut stats);
            assert_eq!(outcome, AuraApplication::Refreshed { stacks: expected });
        }
        assert_eq!(auras.len(), 1);
        assert_eq!(auras.get(AuraId::Corruption).map(|a| a.expires_at), Some(50 + 120));
    }

    #[test]
    fn test_expired_aura_is_removed_without_ticking() {
        let mut stats = StatBlock::new(&BaseStats::default());
        let mut auras = AuraManager::default();
        auras.apply(aura(dot_spec(), 0), &mut stats);

        let mut ticks = 0;
        for now in 1..=120 {
            let report = auras.tick(now, &mut stats);
            ticks += report.ticked.len();
            if now == 120 {
                assert_eq!(report.expired.len(), 1);
                assert!(report.ticked.is_empty());
            }
        }
        // Ticks at 20, 40, 60, 80, 100; the aura is gone at 120
        assert_eq!(ticks, 5);
        assert!(auras.is_empty());
    }

    #[test]
    fn test_stat_modifiers_reverse_on_removal() {
        let mut stats = StatBlock::new(&BaseStats::default());
        let mut auras = AuraManager::default();
        let spec = AuraSpec {
            stat_mods: vec![StatModifier {
                stat: StatKind::MoveSpeed,
                multiplier: 0.5,
            }],
            ..AuraSpec::new(AuraId::Hamstring, AuraCategory::Debuff, 5.0)
        };
        auras.apply(aura(spec.clone(), 0), &mut stats);
        auras.apply(aura(spec, 10), &mut stats);
        assert_eq!(stats.get(StatKind::MoveSpeed), 0.5);

        auras.remove(AuraId::Hamstring, &mut stats);
        assert_eq!(stats.get(StatKind::MoveSpeed), 1.0);
    }

    #[test]
    fn test_dispel_takes_most_recent_dispellable() {
        let mut stats = StatBlock::new(&BaseStats::default());
        let mut auras = AuraManager::default();
        auras.apply(aura(dot_spec(), 0), &mut stats);
        auras.apply(
            aura(AuraSpec::new(AuraId::Hamstring, AuraCategory::Debuff, 5.0), 0),
            &mut stats,
        );
        let locked = AuraSpec {
            dispellable: false,
            ..AuraSpec::new(AuraId::MortalWound, AuraCategory::Debuff, 5.0)
        };
        auras.apply(aura(locked, 0), &mut stats);

        let removed = auras.dispel_one(AuraCategory::Debuff, &mut stats);
        assert_eq!(removed.map(|a| a.id()), Some(AuraId::Hamstring));
        assert!(auras.dispel_one(AuraCategory::Buff, &mut stats).is_none());
    }

    #[test]
    fn test_additive_bonuses_sum() {
        let mut stats = StatBlock::new(&BaseStats::default());
        let mut auras = AuraManager::default();
        let exposed = AuraSpec {
            damage_taken_bonus: 0.1,
            ..AuraSpec::new(AuraId::Exposed, AuraCategory::Debuff, 5.0)
        };
        let wound = AuraSpec {
            damage_taken_bonus: 0.05,
            healing_taken_bonus: -0.5,
            ..AuraSpec::new(AuraId::MortalWound, AuraCategory::Debuff, 5.0)
        };
        auras.apply(aura(exposed, 0), &mut stats);
        auras.apply(aura(wound, 0), &mut stats);
        assert!((auras.damage_taken_bonus() - 0.15).abs() < 1e-6);
        assert_eq!(auras.healing_taken_bonus(), -0.5);
    }

    #[test]
    fn test_ramping_damage_caps() {
        let ramp = TickBehavior::Ramping {
            start: 5.0,
            step: 5.0,
            max: 20.0,
        };
        assert_eq!(ramp.damage_for_tick(1, 1), 5.0);
        assert_eq!(ramp.damage_for_tick(3, 1), 15.0);
        assert_eq!(ramp.damage_for_tick(10, 1), 20.0);
        assert_eq!(ramp.damage_for_tick(10, 2), 40.0);
    }

    #[test]
    fn test_remaining_ticks() {
        let a = aura(dot_spec(), 0);
        assert_eq!(a.remaining_ticks(0), 5);
    }

    #[test]
    fn test_absorbs_consume_in_insertion_order() {
        let mut shields = AbsorbShields::default();
        shields.grant(AbsorbShield {
            id: AuraId::IceBarrier,
            source: ActorId(0),
            remaining: 30.0,
            expires_at: 100,
        });
        shields.grant(AbsorbShield {
            id: AuraId::Evasion,
            source: ActorId(0),
            remaining: 50.0,
            expires_at: 100,
        });

        assert_eq!(shields.absorb(40.0), 40.0);
        assert!(!shields.has(AuraId::IceBarrier));
        assert_eq!(shields.total(), 40.0);

        assert_eq!(shields.absorb(100.0), 40.0);
        assert_eq!(shields.total(), 0.0);
    }

    #[test]
    fn test_absorb_expiry() {
        let mut shields = AbsorbShields::default();
        shields.grant(AbsorbShield {
            id: AuraId::IceBarrier,
            source: ActorId(0),
            remaining: 30.0,
            expires_at: 10,
        });
        assert!(shields.expire(9).is_empty());
        assert_eq!(shields.expire(10).len(), 1);
        assert_eq!(shields.total(), 0.0);
    }
}
