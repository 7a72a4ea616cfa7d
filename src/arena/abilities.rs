//! Ability System - Types and Enums
//!
//! Ability descriptors are read-only content looked up by [`AbilityId`]. They
//! carry costs, timing, range and flags, plus either a generic default effect
//! set or an explicit [`Effect`] tree. The engine resolves effects through one
//! generic dispatcher; the handful of abilities needing bespoke logic use the
//! typed [`CustomBehavior`] strategies instead of arbitrary callbacks.

use serde::{Deserialize, Serialize};

use super::auras::AuraSpec;
use super::constants::{secs_to_ticks, MELEE_RANGE};
use super::crowd_control::CcSpec;
use super::hazards::HazardSpec;
use super::resources::ResourceType;

/// Spell schools - determines which spells share lockouts when interrupted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum SpellSchool {
    /// Weapon strikes. Never locked out, mitigated by armor, causes pushback.
    #[default]
    Physical,
    Frost,
    Fire,
    Arcane,
    Shadow,
    Holy,
    Nature,
}

impl SpellSchool {
    pub const ALL: [SpellSchool; 7] = [
        SpellSchool::Physical,
        SpellSchool::Frost,
        SpellSchool::Fire,
        SpellSchool::Arcane,
        SpellSchool::Shadow,
        SpellSchool::Holy,
        SpellSchool::Nature,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, SpellSchool::Physical)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpellSchool::Physical => "Physical",
            SpellSchool::Frost => "Frost",
            SpellSchool::Fire => "Fire",
            SpellSchool::Arcane => "Arcane",
            SpellSchool::Shadow => "Shadow",
            SpellSchool::Holy => "Holy",
            SpellSchool::Nature => "Nature",
        }
    }
}

/// Enum representing available abilities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityId {
    // Warrior
    MortalStrike,
    Hamstring,
    Charge,
    Pummel,
    ShieldWall,
    Whirlwind,
    // Mage
    Frostbolt,
    Polymorph,
    FrostNova,
    IceBarrier,
    Counterspell,
    ArcaneMissiles,
    ArcanePower,
    FirePatch,
    // Rogue
    Stealth,
    Ambush,
    CheapShot,
    SinisterStrike,
    KidneyShot,
    Kick,
    Rupture,
    Evasion,
    // Warlock
    Corruption,
    Agony,
    Fear,
    ShadowBolt,
    DrainLife,
    DetonateShadows,
    SpellLock,
    Cleanse,
}

impl AbilityId {
    /// Display name used by logs and notifications.
    pub fn name(&self) -> &'static str {
        match self {
            AbilityId::MortalStrike => "Mortal Strike",
            AbilityId::Hamstring => "Hamstring",
            AbilityId::Charge => "Charge",
            AbilityId::Pummel => "Pummel",
            AbilityId::ShieldWall => "Shield Wall",
            AbilityId::Whirlwind => "Whirlwind",
            AbilityId::Frostbolt => "Frostbolt",
            AbilityId::Polymorph => "Polymorph",
            AbilityId::FrostNova => "Frost Nova",
            AbilityId::IceBarrier => "Ice Barrier",
            AbilityId::Counterspell => "Counterspell",
            AbilityId::ArcaneMissiles => "Arcane Missiles",
            AbilityId::ArcanePower => "Arcane Power",
            AbilityId::FirePatch => "Fire Patch",
            AbilityId::Stealth => "Stealth",
            AbilityId::Ambush => "Ambush",
            AbilityId::CheapShot => "Cheap Shot",
            AbilityId::SinisterStrike => "Sinister Strike",
            AbilityId::KidneyShot => "Kidney Shot",
            AbilityId::Kick => "Kick",
            AbilityId::Rupture => "Rupture",
            AbilityId::Evasion => "Evasion",
            AbilityId::Corruption => "Corruption",
            AbilityId::Agony => "Agony",
            AbilityId::Fear => "Fear",
            AbilityId::ShadowBolt => "Shadow Bolt",
            AbilityId::DrainLife => "Drain Life",
            AbilityId::DetonateShadows => "Detonate Shadows",
            AbilityId::SpellLock => "Spell Lock",
            AbilityId::Cleanse => "Cleanse",
        }
    }
}

/// Who an ability may be aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Targeting {
    #[default]
    Enemy,
    SelfOnly,
}

/// Which side of an effect context a sub-effect lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffectTarget {
    #[default]
    Target,
    Caster,
}

fn caster_target() -> EffectTarget {
    EffectTarget::Caster
}

fn one() -> u8 {
    1
}

fn default_range() -> f32 {
    MELEE_RANGE
}

/// Direct damage roll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageSpec {
    pub min: f32,
    pub max: f32,
    /// Overrides the ability's school (e.g. hazards)
    #[serde(default)]
    pub school: Option<SpellSchool>,
    #[serde(default)]
    pub guaranteed_crit: bool,
}

impl DamageSpec {
    pub fn average(&self) -> f32 {
        (self.min + self.max) * 0.5
    }
}

/// Direct heal roll. Lands on the caster unless told otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealSpec {
    pub min: f32,
    pub max: f32,
    #[serde(default = "caster_target")]
    pub target: EffectTarget,
    #[serde(default)]
    pub guaranteed_crit: bool,
}

/// Damage-absorbing shield granted to the caster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbsorbSpec {
    pub id: super::auras::AuraId,
    pub amount: f32,
    pub duration_secs: f32,
}

/// Resource generated for the caster.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceGrant {
    pub kind: ResourceType,
    pub amount: f32,
}

/// Resource spent to use an ability.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub kind: ResourceType,
    pub amount: f32,
}

/// Channel timing and per-tick effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub duration_secs: f32,
    pub tick: Effect,
}

/// Special behavior flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityFlags {
    #[serde(default)]
    pub ignores_gcd: bool,
    #[serde(default)]
    pub castable_while_moving: bool,
    /// Exempt from pushback and from interrupts
    #[serde(default)]
    pub uninterruptible: bool,
    #[serde(default)]
    pub requires_stealth: bool,
    #[serde(default)]
    pub ignores_line_of_sight: bool,
}

/// Strongly typed strategies for abilities that need bespoke logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CustomBehavior {
    /// Consume the named aura on the target for `multiplier` times the damage it
    /// would still have dealt; without the aura, deal `fallback` instead.
    Detonate {
        aura: super::auras::AuraId,
        multiplier: f32,
        fallback: DamageSpec,
    },
    /// Spend every combo point for `damage_per_point` each, and stun for
    /// `stun_secs_per_point` each when non-zero.
    ComboFinisher {
        damage_per_point: f32,
        #[serde(default)]
        stun_secs_per_point: f32,
    },
}

/// Closed set of effects resolved by the engine's generic dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    DirectDamage(DamageSpec),
    Heal(HealSpec),
    /// Damage-over-time aura (the aura's periodic fields must be set)
    PeriodicDamage(AuraSpec),
    CrowdControl(CcSpec),
    /// Buff or debuff modifying stats
    StatAura(AuraSpec),
    Absorb(AbsorbSpec),
    ResourceGrant(ResourceGrant),
    /// Cancel the target's cast/channel and lock its school
    Interrupt { lockout_secs: f32 },
    Stealth,
    /// Remove one dispellable aura: a debuff when aimed at the caster, a buff otherwise
    Dispel,
    PlaceHazard(HazardSpec),
    Composite(Vec<Effect>),
    Custom(CustomBehavior),
}

impl Effect {
    /// Depth-first walk over this effect and every nested effect.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Effect)) {
        f(self);
        if let Effect::Composite(children) = self {
            for child in children {
                child.visit(f);
            }
        }
    }
}

/// Complete ability descriptor loaded from RON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    #[serde(default)]
    pub school: SpellSchool,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub costs: Vec<ResourceCost>,
    #[serde(default)]
    pub cooldown_secs: f32,
    #[serde(default = "one")]
    pub charges: u8,
    /// Cast time in seconds (0.0 = instant)
    #[serde(default)]
    pub cast_time_secs: f32,
    #[serde(default)]
    pub channel: Option<ChannelSpec>,
    #[serde(default = "default_range")]
    pub range: f32,
    #[serde(default)]
    pub min_range: f32,
    #[serde(default)]
    pub flags: AbilityFlags,

    // === Generic default effect set (used when `effect` is None) ===
    #[serde(default)]
    pub damage: Option<DamageSpec>,
    #[serde(default)]
    pub self_heal: Option<HealSpec>,
    #[serde(default)]
    pub cc: Option<CcSpec>,
    #[serde(default)]
    pub aura: Option<AuraSpec>,
    #[serde(default)]
    pub absorb: Option<AbsorbSpec>,
    #[serde(default)]
    pub resource_grant: Option<ResourceGrant>,

    /// Explicit effect tree; takes precedence over the default set
    #[serde(default)]
    pub effect: Option<Effect>,
}

impl AbilityDef {
    pub fn cast_ticks(&self) -> u64 {
        secs_to_ticks(self.cast_time_secs)
    }

    pub fn cooldown_ticks(&self) -> u64 {
        secs_to_ticks(self.cooldown_secs)
    }

    pub fn is_instant(&self) -> bool {
        self.channel.is_none() && self.cast_ticks() == 0
    }

    /// Effects resolved when the ability lands, in resolution order.
    ///
    /// The default set is always ordered: direct damage, self-heal, crowd
    /// control, aura, absorb, resource generation.
    pub fn effects(&self) -> Vec<Effect> {
        if let Some(effect) = &self.effect {
            return vec![effect.clone()];
        }
        let mut effects = Vec::new();
        if let Some(damage) = &self.damage {
            effects.push(Effect::DirectDamage(damage.clone()));
        }
        if let Some(heal) = &self.self_heal {
            effects.push(Effect::Heal(heal.clone()));
        }
        if let Some(cc) = &self.cc {
            effects.push(Effect::CrowdControl(cc.clone()));
        }
        if let Some(aura) = &self.aura {
            if aura.is_periodic() {
                effects.push(Effect::PeriodicDamage(aura.clone()));
            } else {
                effects.push(Effect::StatAura(aura.clone()));
            }
        }
        if let Some(absorb) = &self.absorb {
            effects.push(Effect::Absorb(absorb.clone()));
        }
        if let Some(grant) = self.resource_grant {
            effects.push(Effect::ResourceGrant(grant));
        }
        effects
    }

    /// Visit every effect this ability can produce, channel ticks included.
    pub fn visit_effects(&self, mut f: impl FnMut(&Effect)) {
        for effect in self.effects() {
            effect.visit(&mut f);
        }
        if let Some(channel) = &self.channel {
            channel.tick.visit(&mut f);
        }
    }

    pub fn cost_of(&self, kind: ResourceType) -> f32 {
        self.costs
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.amount)
            .sum()
    }
}
