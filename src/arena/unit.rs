//! Combat unit: everything one combatant owns.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::abilities::{AbilityId, ResourceGrant, SpellSchool};
use super::ability_config::{AutoAttackDef, ClassDef, DamageTakenResource};
use super::auras::{AbsorbShields, AuraManager};
use super::casting::CastSlot;
use super::cooldowns::CooldownTracker;
use super::crowd_control::CrowdControlState;
use super::geometry::{horizontal_direction, horizontal_distance};
use super::lockouts::SchoolLockouts;
use super::match_config::CharacterClass;
use super::movement::DodgeState;
use super::resources::ResourcePools;
use super::stats::{StatBlock, StatKind};

/// Stable identity of a combatant within a match (slot 0 or 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u8);

impl ActorId {
    pub const FIRST: ActorId = ActorId(0);
    pub const SECOND: ActorId = ActorId(1);

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// The other combatant of a duel.
    pub fn opponent(&self) -> ActorId {
        ActorId(1 - self.0.min(1))
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-unit tallies surfaced in the match summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub damage_absorbed: f32,
    pub cc_applied: u32,
    pub abilities_used: u32,
    pub interrupts: u32,
}

/// One combatant.
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: ActorId,
    pub class: CharacterClass,
    pub name: String,

    pub health: f32,
    pub max_health: f32,
    pub dead: bool,

    pub position: Vec3,
    pub facing: Vec3,
    pub move_target: Option<Vec3>,
    /// Units per second before modifiers
    pub base_move_speed: f32,

    pub stats: StatBlock,
    pub auras: AuraManager,
    pub absorbs: AbsorbShields,
    pub cc: CrowdControlState,
    pub cast: CastSlot,
    pub resources: ResourcePools,
    pub cooldowns: CooldownTracker,
    pub lockouts: SchoolLockouts,
    pub gcd_until: u64,

    pub abilities: Vec<AbilityId>,
    pub auto_attack: AutoAttackDef,
    pub next_swing_at: u64,
    pub swing_resource: Option<ResourceGrant>,
    pub damage_taken_resource: Option<DamageTakenResource>,
    pub preferred_range: f32,

    pub stealthed: bool,
    pub dodge: Option<DodgeState>,
    pub dodge_ready_at: u64,
    pub pending_dodge: Option<Vec3>,
    pub wander_direction: Vec3,
    pub wander_redirect_at: u64,

    pub tally: UnitStats,
}

impl Unit {
    pub fn from_class(id: ActorId, class: CharacterClass, def: &ClassDef, position: Vec3, facing: Vec3) -> Self {
        Self {
            id,
            class,
            name: format!("Team {} {}", id.0 + 1, class.name()),
            health: def.max_health,
            max_health: def.max_health,
            dead: false,
            position,
            facing: Vec3::new(facing.x, 0.0, facing.z).normalize_or_zero(),
            move_target: None,
            base_move_speed: def.move_speed,
            stats: StatBlock::new(&def.stats),
            auras: AuraManager::default(),
            absorbs: AbsorbShields::default(),
            cc: CrowdControlState::default(),
            cast: CastSlot::Idle,
            resources: ResourcePools::from_defs(&def.resources),
            cooldowns: CooldownTracker::new(),
            lockouts: SchoolLockouts::default(),
            gcd_until: 0,
            abilities: def.abilities.clone(),
            auto_attack: def.auto_attack.clone(),
            next_swing_at: 0,
            swing_resource: def.swing_resource,
            damage_taken_resource: def.damage_taken_resource,
            preferred_range: def.preferred_range,
            stealthed: def.starts_stealthed,
            dodge: None,
            dodge_ready_at: 0,
            pending_dodge: None,
            wander_direction: Vec3::ZERO,
            wander_redirect_at: 0,
            tally: UnitStats::default(),
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn health_pct(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn equips(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    // Derived capability flags

    pub fn can_act(&self) -> bool {
        self.is_alive() && !self.cc.prevents_action()
    }

    pub fn can_move(&self) -> bool {
        self.is_alive() && !self.cc.prevents_movement()
    }

    /// Silence blocks every school except physical.
    pub fn can_cast(&self, school: SpellSchool) -> bool {
        self.can_act() && (school.is_physical() || !self.cc.is_silenced())
    }

    pub fn can_auto_attack(&self) -> bool {
        self.can_act() && !self.cc.is_disarmed() && self.cast.is_idle() && !self.stealthed
    }

    pub fn is_damage_immune(&self) -> bool {
        self.auras.has_damage_immunity()
    }

    pub fn is_cc_immune(&self) -> bool {
        self.auras.has_damage_immunity() || self.auras.has_cc_immunity()
    }

    pub fn on_gcd(&self, now: u64) -> bool {
        now < self.gcd_until
    }

    /// Movement per tick after modifiers.
    pub fn speed_per_tick(&self) -> f32 {
        self.base_move_speed * self.stats.get(StatKind::MoveSpeed) / super::constants::TICK_RATE as f32
    }

    pub fn distance_to(&self, other: &Unit) -> f32 {
        horizontal_distance(self.position, other.position)
    }

    pub fn face(&mut self, point: Vec3) {
        let dir = horizontal_direction(self.position, point);
        if dir != Vec3::ZERO {
            self.facing = dir;
        }
    }

    /// Check invariants. Panics on violation in debug builds; no-op in release.
    #[inline]
    pub fn debug_validate(&self) {
        debug_assert!(self.health >= 0.0, "Unit health cannot be negative: {}", self.health);
        debug_assert!(
            self.health <= self.max_health,
            "Unit health ({}) cannot exceed max_health ({})",
            self.health,
            self.max_health
        );
        debug_assert!(self.max_health > 0.0, "Unit max_health must be positive: {}", self.max_health);
        debug_assert!(
            !self.dead || self.cast.is_idle(),
            "Dead unit {} is still casting",
            self.id
        );
        for pool in self.resources.iter() {
            debug_assert!(
                pool.current >= 0.0 && pool.current <= pool.capacity,
                "{:?} out of range: {}/{}",
                pool.kind,
                pool.current,
                pool.capacity
            );
        }
    }
}
