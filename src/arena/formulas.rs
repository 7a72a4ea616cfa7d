//! Damage and healing math.
//!
//! Pure functions: they take stat values and a random stream and return the
//! numbers the match applies. Nothing here mutates a unit except
//! [`apply_damage_with_absorb`].

use super::abilities::SpellSchool;
use super::auras::AbsorbShields;
use super::constants::{
    CRIT_DAMAGE_MULTIPLIER, CRIT_HEALING_MULTIPLIER, MAX_MITIGATION, MITIGATION_CONSTANT,
    PERIODIC_CRIT_MULTIPLIER,
};
use super::rng::GameRng;
use super::stats::{StatBlock, StatKind};

/// Direct hits may crit from crit chance; periodic ticks only crit when the
/// effect is flagged guaranteed-crit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Direct,
    Periodic,
}

/// Mitigation fraction for an armor or resistance value.
pub fn mitigation(stat: f32) -> f32 {
    if stat <= 0.0 {
        return 0.0;
    }
    (stat / (stat + MITIGATION_CONSTANT)).min(MAX_MITIGATION)
}

/// Roll a value in [min, max]. A fixed value consumes no randomness.
pub fn roll_range(min: f32, max: f32, rng: &mut GameRng) -> f32 {
    if max > min {
        rng.random_range(min, max)
    } else {
        min
    }
}

/// Roll whether an attack is a critical strike.
pub fn roll_crit(crit_chance: f32, rng: &mut GameRng) -> bool {
    crit_chance > 0.0 && rng.random_f32() < crit_chance
}

/// Outgoing side of a damage or healing calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attacker {
    pub power: f32,
    pub crit_chance: f32,
}

impl Attacker {
    /// No source (environment): no multipliers, no crits.
    pub const NEUTRAL: Attacker = Attacker {
        power: 1.0,
        crit_chance: 0.0,
    };

    pub fn damage(stats: &StatBlock) -> Self {
        Self {
            power: stats.get(StatKind::DamageDone),
            crit_chance: stats.get(StatKind::CritChance),
        }
    }

    pub fn healing(stats: &StatBlock) -> Self {
        Self {
            power: stats.get(StatKind::HealingDone),
            crit_chance: stats.get(StatKind::CritChance),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roll {
    pub amount: f32,
    pub is_crit: bool,
}

fn resolve_crit(kind: HitKind, guaranteed: bool, chance: f32, direct_mult: f32, rng: &mut GameRng) -> Option<f32> {
    match kind {
        HitKind::Direct => (guaranteed || roll_crit(chance, rng)).then_some(direct_mult),
        HitKind::Periodic => guaranteed.then_some(PERIODIC_CRIT_MULTIPLIER),
    }
}

/// Final damage for one hit.
///
/// `base × power × (1 + Σ additive bonuses) × (1 − mitigation) × damage taken`,
/// then crit. Armor mitigates physical damage; magic resistance every other school.
#[allow(clippy::too_many_arguments)]
pub fn compute_damage(
    base: f32,
    attacker: Attacker,
    target: &StatBlock,
    additive_bonus: f32,
    school: SpellSchool,
    kind: HitKind,
    guaranteed_crit: bool,
    rng: &mut GameRng,
) -> Roll {
    let resist = if school.is_physical() {
        target.get(StatKind::Armor)
    } else {
        target.get(StatKind::MagicResist)
    };
    let mut amount = base.max(0.0) * attacker.power;
    amount *= (1.0 + additive_bonus).max(0.0);
    amount *= 1.0 - mitigation(resist);
    amount *= target.get(StatKind::DamageTaken);

    let crit = resolve_crit(kind, guaranteed_crit, attacker.crit_chance, CRIT_DAMAGE_MULTIPLIER, rng);
    if let Some(mult) = crit {
        amount *= mult;
    }
    Roll {
        amount: amount.max(0.0),
        is_crit: crit.is_some(),
    }
}

/// Final healing for one heal. Same pipeline as damage without mitigation.
pub fn compute_healing(
    base: f32,
    healer: Attacker,
    target: &StatBlock,
    additive_bonus: f32,
    kind: HitKind,
    guaranteed_crit: bool,
    rng: &mut GameRng,
) -> Roll {
    let mut amount = base.max(0.0) * healer.power;
    amount *= (1.0 + additive_bonus).max(0.0);
    amount *= target.get(StatKind::HealingTaken);

    let crit = resolve_crit(kind, guaranteed_crit, healer.crit_chance, CRIT_HEALING_MULTIPLIER, rng);
    if let Some(mult) = crit {
        amount *= mult;
    }
    Roll {
        amount: amount.max(0.0),
        is_crit: crit.is_some(),
    }
}

/// Apply damage to a unit's health, accounting for absorb shields.
/// Returns (actual_damage_to_health, damage_absorbed).
pub fn apply_damage_with_absorb(damage: f32, health: &mut f32, shields: &mut AbsorbShields) -> (f32, f32) {
    debug_assert!(damage >= 0.0, "apply_damage_with_absorb: negative damage {}", damage);

    let absorbed = shields.absorb(damage);
    let remaining = (damage - absorbed).max(0.0);
    let to_health = remaining.min(*health);
    *health = (*health - remaining).max(0.0);
    (to_health, absorbed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::auras::{AbsorbShield, AuraId};
    use crate::arena::stats::{BaseStats, StatModifier};
    use crate::arena::unit::ActorId;

    fn target(armor: f32, magic_resist: f32) -> StatBlock {
        StatBlock::new(&BaseStats {
            armor,
            magic_resist,
            crit_chance: 0.0,
            haste: 1.0,
        })
    }

    #[test]
    fn test_mitigation_curve_and_cap() {
        assert_eq!(mitigation(0.0), 0.0);
        assert!((mitigation(400.0) - 0.5).abs() < 1e-6);
        assert_eq!(mitigation(100_000.0), MAX_MITIGATION);
    }

    #[test]
    fn test_armor_only_applies_to_physical() {
        let mut rng = GameRng::from_seed(1);
        let t = target(400.0, 0.0);
        let physical = compute_damage(100.0, Attacker::NEUTRAL, &t, 0.0, SpellSchool::Physical, HitKind::Direct, false, &mut rng);
        let frost = compute_damage(100.0, Attacker::NEUTRAL, &t, 0.0, SpellSchool::Frost, HitKind::Direct, false, &mut rng);
        assert!((physical.amount - 50.0).abs() < 1e-4);
        assert!((frost.amount - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_additive_bonus_and_multiplier_stack() {
        let mut rng = GameRng::from_seed(1);
        let mut t = target(0.0, 0.0);
        t.add_modifier(
            AuraId::ShieldWall,
            StatModifier {
                stat: StatKind::DamageTaken,
                multiplier: 0.5,
            },
        );
        let attacker = Attacker {
            power: 1.2,
            crit_chance: 0.0,
        };
        let roll = compute_damage(100.0, attacker, &t, 0.25, SpellSchool::Shadow, HitKind::Direct, false, &mut rng);
        // 100 * 1.2 * 1.25 * 0.5
        assert!((roll.amount - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_guaranteed_crit_multipliers() {
        let mut rng = GameRng::from_seed(1);
        let t = target(0.0, 0.0);
        let direct = compute_damage(100.0, Attacker::NEUTRAL, &t, 0.0, SpellSchool::Fire, HitKind::Direct, true, &mut rng);
        let periodic = compute_damage(100.0, Attacker::NEUTRAL, &t, 0.0, SpellSchool::Fire, HitKind::Periodic, true, &mut rng);
        let heal = compute_healing(100.0, Attacker::NEUTRAL, &t, 0.0, HitKind::Direct, true, &mut rng);
        assert_eq!(direct.amount, 200.0);
        assert_eq!(periodic.amount, 150.0);
        assert_eq!(heal.amount, 150.0);
        assert!(direct.is_crit && periodic.is_crit && heal.is_crit);
    }

    #[test]
    fn test_periodic_never_rolls_crit() {
        let mut rng = GameRng::from_seed(9);
        let t = target(0.0, 0.0);
        let attacker = Attacker {
            power: 1.0,
            crit_chance: 1.0,
        };
        for _ in 0..50 {
            let roll = compute_damage(10.0, attacker, &t, 0.0, SpellSchool::Shadow, HitKind::Periodic, false, &mut rng);
            assert!(!roll.is_crit);
            assert_eq!(roll.amount, 10.0);
        }
    }

    #[test]
    fn test_guaranteed_crit_skips_random_draw() {
        let mut a = GameRng::from_seed(5);
        let mut b = GameRng::from_seed(5);
        let t = target(0.0, 0.0);
        let attacker = Attacker {
            power: 1.0,
            crit_chance: 0.5,
        };
        compute_damage(10.0, attacker, &t, 0.0, SpellSchool::Fire, HitKind::Direct, true, &mut a);
        assert_eq!(a.random_f32(), b.random_f32());
    }

    #[test]
    fn test_absorb_before_health() {
        let mut shields = AbsorbShields::default();
        shields.grant(AbsorbShield {
            id: AuraId::IceBarrier,
            source: ActorId(0),
            remaining: 30.0,
            expires_at: 100,
        });
        let mut health = 100.0;
        let (to_health, absorbed) = apply_damage_with_absorb(50.0, &mut health, &mut shields);
        assert_eq!(absorbed, 30.0);
        assert_eq!(to_health, 20.0);
        assert_eq!(health, 80.0);
    }

    #[test]
    fn test_overkill_reports_health_lost() {
        let mut shields = AbsorbShields::default();
        let mut health = 10.0;
        let (to_health, _) = apply_damage_with_absorb(50.0, &mut health, &mut shields);
        assert_eq!(to_health, 10.0);
        assert_eq!(health, 0.0);
    }
}
