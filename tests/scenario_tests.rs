//! Match-level scenarios
//!
//! These tests drive whole matches through the public API and verify:
//! - Diminishing returns on repeated crowd control
//! - Absorb shields soak damage before health
//! - Aura refresh without duplicates
//! - Hard crowd control cancels casts
//! - Resource regeneration caps and exact modifier reversal
//! - Scripted defensive priority at low health
//! - Haste-scaled cast timing
//! - Seeded determinism and timeout resolution
//! - Fear wandering and what pins a feared unit
//! - Aura hooks on application, expiry, dispel, consumption and death
//! - Channels, pushback, breakable crowd control and stealth
//! - Finisher, detonation and drain math
//! - Scheduled environmental hazards

use std::sync::{Arc, Mutex};

use bevy::math::Vec3;

use arena_duel::arena::abilities::{AbilityId, AbsorbSpec, Effect, EffectTarget, SpellSchool};
use arena_duel::arena::ability_config::ArenaContent;
use arena_duel::arena::auras::{Aura, AuraCategory, AuraId, AuraManager, AuraSpec, TickBehavior};
use arena_duel::arena::class_ai::scripted::ScriptedController;
use arena_duel::arena::combat_core::{Hit, Match};
use arena_duel::arena::crowd_control::{CcOutcome, CcType, ImmuneReason};
use arena_duel::arena::formulas::{mitigation, HitKind};
use arena_duel::arena::hazards::{HazardKind, HazardSpec, ScheduledHazard};
use arena_duel::arena::match_config::{CharacterClass, ControllerKind, Difficulty, MatchConfig};
use arena_duel::arena::resources::ResourceType;
use arena_duel::arena::stats::{StatKind, StatModifier};
use arena_duel::arena::unit::ActorId;
use arena_duel::combat::events::{AuraRemoval, CancelCause, CombatEvent, EffectSource, MatchEndReason};

const FIRST: ActorId = ActorId(0);
const SECOND: ActorId = ActorId(1);

fn content() -> Arc<ArenaContent> {
    Arc::new(ArenaContent::bundled().expect("bundled content loads"))
}

fn idle_config(first: CharacterClass, second: CharacterClass) -> MatchConfig {
    let mut config = MatchConfig::duel(first, second).with_seed(1234);
    for setup in config.combatants.iter_mut() {
        setup.controller = ControllerKind::Idle;
    }
    config
}

fn idle_duel(first: CharacterClass, second: CharacterClass) -> Match {
    Match::new(&idle_config(first, second), content()).unwrap()
}

fn place(world: &mut Match, actor: ActorId, x: f32) {
    world.unit_mut(actor).unwrap().position = Vec3::new(x, 0.0, 0.0);
}

type Recorded = Arc<Mutex<Vec<(u64, CombatEvent)>>>;

fn record(world: &mut Match) -> Recorded {
    let seen: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    world.subscribe(move |tick: u64, event: &CombatEvent| sink.lock().unwrap().push((tick, event.clone())));
    seen
}

fn last_damage(seen: &Recorded) -> (f32, f32) {
    seen.lock()
        .unwrap()
        .iter()
        .rev()
        .find_map(|(_, e)| match e {
            CombatEvent::DamageDealt { amount, absorbed, .. } => Some((*amount, *absorbed)),
            _ => None,
        })
        .expect("a damage event")
}

fn physical_hit(base: f32) -> Hit {
    Hit {
        source: Some(SECOND),
        target: FIRST,
        via: EffectSource::AutoAttack,
        school: SpellSchool::Physical,
        base,
        // Periodic hits never crit, so amounts stay exact
        kind: HitKind::Periodic,
        guaranteed_crit: false,
    }
}

// =============================================================================
// Diminishing Returns
// =============================================================================

#[test]
fn test_repeated_stuns_diminish_then_reset() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);

    let mut outcomes = Vec::new();
    for _ in 0..4 {
        outcomes.push(world.apply_crowd_control(Some(FIRST), SECOND, CcType::Stun, 80, None));
    }
    assert_eq!(
        outcomes,
        vec![
            CcOutcome::Applied { duration_ticks: 80 },
            CcOutcome::Applied { duration_ticks: 40 },
            CcOutcome::Applied { duration_ticks: 20 },
            CcOutcome::Immune(ImmuneReason::DiminishingReturns),
        ]
    );

    // Past the 18s reset window the next stun is full length again
    for _ in 0..361 {
        world.tick();
    }
    assert_eq!(
        world.apply_crowd_control(Some(FIRST), SECOND, CcType::Stun, 80, None),
        CcOutcome::Applied { duration_ticks: 80 }
    );
}

#[test]
fn test_categories_diminish_independently() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    world.apply_crowd_control(Some(FIRST), SECOND, CcType::Stun, 40, None);
    world.apply_crowd_control(Some(FIRST), SECOND, CcType::Stun, 40, None);

    assert_eq!(
        world.apply_crowd_control(Some(FIRST), SECOND, CcType::Root, 40, None),
        CcOutcome::Applied { duration_ticks: 40 }
    );
    // Fear and disorient share a category
    world.apply_crowd_control(Some(FIRST), SECOND, CcType::Fear, 40, None);
    assert_eq!(
        world.apply_crowd_control(Some(FIRST), SECOND, CcType::Disorient, 40, None),
        CcOutcome::Applied { duration_ticks: 20 }
    );
}

// =============================================================================
// Absorbs
// =============================================================================

#[test]
fn test_absorb_is_consumed_before_health() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::IceBarrier, None);
    world.tick();
    let seen = record(&mut world);

    let mage = world.unit(FIRST).unwrap();
    let health = mage.health;
    assert_eq!(mage.absorbs.total(), 200.0);

    // Fully soaked
    world.deal_damage(physical_hit(120.0));
    let (to_health, absorbed) = last_damage(&seen);
    assert_eq!(to_health, 0.0);
    assert!(absorbed > 0.0);
    let mage = world.unit(FIRST).unwrap();
    assert_eq!(mage.health, health);
    let remaining = mage.absorbs.total();
    assert!((remaining - (200.0 - absorbed)).abs() < 1e-3);

    // Overflow reaches health, exactly
    world.deal_damage(physical_hit(300.0));
    let (to_health, absorbed) = last_damage(&seen);
    assert!((absorbed - remaining).abs() < 1e-3);
    assert!(to_health > 0.0);
    let mage = world.unit(FIRST).unwrap();
    assert_eq!(mage.absorbs.total(), 0.0);
    assert!((mage.health - (health - to_health)).abs() < 1e-3);
    assert!(seen.lock().unwrap().iter().any(|(_, e)| matches!(
        e,
        CombatEvent::AuraRemoved {
            aura: AuraId::IceBarrier,
            ..
        }
    )));
}

// =============================================================================
// Aura Refresh
// =============================================================================

#[test]
fn test_reapplying_dot_refreshes_without_duplicate() {
    let mut world = idle_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    place(&mut world, FIRST, -10.0);
    place(&mut world, SECOND, 10.0);
    let seen = record(&mut world);

    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    world.tick();
    let first_expiry = world.unit(SECOND).unwrap().auras.get(AuraId::Corruption).unwrap().expires_at;
    assert_eq!(first_expiry, 360);

    for _ in 0..40 {
        world.tick();
    }
    let now = world.current_tick();
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    world.tick();

    let warrior = world.unit(SECOND).unwrap();
    let corruption: Vec<&Aura> = warrior.auras.iter().filter(|a| a.id() == AuraId::Corruption).collect();
    assert_eq!(corruption.len(), 1);
    assert_eq!(corruption[0].expires_at, now + 360);
    assert_eq!(corruption[0].stacks, 1);
    assert!(seen.lock().unwrap().iter().any(|(_, e)| matches!(
        e,
        CombatEvent::AuraApplied {
            aura: AuraId::Corruption,
            refreshed: true,
            ..
        }
    )));
}

// =============================================================================
// Crowd Control vs Casting
// =============================================================================

#[test]
fn test_hard_crowd_control_cancels_cast_same_tick() {
    for kind in [CcType::Stun, CcType::Fear, CcType::Incapacitate] {
        let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
        world.queue_action(FIRST, AbilityId::Frostbolt, Some(SECOND));
        world.tick();
        assert!(world.unit(FIRST).unwrap().cast.is_casting());
        let seen = record(&mut world);

        let outcome = world.apply_crowd_control(Some(SECOND), FIRST, kind, 40, None);
        assert!(matches!(outcome, CcOutcome::Applied { .. }), "{:?}", kind);
        assert!(world.unit(FIRST).unwrap().cast.is_idle(), "{:?} should cancel the cast", kind);
        assert!(seen.lock().unwrap().iter().any(|(_, e)| *e
            == CombatEvent::CastCancelled {
                caster: FIRST,
                ability: AbilityId::Frostbolt,
                cause: CancelCause::CrowdControl,
            }));
    }
}

#[test]
fn test_root_does_not_cancel_cast() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::Frostbolt, Some(SECOND));
    world.tick();
    world.apply_crowd_control(Some(SECOND), FIRST, CcType::Root, 40, None);
    assert!(world.unit(FIRST).unwrap().cast.is_casting());
}

// =============================================================================
// Resources and Stats
// =============================================================================

#[test]
fn test_mana_regen_never_exceeds_capacity() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::Frostbolt, Some(SECOND));
    // Mana is paid when the 2s cast completes
    for _ in 0..41 {
        world.tick();
    }
    assert!(world.unit(FIRST).unwrap().resources.current(ResourceType::Mana) < 1000.0);

    for _ in 0..400 {
        world.tick();
        let mana = world.unit(FIRST).unwrap().resources.current(ResourceType::Mana);
        assert!(mana <= 1000.0, "mana overflowed to {}", mana);
    }
    assert_eq!(world.unit(FIRST).unwrap().resources.current(ResourceType::Mana), 1000.0);
}

#[test]
fn test_thousand_modifier_cycles_restore_stat() {
    let world = idle_duel(CharacterClass::Warrior, CharacterClass::Mage);
    let mut stats = world.unit(FIRST).unwrap().stats.clone();
    let mut auras = AuraManager::default();
    let original = stats.get(StatKind::MoveSpeed);

    let slow = AuraSpec {
        stat_mods: vec![StatModifier {
            stat: StatKind::MoveSpeed,
            multiplier: 0.7,
        }],
        ..AuraSpec::new(AuraId::Chilled, AuraCategory::Debuff, 4.0)
    };
    for now in 0..1000 {
        auras.apply(Aura::new(slow.clone(), SECOND, FIRST, SpellSchool::Frost, None, now), &mut stats);
        assert!((stats.get(StatKind::MoveSpeed) - original * 0.7).abs() < 1e-5);
        auras.remove(AuraId::Chilled, &mut stats);
    }
    assert!((stats.get(StatKind::MoveSpeed) - original).abs() < 1e-6);
    assert_eq!(stats.modifier_count(), 0);
}

// =============================================================================
// Decision Making
// =============================================================================

#[test]
fn test_low_health_mage_picks_defensive() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    let mage = world.unit_mut(FIRST).unwrap();
    mage.health = mage.max_health * 0.15;

    let ai = ScriptedController::new(FIRST, Difficulty::Hard);
    let (ability, _, score) = ai.choose_action(&world).expect("an action is chosen");
    assert_eq!(ability, AbilityId::IceBarrier);
    assert!(score >= 500.0, "defensive score {} below 500", score);
}

#[test]
fn test_scripted_mage_shields_itself_on_first_tick() {
    let mut config = idle_config(CharacterClass::Mage, CharacterClass::Warrior);
    config.combatants[0].controller = ControllerKind::Scripted {
        difficulty: Difficulty::Hard,
    };
    let (mut world, _) = Match::from_config(&config, content()).unwrap();
    let mage = world.unit_mut(FIRST).unwrap();
    mage.health = mage.max_health * 0.15;

    world.tick();
    assert!(world.unit(FIRST).unwrap().absorbs.has(AuraId::IceBarrier));
}

// =============================================================================
// Cast Timing
// =============================================================================

#[test]
fn test_haste_scales_cast_time() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    world.unit_mut(FIRST).unwrap().stats.add_modifier(
        AuraId::ArcanePower,
        StatModifier {
            stat: StatKind::Haste,
            multiplier: 1.3,
        },
    );
    let seen = record(&mut world);

    world.queue_action(FIRST, AbilityId::Frostbolt, Some(SECOND));
    for _ in 0..40 {
        world.tick();
    }

    // 2.0s = 40 ticks; 40 / 1.3 rounds to 31
    let seen = seen.lock().unwrap();
    let started = seen
        .iter()
        .find_map(|(tick, e)| matches!(e, CombatEvent::CastStarted { cast_ticks: 31, .. }).then_some(*tick))
        .expect("cast started with 31 ticks");
    let finished = seen
        .iter()
        .find_map(|(tick, e)| {
            matches!(
                e,
                CombatEvent::CastSucceeded {
                    ability: AbilityId::Frostbolt,
                    ..
                }
            )
            .then_some(*tick)
        })
        .expect("cast completed");
    assert_eq!(finished - started, 31);
}

// =============================================================================
// Determinism and Match End
// =============================================================================

#[test]
fn test_same_seed_reproduces_match() {
    let mut config = MatchConfig::duel(CharacterClass::Warrior, CharacterClass::Mage).with_seed(42);
    config.max_duration_secs = 60.0;
    let content = content();

    let run = || {
        let (mut world, _) = Match::from_config(&config, Arc::clone(&content)).unwrap();
        world.run_to_completion()
    };
    let a = run();
    let b = run();

    assert_eq!(a.winner, b.winner);
    assert_eq!(a.duration_ticks, b.duration_ticks);
    for (x, y) in a.combatants.iter().zip(b.combatants.iter()) {
        assert_eq!(x.final_health.to_bits(), y.final_health.to_bits());
        assert_eq!(x.stats, y.stats);
    }
}

#[test]
fn test_timeout_goes_to_higher_health_percentage() {
    let mut config = idle_config(CharacterClass::Warrior, CharacterClass::Mage);
    config.max_duration_secs = 1.0;
    let mut world = Match::new(&config, content()).unwrap();
    for (actor, pct) in [(FIRST, 0.40), (SECOND, 0.55)] {
        let unit = world.unit_mut(actor).unwrap();
        unit.health = unit.max_health * pct;
    }

    let summary = world.run_to_completion();
    assert_eq!(summary.reason, MatchEndReason::Timeout);
    assert_eq!(summary.winner, Some(SECOND));
    assert_eq!(summary.loser, Some(FIRST));
    assert_eq!(summary.winner_class(), Some(CharacterClass::Mage));
}

fn events(seen: &Recorded) -> Vec<(u64, CombatEvent)> {
    seen.lock().unwrap().clone()
}

/// Damage multiplier of `attacker` against `target` for a non-crit hit.
fn damage_scale(world: &Match, attacker: ActorId, target: ActorId, resist: StatKind) -> f32 {
    let attacker = &world.unit(attacker).unwrap().stats;
    let target = &world.unit(target).unwrap().stats;
    attacker.get(StatKind::DamageDone) * (1.0 - mitigation(target.get(resist))) * target.get(StatKind::DamageTaken)
}

/// Total (health + absorbed) and crit flag of the hit delivered via `source`.
fn hit_via(seen: &Recorded, source: EffectSource) -> (f32, bool) {
    events(seen)
        .into_iter()
        .find_map(|(_, e)| match e {
            CombatEvent::DamageDealt {
                via,
                amount,
                absorbed,
                is_crit,
                ..
            } if via == source => Some((amount + absorbed, is_crit)),
            _ => None,
        })
        .expect("a matching damage event")
}

// =============================================================================
// Fear
// =============================================================================

#[test]
fn test_feared_unit_wanders_inside_arena() {
    let mut world = idle_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    place(&mut world, SECOND, 10.0);
    world.apply_crowd_control(Some(FIRST), SECOND, CcType::Fear, 120, None);

    let mut travelled = 0.0;
    let mut last = world.unit(SECOND).unwrap().position;
    for _ in 0..40 {
        world.tick();
        let pos = world.unit(SECOND).unwrap().position;
        assert!(world.layout().in_bounds(pos), "wandered out of bounds to {:?}", pos);
        travelled += (pos - last).length();
        last = pos;
    }
    assert!(travelled > 4.0, "feared unit only moved {}", travelled);
}

#[test]
fn test_pinning_control_stops_fear_wander() {
    for pin in [CcType::Root, CcType::Stun, CcType::Incapacitate] {
        let mut world = idle_duel(CharacterClass::Warlock, CharacterClass::Warrior);
        place(&mut world, SECOND, 10.0);
        world.apply_crowd_control(Some(FIRST), SECOND, CcType::Fear, 120, None);
        world.apply_crowd_control(Some(FIRST), SECOND, pin, 60, None);

        for _ in 0..40 {
            world.tick();
        }
        assert_eq!(
            world.unit(SECOND).unwrap().position,
            Vec3::new(10.0, 0.0, 0.0),
            "{:?} should hold a feared unit in place",
            pin
        );
    }
}

// =============================================================================
// Aura Hooks
// =============================================================================

fn marker(amount: f32) -> Box<Effect> {
    Box::new(Effect::Absorb(AbsorbSpec {
        id: AuraId::IceBarrier,
        amount,
        duration_secs: 30.0,
    }))
}

/// Corruption grants a 1/2/3 point shield to its caster on apply/remove/dispel.
fn hooked_content() -> Arc<ArenaContent> {
    let mut content = ArenaContent::bundled().expect("bundled content loads");
    let aura = content
        .abilities
        .get_mut(&AbilityId::Corruption)
        .and_then(|def| def.aura.as_mut())
        .expect("corruption applies an aura");
    aura.on_apply = Some(marker(1.0));
    aura.on_remove = Some(marker(2.0));
    aura.on_dispel = Some(marker(3.0));
    Arc::new(content)
}

fn hooked_duel(first: CharacterClass, second: CharacterClass) -> (Match, Recorded) {
    let mut world = Match::new(&idle_config(first, second), hooked_content()).unwrap();
    place(&mut world, FIRST, -10.0);
    place(&mut world, SECOND, 10.0);
    let seen = record(&mut world);
    (world, seen)
}

fn markers(seen: &Recorded) -> Vec<f32> {
    events(seen)
        .into_iter()
        .filter_map(|(_, e)| match e {
            CombatEvent::AbsorbGranted { amount, .. } => Some(amount),
            _ => None,
        })
        .collect()
}

fn removal_of(seen: &Recorded, aura: AuraId) -> Option<AuraRemoval> {
    events(seen).into_iter().find_map(|(_, e)| match e {
        CombatEvent::AuraRemoved { aura: id, reason, .. } if id == aura => Some(reason),
        _ => None,
    })
}

#[test]
fn test_apply_hook_skips_refresh_and_remove_hook_runs_on_expiry() {
    let (mut world, seen) = hooked_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    world.tick();
    assert_eq!(markers(&seen), vec![1.0]);

    for _ in 0..40 {
        world.tick();
    }
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    world.tick();
    assert_eq!(markers(&seen), vec![1.0], "a refresh is not a fresh application");

    for _ in 0..500 {
        if !world.unit(SECOND).unwrap().auras.has(AuraId::Corruption) {
            break;
        }
        world.tick();
    }
    assert_eq!(removal_of(&seen, AuraId::Corruption), Some(AuraRemoval::Expired));
    assert_eq!(markers(&seen), vec![1.0, 2.0]);
}

#[test]
fn test_dispel_runs_only_dispel_hook() {
    let (mut world, seen) = hooked_duel(CharacterClass::Warlock, CharacterClass::Warlock);
    world.queue_action(SECOND, AbilityId::Corruption, Some(FIRST));
    world.tick();
    world.queue_action(FIRST, AbilityId::Cleanse, None);
    world.tick();

    assert!(!world.unit(FIRST).unwrap().auras.has(AuraId::Corruption));
    assert_eq!(removal_of(&seen, AuraId::Corruption), Some(AuraRemoval::Dispelled));
    assert_eq!(markers(&seen), vec![1.0, 3.0]);
}

#[test]
fn test_detonation_runs_remove_hook() {
    let (mut world, seen) = hooked_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    for _ in 0..40 {
        world.tick();
    }
    world.queue_action(FIRST, AbilityId::DetonateShadows, Some(SECOND));
    world.tick();

    assert_eq!(removal_of(&seen, AuraId::Corruption), Some(AuraRemoval::Consumed));
    assert_eq!(markers(&seen), vec![1.0, 2.0]);
}

#[test]
fn test_death_skips_remove_hook() {
    let (mut world, seen) = hooked_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    world.tick();
    world.deal_damage(Hit {
        source: Some(FIRST),
        target: SECOND,
        via: EffectSource::AutoAttack,
        school: SpellSchool::Physical,
        base: 100_000.0,
        kind: HitKind::Periodic,
        guaranteed_crit: false,
    });

    assert!(!world.unit(SECOND).unwrap().is_alive());
    assert_eq!(removal_of(&seen, AuraId::Corruption), Some(AuraRemoval::HolderDied));
    assert_eq!(markers(&seen), vec![1.0]);
}

// =============================================================================
// Channels
// =============================================================================

fn channeling_mage() -> (Match, Recorded) {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    place(&mut world, FIRST, -20.0);
    place(&mut world, SECOND, 20.0);
    let seen = record(&mut world);
    world.queue_action(FIRST, AbilityId::ArcaneMissiles, Some(SECOND));
    world.tick();
    (world, seen)
}

fn channel_ends(seen: &Recorded) -> Vec<(u64, bool)> {
    events(seen)
        .into_iter()
        .filter_map(|(tick, e)| match e {
            CombatEvent::ChannelEnded { completed, .. } => Some((tick, completed)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_channel_pays_up_front_and_ticks_on_interval() {
    let (mut world, seen) = channeling_mage();
    assert!(events(&seen).contains(&(
        0,
        CombatEvent::ChannelStarted {
            caster: FIRST,
            ability: AbilityId::ArcaneMissiles,
            target: SECOND,
            duration_ticks: 60,
        }
    )));
    // 60 spent, one tick of regeneration back
    let mana = world.unit(FIRST).unwrap().resources.current(ResourceType::Mana);
    assert!((940.0..941.0).contains(&mana), "mana after channel start: {}", mana);

    for _ in 0..60 {
        world.tick();
    }
    let ticks: Vec<(u64, u32)> = events(&seen)
        .into_iter()
        .filter_map(|(tick, e)| match e {
            CombatEvent::ChannelTicked { tick_index, .. } => Some((tick, tick_index)),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![(20, 1), (40, 2), (60, 3)]);
    let hits = events(&seen)
        .iter()
        .filter(|(_, e)| {
            matches!(
                e,
                CombatEvent::DamageDealt {
                    via: EffectSource::Ability(AbilityId::ArcaneMissiles),
                    ..
                }
            )
        })
        .count();
    assert_eq!(hits, 3);
    assert_eq!(channel_ends(&seen), vec![(60, true)]);
    assert!(world.unit(FIRST).unwrap().cast.is_idle());
}

#[test]
fn test_moving_cancels_channel() {
    let (mut world, seen) = channeling_mage();
    for _ in 0..24 {
        world.tick();
    }
    world.set_move_target(FIRST, Some(Vec3::new(-20.0, 0.0, 10.0)));
    world.tick();

    assert!(world.unit(FIRST).unwrap().cast.is_idle());
    assert!(events(&seen).contains(&(
        25,
        CombatEvent::CastCancelled {
            caster: FIRST,
            ability: AbilityId::ArcaneMissiles,
            cause: CancelCause::Moved,
        }
    )));
    assert_eq!(channel_ends(&seen), vec![(25, false)]);
}

// =============================================================================
// Pushback, Breakable Control, Stealth
// =============================================================================

#[test]
fn test_physical_damage_pushes_back_cast() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    place(&mut world, FIRST, -20.0);
    place(&mut world, SECOND, 20.0);
    let seen = record(&mut world);
    world.queue_action(FIRST, AbilityId::Frostbolt, Some(SECOND));
    world.tick();

    world.deal_damage(physical_hit(10.0));
    assert!(events(&seen).iter().any(|(_, e)| *e
        == CombatEvent::CastPushedBack {
            caster: FIRST,
            ability: AbilityId::Frostbolt,
            completes_at: 50,
        }));

    for _ in 0..50 {
        world.tick();
    }
    let succeeded: Vec<u64> = events(&seen)
        .into_iter()
        .filter_map(|(tick, e)| matches!(e, CombatEvent::CastSucceeded { .. }).then_some(tick))
        .collect();
    assert_eq!(succeeded, vec![50]);
}

#[test]
fn test_damage_breaks_fragile_control() {
    let mut world = idle_duel(CharacterClass::Mage, CharacterClass::Warrior);
    let seen = record(&mut world);
    world.apply_crowd_control(Some(SECOND), FIRST, CcType::Incapacitate, 160, Some(0.0));
    assert!(world.unit(FIRST).unwrap().cc.has(CcType::Incapacitate));

    world.deal_damage(physical_hit(10.0));
    assert!(!world.unit(FIRST).unwrap().cc.has(CcType::Incapacitate));
    assert!(events(&seen).iter().any(|(_, e)| *e
        == CombatEvent::CcRemoved {
            target: FIRST,
            kind: CcType::Incapacitate,
            broken: true,
        }));
}

#[test]
fn test_stealth_survives_periodic_damage_but_not_direct() {
    let mut world = idle_duel(CharacterClass::Rogue, CharacterClass::Warrior);
    let seen = record(&mut world);
    assert!(world.unit(FIRST).unwrap().stealthed);

    world.deal_damage(physical_hit(10.0));
    assert!(world.unit(FIRST).unwrap().stealthed);

    world.deal_damage(Hit {
        kind: HitKind::Direct,
        ..physical_hit(10.0)
    });
    assert!(!world.unit(FIRST).unwrap().stealthed);
    assert!(events(&seen).iter().any(|(_, e)| *e == CombatEvent::StealthBroken { actor: FIRST }));
}

#[test]
fn test_enemy_targeted_ability_breaks_stealth() {
    let mut world = idle_duel(CharacterClass::Rogue, CharacterClass::Warrior);
    place(&mut world, FIRST, 0.0);
    place(&mut world, SECOND, 2.0);
    let seen = record(&mut world);
    world.queue_action(FIRST, AbilityId::SinisterStrike, Some(SECOND));
    world.tick();

    assert!(!world.unit(FIRST).unwrap().stealthed);
    let seen = events(&seen);
    let broken = seen
        .iter()
        .position(|(_, e)| *e == CombatEvent::StealthBroken { actor: FIRST })
        .expect("stealth broken");
    let used = seen
        .iter()
        .position(|(_, e)| matches!(e, CombatEvent::CastSucceeded { .. }))
        .expect("strike lands");
    assert!(broken < used);
}

// =============================================================================
// Finishers, Detonation, Drain
// =============================================================================

#[test]
fn test_finisher_spends_every_combo_point() {
    let mut world = idle_duel(CharacterClass::Rogue, CharacterClass::Warrior);
    place(&mut world, FIRST, 0.0);
    place(&mut world, SECOND, 2.0);
    world.unit_mut(FIRST).unwrap().resources.gain(ResourceType::ComboPoints, 3.0);
    let seen = record(&mut world);
    world.queue_action(FIRST, AbilityId::KidneyShot, Some(SECOND));
    world.tick();

    assert_eq!(world.unit(FIRST).unwrap().resources.current(ResourceType::ComboPoints), 0.0);
    // Three points: 3 x 8 damage and a 3s stun
    let (amount, is_crit) = hit_via(&seen, EffectSource::Ability(AbilityId::KidneyShot));
    let crit = if is_crit { 2.0 } else { 1.0 };
    let expected = 24.0 * damage_scale(&world, FIRST, SECOND, StatKind::Armor) * crit;
    assert!((amount - expected).abs() < 1e-3, "{} vs {}", amount, expected);
    assert!(events(&seen).iter().any(|(_, e)| *e
        == CombatEvent::CcApplied {
            source: Some(FIRST),
            target: SECOND,
            kind: CcType::Stun,
            duration_ticks: 60,
        }));
}

#[test]
fn test_detonate_deals_remaining_periodic_damage() {
    let mut world = idle_duel(CharacterClass::Warlock, CharacterClass::Warrior);
    place(&mut world, FIRST, -10.0);
    place(&mut world, SECOND, 10.0);
    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    for _ in 0..41 {
        world.tick();
    }
    let now = world.current_tick();
    let aura = world.unit(SECOND).unwrap().auras.get(AuraId::Corruption).cloned().unwrap();
    let pending = aura.remaining_ticks(now);
    assert!(pending > 0);

    let seen = record(&mut world);
    world.queue_action(FIRST, AbilityId::DetonateShadows, Some(SECOND));
    world.tick();

    assert!(!world.unit(SECOND).unwrap().auras.has(AuraId::Corruption));
    let (amount, is_crit) = hit_via(&seen, EffectSource::Ability(AbilityId::DetonateShadows));
    let crit = if is_crit { 2.0 } else { 1.0 };
    let base = aura.spec.tick_damage * pending as f32 * 1.2;
    let expected = base * damage_scale(&world, FIRST, SECOND, StatKind::MagicResist) * crit;
    assert!((amount - expected).abs() < 1e-2, "{} vs {}", amount, expected);
}

#[test]
fn test_drain_heals_its_source() {
    let mut content = ArenaContent::bundled().expect("bundled content loads");
    content
        .abilities
        .get_mut(&AbilityId::Corruption)
        .and_then(|def| def.aura.as_mut())
        .expect("corruption applies an aura")
        .on_tick = Some(TickBehavior::Drain {
        damage: 20.0,
        heal_fraction: 0.5,
    });
    let config = idle_config(CharacterClass::Warlock, CharacterClass::Warrior);
    let mut world = Match::new(&config, Arc::new(content)).unwrap();
    place(&mut world, FIRST, -10.0);
    place(&mut world, SECOND, 10.0);
    world.unit_mut(FIRST).unwrap().health = 100.0;
    let seen = record(&mut world);

    world.queue_action(FIRST, AbilityId::Corruption, Some(SECOND));
    for _ in 0..41 {
        world.tick();
    }

    let via = EffectSource::Aura(AuraId::Corruption);
    let (dealt, _) = hit_via(&seen, via);
    assert!(dealt > 0.0);
    let healed = events(&seen)
        .into_iter()
        .find_map(|(_, e)| match e {
            CombatEvent::HealingDone {
                source: Some(FIRST),
                target: FIRST,
                via: v,
                amount,
                overheal,
                ..
            } if v == via => Some(amount + overheal),
            _ => None,
        })
        .expect("drain heals the caster");
    let stats = &world.unit(FIRST).unwrap().stats;
    let expected = dealt * 0.5 * stats.get(StatKind::HealingDone) * stats.get(StatKind::HealingTaken);
    assert!((healed - expected).abs() < 1e-3, "{} vs {}", healed, expected);
}

// =============================================================================
// Hazards
// =============================================================================

fn scheduled(x: f32, kind: HazardKind) -> ScheduledHazard {
    ScheduledHazard {
        at_secs: 1.0,
        x,
        z: 0.0,
        spec: HazardSpec {
            kind,
            radius: 3.0,
            duration_secs: 2.0,
            interval_secs: 0.5,
            anchor: EffectTarget::Target,
        },
    }
}

#[test]
fn test_scheduled_hazards_place_pulse_and_expire() {
    let mut config = idle_config(CharacterClass::Warrior, CharacterClass::Mage);
    config.hazards = vec![
        scheduled(
            -20.0,
            HazardKind::DamageZone {
                damage: 10.0,
                school: SpellSchool::Fire,
            },
        ),
        scheduled(20.0, HazardKind::RootZone { root_secs: 1.0 }),
    ];
    let mut world = Match::new(&config, content()).unwrap();
    place(&mut world, FIRST, -20.0);
    place(&mut world, SECOND, 20.0);
    let seen = record(&mut world);

    for _ in 0..31 {
        world.tick();
    }
    let placed: Vec<(u64, Option<ActorId>)> = events(&seen)
        .into_iter()
        .filter_map(|(tick, e)| match e {
            CombatEvent::HazardPlaced { source, .. } => Some((tick, source)),
            _ => None,
        })
        .collect();
    assert_eq!(placed, vec![(20, None), (20, None)]);
    // Environmental roots carry no source
    let root = world.unit(SECOND).unwrap().cc.get(CcType::Root).copied().expect("rooted");
    assert_eq!(root.source, None);
    assert!(events(&seen).contains(&(
        30,
        CombatEvent::CcApplied {
            source: None,
            target: SECOND,
            kind: CcType::Root,
            duration_ticks: 20,
        }
    )));

    for _ in 0..30 {
        world.tick();
    }
    let burns: Vec<u64> = events(&seen)
        .into_iter()
        .filter_map(|(tick, e)| match e {
            CombatEvent::DamageDealt {
                via: EffectSource::Hazard(_),
                target,
                source,
                ..
            } => {
                assert_eq!((target, source), (FIRST, None));
                Some(tick)
            }
            _ => None,
        })
        .collect();
    assert_eq!(burns, vec![30, 40, 50]);
    let expired = events(&seen)
        .iter()
        .filter(|(tick, e)| *tick == 60 && matches!(e, CombatEvent::HazardExpired { .. }))
        .count();
    assert_eq!(expired, 2);
    assert!(world.hazards().is_empty());
}
