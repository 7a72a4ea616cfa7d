//! Tests for the bundled class and ability content
//!
//! These tests verify that:
//! - The bundled RON content loads and validates
//! - Every equipped ability resolves and has sane numbers
//! - Interrupt abilities have lockout durations
//! - Every effect kind the engine dispatches is exercised by some ability

use std::collections::HashSet;

use arena_duel::arena::abilities::{AbilityId, Effect, Targeting};
use arena_duel::arena::ability_config::{ArenaContent, ContentError};
use arena_duel::arena::match_config::CharacterClass;

fn content() -> ArenaContent {
    ArenaContent::bundled().expect("bundled content loads")
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_bundled_content_matches_file_on_disk() {
    let from_file = ArenaContent::load_from_file("assets/config/content.ron").expect("content file loads");
    assert_eq!(from_file, content());
}

#[test]
fn test_missing_content_file_is_io_error() {
    let result = ArenaContent::load_from_file("assets/config/does_not_exist.ron");
    assert!(matches!(result, Err(ContentError::Io { .. })));
}

#[test]
fn test_missing_class_is_rejected() {
    let mut content = content();
    content.classes.remove(&CharacterClass::Rogue);
    assert!(matches!(
        content.validate(),
        Err(ContentError::MissingClass(CharacterClass::Rogue))
    ));
}

// =============================================================================
// Ability Definition Validation Tests
// =============================================================================

#[test]
fn test_every_class_ability_is_defined() {
    let content = content();
    for class in CharacterClass::all() {
        let def = content.class(*class).unwrap();
        assert!(!def.abilities.is_empty(), "{:?} has no abilities", class);
        for ability in &def.abilities {
            assert!(
                content.ability(*ability).is_some(),
                "{:?} equips undefined {:?}",
                class,
                ability
            );
        }
    }
}

#[test]
fn test_abilities_have_valid_numbers() {
    for (id, def) in &content().abilities {
        assert!(def.cooldown_secs >= 0.0, "{:?} cooldown must be non-negative", id);
        assert!(def.cast_time_secs >= 0.0, "{:?} cast time must be non-negative", id);
        assert!(def.range >= def.min_range, "{:?} range below min range", id);
        assert!(def.charges >= 1, "{:?} needs at least one charge", id);
        for cost in &def.costs {
            assert!(cost.amount > 0.0, "{:?} has a non-positive cost", id);
        }
        if let Some(damage) = &def.damage {
            assert!(damage.min > 0.0 && damage.max >= damage.min, "{:?} damage range invalid", id);
        }
    }
}

#[test]
fn test_self_only_abilities_have_no_range_requirements() {
    for (id, def) in &content().abilities {
        if def.targeting == Targeting::SelfOnly {
            assert_eq!(def.min_range, 0.0, "{:?} is self-only but has a min range", id);
            assert!(def.damage.is_none(), "{:?} is self-only but deals direct damage", id);
        }
    }
}

#[test]
fn test_ability_names_are_unique() {
    let content = content();
    let names: HashSet<&str> = content.abilities.keys().map(AbilityId::name).collect();
    assert_eq!(names.len(), content.abilities.len());
}

// =============================================================================
// Interrupt Tests
// =============================================================================

#[test]
fn test_every_class_has_an_interrupt_with_lockout() {
    let content = content();
    for class in CharacterClass::all() {
        let lockouts: Vec<f32> = content
            .class(*class)
            .unwrap()
            .abilities
            .iter()
            .filter_map(|a| match content.ability(*a)?.effect {
                Some(Effect::Interrupt { lockout_secs }) => Some(lockout_secs),
                _ => None,
            })
            .collect();
        assert_eq!(lockouts.len(), 1, "{:?} should have exactly one interrupt", class);
        assert!(lockouts[0] > 0.0, "{:?} interrupt needs a lockout", class);
    }
}

#[test]
fn test_interrupts_ignore_global_cooldown() {
    for (id, def) in &content().abilities {
        if matches!(def.effect, Some(Effect::Interrupt { .. })) {
            assert!(def.flags.ignores_gcd, "{:?} interrupt should be off the GCD", id);
            assert!(def.is_instant(), "{:?} interrupt should be instant", id);
        }
    }
}

// =============================================================================
// Effect Coverage Tests
// =============================================================================

fn effect_kind(effect: &Effect) -> &'static str {
    match effect {
        Effect::DirectDamage(_) => "DirectDamage",
        Effect::Heal(_) => "Heal",
        Effect::PeriodicDamage(_) => "PeriodicDamage",
        Effect::CrowdControl(_) => "CrowdControl",
        Effect::StatAura(_) => "StatAura",
        Effect::Absorb(_) => "Absorb",
        Effect::ResourceGrant(_) => "ResourceGrant",
        Effect::Interrupt { .. } => "Interrupt",
        Effect::Stealth => "Stealth",
        Effect::Dispel => "Dispel",
        Effect::PlaceHazard(_) => "PlaceHazard",
        Effect::Composite(_) => "Composite",
        Effect::Custom(_) => "Custom",
    }
}

#[test]
fn test_every_effect_kind_is_used() {
    let mut seen = HashSet::new();
    for def in content().abilities.values() {
        def.visit_effects(|effect| {
            seen.insert(effect_kind(effect));
        });
    }
    for kind in [
        "DirectDamage",
        "Heal",
        "PeriodicDamage",
        "CrowdControl",
        "StatAura",
        "Absorb",
        "ResourceGrant",
        "Interrupt",
        "Stealth",
        "Dispel",
        "PlaceHazard",
        "Composite",
        "Custom",
    ] {
        assert!(seen.contains(kind), "no ability uses {}", kind);
    }
}

#[test]
fn test_default_effect_order() {
    let content = content();
    let kinds: Vec<&str> = content
        .ability(AbilityId::Ambush)
        .unwrap()
        .effects()
        .iter()
        .map(effect_kind)
        .collect();
    assert_eq!(kinds, vec!["DirectDamage", "StatAura", "ResourceGrant"]);

    let charge: Vec<&str> = content
        .ability(AbilityId::Charge)
        .unwrap()
        .effects()
        .iter()
        .map(effect_kind)
        .collect();
    assert_eq!(charge, vec!["CrowdControl", "ResourceGrant"]);
}
