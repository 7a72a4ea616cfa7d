//! Cast validation.
//!
//! A pure check run when an action is resolved, again when a cast completes,
//! and by decision makers probing what they can use. Checks run in a fixed
//! order and the first failure is reported.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::abilities::{AbilityDef, AbilityId, Targeting};
use super::terrain::ArenaLayout;
use super::unit::Unit;

/// Why an ability could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CastFailure {
    #[error("ability is not equipped")]
    NotEquipped,
    #[error("caster is dead")]
    Dead,
    #[error("caster is crowd controlled")]
    CrowdControlled,
    #[error("caster is silenced")]
    Silenced,
    #[error("global cooldown is active")]
    OnGlobalCooldown,
    #[error("ability is on cooldown")]
    OnCooldown,
    #[error("already casting")]
    AlreadyCasting,
    #[error("not enough resource")]
    InsufficientResource,
    #[error("requires stealth")]
    RequiresStealth,
    #[error("invalid target")]
    InvalidTarget,
    #[error("target is stealthed")]
    TargetStealthed,
    #[error("target is out of range")]
    OutOfRange,
    #[error("target is too close")]
    TooClose,
    #[error("target is not in line of sight")]
    NoLineOfSight,
    #[error("spell school is locked out")]
    SchoolLocked,
}

/// Start checks everything; completion skips the global cooldown and the
/// already-casting check, both of which the cast in progress trips itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationMode {
    Start,
    Completion,
}

/// Validate `ability` for `caster` against `target` at tick `now`.
///
/// `target` is `None` when the requested target id does not resolve.
pub fn validate_cast(
    caster: &Unit,
    ability: AbilityId,
    def: &AbilityDef,
    target: Option<&Unit>,
    layout: &ArenaLayout,
    now: u64,
    mode: ValidationMode,
) -> Result<(), CastFailure> {
    if !caster.equips(ability) {
        return Err(CastFailure::NotEquipped);
    }
    if !caster.is_alive() {
        return Err(CastFailure::Dead);
    }
    if !caster.can_act() {
        return Err(CastFailure::CrowdControlled);
    }
    if !caster.can_cast(def.school) {
        return Err(CastFailure::Silenced);
    }
    if mode == ValidationMode::Start && !def.flags.ignores_gcd && caster.on_gcd(now) {
        return Err(CastFailure::OnGlobalCooldown);
    }
    if !caster.cooldowns.is_ready(ability) {
        return Err(CastFailure::OnCooldown);
    }
    if mode == ValidationMode::Start && !caster.cast.is_idle() {
        return Err(CastFailure::AlreadyCasting);
    }
    if !def
        .costs
        .iter()
        .all(|cost| caster.resources.can_afford(cost.kind, cost.amount))
    {
        return Err(CastFailure::InsufficientResource);
    }
    if def.flags.requires_stealth && !caster.stealthed {
        return Err(CastFailure::RequiresStealth);
    }

    if def.targeting == Targeting::Enemy {
        let target = match target {
            Some(t) if t.id != caster.id && t.is_alive() => t,
            _ => return Err(CastFailure::InvalidTarget),
        };
        if target.stealthed {
            return Err(CastFailure::TargetStealthed);
        }
        let distance = caster.distance_to(target);
        if distance > def.range {
            return Err(CastFailure::OutOfRange);
        }
        if distance < def.min_range {
            return Err(CastFailure::TooClose);
        }
        if !def.flags.ignores_line_of_sight && !layout.has_line_of_sight(caster.position, target.position) {
            return Err(CastFailure::NoLineOfSight);
        }
    }

    if caster.lockouts.is_locked(def.school, now) {
        return Err(CastFailure::SchoolLocked);
    }
    Ok(())
}
