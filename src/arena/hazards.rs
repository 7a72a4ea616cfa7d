//! Ground hazards: arena-level timed zones that affect whoever stands in them.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::abilities::{EffectTarget, SpellSchool};
use super::constants::secs_to_ticks;
use super::geometry::horizontal_distance;
use super::unit::ActorId;

/// What a zone does on each pulse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HazardKind {
    DamageZone { damage: f32, school: SpellSchool },
    RootZone { root_secs: f32 },
}

impl HazardKind {
    pub fn name(&self) -> &'static str {
        match self {
            HazardKind::DamageZone { .. } => "Damage Zone",
            HazardKind::RootZone { .. } => "Root Zone",
        }
    }
}

/// Content description of a hazard placed by an ability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardSpec {
    pub kind: HazardKind,
    pub radius: f32,
    pub duration_secs: f32,
    pub interval_secs: f32,
    /// Where the zone is centered
    #[serde(default)]
    pub anchor: EffectTarget,
}

/// A hazard scheduled by the match configuration. It has no owner and
/// affects both combatants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledHazard {
    pub at_secs: f32,
    pub x: f32,
    pub z: f32,
    pub spec: HazardSpec,
}

/// A live hazard.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveHazard {
    pub id: u32,
    pub kind: HazardKind,
    pub position: Vec3,
    pub radius: f32,
    /// Owner; `None` for environmental hazards which hit everyone
    pub source: Option<ActorId>,
    pub placed_at: u64,
    pub expires_at: u64,
    pub interval: u64,
    pub next_pulse_at: u64,
}

impl ActiveHazard {
    pub fn new(id: u32, spec: &HazardSpec, position: Vec3, source: Option<ActorId>, now: u64) -> Self {
        let interval = secs_to_ticks(spec.interval_secs).max(1);
        Self {
            id,
            kind: spec.kind.clone(),
            position,
            radius: spec.radius,
            source,
            placed_at: now,
            expires_at: now + secs_to_ticks(spec.duration_secs),
            interval,
            next_pulse_at: now + interval,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Advance the pulse schedule; true when a pulse fires this tick.
    pub fn poll_pulse(&mut self, now: u64) -> bool {
        if now >= self.next_pulse_at {
            self.next_pulse_at += self.interval;
            true
        } else {
            false
        }
    }

    pub fn contains(&self, pos: Vec3) -> bool {
        horizontal_distance(self.position, pos) <= self.radius
    }

    /// Whether this hazard affects `actor`. Owned hazards never hit their owner.
    pub fn affects(&self, actor: ActorId) -> bool {
        self.source != Some(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> HazardSpec {
        HazardSpec {
            kind: HazardKind::DamageZone {
                damage: 10.0,
                school: SpellSchool::Fire,
            },
            radius: 4.0,
            duration_secs: 3.0,
            interval_secs: 1.0,
            anchor: EffectTarget::Target,
        }
    }

    #[test]
    fn test_pulses_at_interval_until_expiry() {
        let mut hazard = ActiveHazard::new(1, &spec(), Vec3::ZERO, Some(ActorId(0)), 100);
        let pulses: Vec<u64> = (101..=160)
            .filter(|&now| !hazard.is_expired(now) && hazard.poll_pulse(now))
            .collect();
        assert_eq!(pulses, vec![120, 140]);
        assert!(hazard.is_expired(160));
    }

    #[test]
    fn test_owner_is_not_affected() {
        let owned = ActiveHazard::new(1, &spec(), Vec3::ZERO, Some(ActorId(0)), 0);
        assert!(!owned.affects(ActorId(0)));
        assert!(owned.affects(ActorId(1)));
        let environmental = ActiveHazard::new(2, &spec(), Vec3::ZERO, None, 0);
        assert!(environmental.affects(ActorId(0)));
    }

    #[test]
    fn test_contains_uses_radius() {
        let hazard = ActiveHazard::new(1, &spec(), Vec3::ZERO, None, 0);
        assert!(hazard.contains(Vec3::new(4.0, 0.0, 0.0)));
        assert!(!hazard.contains(Vec3::new(4.1, 0.0, 0.0)));
    }
}
