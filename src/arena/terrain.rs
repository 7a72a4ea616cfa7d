//! Arena layout: circular bounds, pillars, line of sight and collision.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::constants::{ACTOR_RADIUS, ARENA_RADIUS};
use super::geometry::{flat, horizontal_direction, horizontal_distance, segment_intersects_circle};

/// A circular obstacle that blocks line of sight and movement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pillar {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

impl Pillar {
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

/// Arena floor centered on the origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaLayout {
    pub radius: f32,
    #[serde(default)]
    pub pillars: Vec<Pillar>,
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self {
            radius: ARENA_RADIUS,
            pillars: Vec::new(),
        }
    }
}

impl ArenaLayout {
    /// Open floor with four pillars placed off the spawn axis.
    pub fn pillared() -> Self {
        let offset = 10.0;
        Self {
            radius: ARENA_RADIUS,
            pillars: [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)]
                .into_iter()
                .map(|(sx, sz)| Pillar {
                    x: sx * offset,
                    z: sz * offset,
                    radius: 2.5,
                })
                .collect(),
        }
    }

    /// True if no pillar blocks the segment between the two points.
    pub fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self
            .pillars
            .iter()
            .any(|p| segment_intersects_circle(from, to, p.center(), p.radius))
    }

    /// Pull an out-of-bounds position back along the center-ward radius.
    pub fn clamp_to_bounds(&self, pos: Vec3) -> Vec3 {
        let limit = (self.radius - ACTOR_RADIUS).max(0.0);
        let planar = flat(pos);
        let dist = planar.length();
        if dist <= limit {
            return pos;
        }
        let scaled = planar * (limit / dist);
        Vec3::new(scaled.x, pos.y, scaled.y)
    }

    pub fn in_bounds(&self, pos: Vec3) -> bool {
        flat(pos).length() <= self.radius - ACTOR_RADIUS + 1e-4
    }

    /// Push a position out of any pillar it overlaps, onto the pillar's surface.
    pub fn resolve_collision(&self, pos: Vec3) -> Vec3 {
        let mut resolved = pos;
        for pillar in &self.pillars {
            let min_dist = pillar.radius + ACTOR_RADIUS;
            let center = pillar.center();
            let dist = horizontal_distance(resolved, center);
            if dist < min_dist {
                let mut dir = horizontal_direction(center, resolved);
                if dir == Vec3::ZERO {
                    dir = Vec3::X;
                }
                let surface = center + dir * min_dist;
                resolved = Vec3::new(surface.x, resolved.y, surface.z);
            }
        }
        resolved
    }

    /// Collision then bounds.
    pub fn resolve_position(&self, pos: Vec3) -> Vec3 {
        self.clamp_to_bounds(self.resolve_collision(pos))
    }

    pub fn nearest_pillar(&self, pos: Vec3) -> Option<&Pillar> {
        self.pillars.iter().min_by(|a, b| {
            horizontal_distance(pos, a.center()).total_cmp(&horizontal_distance(pos, b.center()))
        })
    }

    /// Spot directly behind `pillar` as seen from `threat`.
    pub fn hiding_spot(&self, pillar: &Pillar, threat: Vec3) -> Vec3 {
        let center = pillar.center();
        let mut away = horizontal_direction(threat, center);
        if away == Vec3::ZERO {
            away = Vec3::X;
        }
        self.clamp_to_bounds(center + away * (pillar.radius + ACTOR_RADIUS + 1.0))
    }
}
