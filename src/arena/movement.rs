//! Movement helpers: capped steps, dodge rolls and kiting directions.

use bevy::math::Vec3;

use super::constants::{DODGE_DISTANCE, DODGE_TICKS};
use super::geometry::{horizontal_direction, horizontal_distance};
use super::terrain::ArenaLayout;

/// Move from `from` toward `to` by at most `max_step` (horizontal plane).
/// Returns the new position and whether the destination was reached.
pub fn step_towards(from: Vec3, to: Vec3, max_step: f32) -> (Vec3, bool) {
    let dist = horizontal_distance(from, to);
    if dist <= max_step {
        return (Vec3::new(to.x, from.y, to.z), true);
    }
    let dir = horizontal_direction(from, to);
    (from + dir * max_step, false)
}

/// An in-progress dodge roll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DodgeState {
    pub direction: Vec3,
    pub remaining_ticks: u64,
}

impl DodgeState {
    pub fn new(direction: Vec3) -> Self {
        Self {
            direction: Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero(),
            remaining_ticks: DODGE_TICKS,
        }
    }

    /// Distance covered on each tick of the roll.
    pub fn step_distance() -> f32 {
        DODGE_DISTANCE / DODGE_TICKS as f32
    }
}

/// Find the best direction to kite away from an enemy while staying inside
/// the arena. Prefers moving straight away; when that leaves the arena, tests
/// 16 directions and scores them by distance from the enemy plus alignment
/// with the ideal direction.
pub fn find_best_kiting_direction(
    layout: &ArenaLayout,
    current_pos: Vec3,
    enemy_pos: Vec3,
    move_distance: f32,
) -> Vec3 {
    let ideal_direction = horizontal_direction(enemy_pos, current_pos);
    if ideal_direction == Vec3::ZERO {
        return Vec3::ZERO;
    }

    if layout.in_bounds(current_pos + ideal_direction * move_distance) {
        return ideal_direction;
    }

    let mut best_direction = Vec3::ZERO;
    let mut best_score = f32::MIN;
    for i in 0..16 {
        let angle = (i as f32) * std::f32::consts::TAU / 16.0;
        let candidate_direction = Vec3::new(angle.cos(), 0.0, angle.sin());
        let candidate_next_pos = current_pos + candidate_direction * move_distance;
        if !layout.in_bounds(candidate_next_pos) {
            continue;
        }
        let distance_from_enemy = horizontal_distance(candidate_next_pos, enemy_pos);
        let alignment_with_ideal = candidate_direction.dot(ideal_direction).max(0.0);
        let score = distance_from_enemy * 2.0 + alignment_with_ideal * 5.0;
        if score > best_score {
            best_score = score;
            best_direction = candidate_direction;
        }
    }
    best_direction
}
