//! Combat Constants
//!
//! Centralized location for magic numbers used throughout the combat engine.
//! This makes it easier to tune balance and ensures consistency.
//!
//! All timers inside the engine are expressed in ticks. Content is authored in
//! seconds and converted with [`secs_to_ticks`].

// ============================================================================
// Time Base
// ============================================================================

/// Simulation steps per second.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in seconds.
pub const TICK_SECS: f32 = 1.0 / TICK_RATE as f32;

/// Convert a duration in seconds to whole ticks (rounded to nearest).
pub fn secs_to_ticks(secs: f32) -> u64 {
    if secs <= 0.0 {
        return 0;
    }
    (secs * TICK_RATE as f32).round() as u64
}

/// Convert a tick count back to seconds (for logs and summaries).
pub fn ticks_to_secs(ticks: u64) -> f32 {
    ticks as f32 * TICK_SECS
}

// ============================================================================
// Global Cooldown
// ============================================================================

/// Standard global cooldown (1.5s).
pub const GCD_TICKS: u64 = 30;

// ============================================================================
// Combat Ranges
// ============================================================================

/// Melee attack range in units. Combatants must be within this distance to auto-attack.
pub const MELEE_RANGE: f32 = 2.5;

/// Collision radius of a combatant in the horizontal plane.
pub const ACTOR_RADIUS: f32 = 0.5;

// ============================================================================
// Diminishing Returns
// ============================================================================

/// Window after the last application of a DR category before its counter resets (18s).
pub const DR_RESET_TICKS: u64 = 360;

/// Duration multipliers indexed by the consecutive application counter.
/// A counter past the end of this table means the target is immune.
pub const DR_MULTIPLIERS: [f32; 3] = [1.0, 0.5, 0.25];

// ============================================================================
// Casting
// ============================================================================

/// Cast time added per physical hit while casting (0.5s).
pub const PUSHBACK_TICKS: u64 = 10;

/// Maximum number of pushbacks a single cast can suffer.
pub const MAX_PUSHBACKS: u8 = 3;

/// Interval between channel ticks (1s).
pub const CHANNEL_TICK_INTERVAL: u64 = 20;

// ============================================================================
// Damage & Healing
// ============================================================================

/// Upper bound on armor mitigation and, independently, on magic resistance mitigation.
pub const MAX_MITIGATION: f32 = 0.75;

/// Mitigation curve constant: `stat / (stat + MITIGATION_CONSTANT)`.
pub const MITIGATION_CONSTANT: f32 = 400.0;

/// Critical strike multiplier for direct damage.
pub const CRIT_DAMAGE_MULTIPLIER: f32 = 2.0;

/// Critical strike multiplier for direct healing.
pub const CRIT_HEALING_MULTIPLIER: f32 = 1.5;

/// Critical multiplier for periodic effects (only applied when the effect is flagged guaranteed-crit).
pub const PERIODIC_CRIT_MULTIPLIER: f32 = 1.5;

// ============================================================================
// Arena
// ============================================================================

/// Default radius of the circular arena floor.
pub const ARENA_RADIUS: f32 = 30.0;

/// Default spawn distance from the arena center.
pub const SPAWN_DISTANCE: f32 = 20.0;

// ============================================================================
// Movement
// ============================================================================

/// Distance covered by a dodge roll.
pub const DODGE_DISTANCE: f32 = 6.0;

/// Ticks the dodge roll takes to complete.
pub const DODGE_TICKS: u64 = 4;

/// Full damage immunity granted when the dodge starts.
pub const DODGE_IMMUNITY_TICKS: u64 = 8;

/// Enemies within this radius are slowed when a dodge starts.
pub const DODGE_SLOW_RADIUS: f32 = 5.0;

/// Movement speed multiplier applied to enemies caught by the dodge.
pub const DODGE_SLOW_MULTIPLIER: f32 = 0.6;

/// Duration of the dodge slow (3s).
pub const DODGE_SLOW_TICKS: u64 = 60;

/// Dodge cooldown, independent of ability cooldowns (12s).
pub const DODGE_COOLDOWN_TICKS: u64 = 240;

/// Feared units pick a new wander direction this often (1s).
pub const FEAR_DIRECTION_TICKS: u64 = 20;

/// Feared units move at this fraction of their normal speed.
pub const FEAR_SPEED_MULTIPLIER: f32 = 0.7;

// ============================================================================
// AI Thresholds
// ============================================================================

/// Below this health fraction the scripted controller is in an emergency.
pub const EMERGENCY_HP_THRESHOLD: f32 = 0.3;

/// Below this health fraction defensive abilities gain priority.
pub const DEFENSIVE_HP_THRESHOLD: f32 = 0.6;

/// Enemy health fraction under which a burst window opens.
pub const BURST_HP_THRESHOLD: f32 = 0.35;

/// Distance a kiting unit tries to keep from a melee enemy.
pub const SAFE_KITING_DISTANCE: f32 = 8.0;
