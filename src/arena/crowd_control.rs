//! Crowd Control & Diminishing Returns
//!
//! Each DR category tracks how many times it has been applied to a unit in
//! quick succession. Subsequent applications within the reset window get
//! reduced duration:
//! - 1st application: 100% duration
//! - 2nd application: 50% duration
//! - 3rd application: 25% duration
//! - 4th+ application: Immune
//!
//! The counter resets once [`DR_RESET_TICKS`] pass since the last application.
//! Fear and disorient share a category; disarm has none.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::constants::{DR_MULTIPLIERS, DR_RESET_TICKS};
use super::unit::ActorId;

/// Kinds of crowd control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CcType {
    Stun,
    Root,
    Fear,
    Disorient,
    Incapacitate,
    Silence,
    Disarm,
}

impl CcType {
    pub fn name(&self) -> &'static str {
        match self {
            CcType::Stun => "Stun",
            CcType::Root => "Root",
            CcType::Fear => "Fear",
            CcType::Disorient => "Disorient",
            CcType::Incapacitate => "Incapacitate",
            CcType::Silence => "Silence",
            CcType::Disarm => "Disarm",
        }
    }

    pub fn dr_category(&self) -> Option<DrCategory> {
        match self {
            CcType::Stun => Some(DrCategory::Stun),
            CcType::Root => Some(DrCategory::Root),
            CcType::Fear | CcType::Disorient => Some(DrCategory::Disorient),
            CcType::Incapacitate => Some(DrCategory::Incapacitate),
            CcType::Silence => Some(DrCategory::Silence),
            CcType::Disarm => None,
        }
    }

    /// Loss of control: no abilities, no auto-attacks.
    pub fn prevents_action(&self) -> bool {
        matches!(
            self,
            CcType::Stun | CcType::Fear | CcType::Disorient | CcType::Incapacitate
        )
    }

    /// Voluntary movement is impossible (feared units still wander).
    pub fn prevents_movement(&self) -> bool {
        matches!(
            self,
            CcType::Stun | CcType::Root | CcType::Fear | CcType::Disorient | CcType::Incapacitate
        )
    }

    /// Cancels any cast or channel in progress when applied.
    pub fn cancels_casts(&self) -> bool {
        matches!(self, CcType::Stun | CcType::Fear | CcType::Incapacitate)
    }

    /// The unit wanders randomly instead of standing still.
    pub fn wanders(&self) -> bool {
        matches!(self, CcType::Fear | CcType::Disorient)
    }

    /// Pins the unit where it stands, wandering included.
    pub fn holds_in_place(&self) -> bool {
        matches!(self, CcType::Stun | CcType::Root | CcType::Incapacitate)
    }
}

/// Diminishing returns categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrCategory {
    Stun,
    Root,
    Disorient,
    Incapacitate,
    Silence,
}

impl DrCategory {
    pub const COUNT: usize = 5;

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Content description of a crowd control effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CcSpec {
    pub kind: CcType,
    pub duration_secs: f32,
    /// Accumulated damage beyond which the effect breaks (0.0 = any damage)
    #[serde(default)]
    pub break_on_damage: Option<f32>,
}

/// Why a crowd control application was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImmuneReason {
    /// The target carries a damage or CC immunity aura.
    Immunity,
    /// The DR counter for this category is exhausted.
    DiminishingReturns,
}

/// Result of a crowd control application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CcOutcome {
    Applied { duration_ticks: u64 },
    Immune(ImmuneReason),
}

/// An active crowd control effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CcEntry {
    pub kind: CcType,
    /// `None` for environmental effects
    pub source: Option<ActorId>,
    pub applied_at: u64,
    pub expires_at: u64,
    pub break_threshold: Option<f32>,
    pub damage_taken: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct DrEntry {
    count: u8,
    last_applied: Option<u64>,
}

/// Tracks diminishing returns per category for one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrTracker {
    entries: [DrEntry; DrCategory::COUNT],
}

impl DrTracker {
    /// Applications counted against this category at `now` (0 once the window has passed).
    pub fn count(&self, category: DrCategory, now: u64) -> u8 {
        let entry = &self.entries[category.index()];
        match entry.last_applied {
            Some(last) if now.saturating_sub(last) <= DR_RESET_TICKS => entry.count,
            _ => 0,
        }
    }

    /// Duration multiplier for the next application (`None` = immune).
    pub fn multiplier(&self, category: DrCategory, now: u64) -> Option<f32> {
        DR_MULTIPLIERS.get(self.count(category, now) as usize).copied()
    }

    pub fn is_immune(&self, category: DrCategory, now: u64) -> bool {
        self.multiplier(category, now).is_none()
    }

    fn record(&mut self, category: DrCategory, now: u64) {
        let count = self.count(category, now);
        self.entries[category.index()] = DrEntry {
            count: count + 1,
            last_applied: Some(now),
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Optional behavior of a crowd control application.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CcOptions {
    pub break_on_damage: Option<f32>,
    /// The target carries an immunity aura
    pub target_immune: bool,
}

/// Active crowd control and DR state for one unit.
#[derive(Clone, Debug, Default)]
pub struct CrowdControlState {
    entries: SmallVec<[CcEntry; 4]>,
    pub dr: DrTracker,
}

impl CrowdControlState {
    /// Apply crowd control with diminishing returns.
    ///
    /// An immune target rejects the effect outright. Otherwise a DR category
    /// whose counter is exhausted rejects it without advancing the counter;
    /// any other application scales `base_ticks` by the DR multiplier
    /// (minimum one tick) and advances the counter.
    pub fn apply(
        &mut self,
        source: Option<ActorId>,
        kind: CcType,
        base_ticks: u64,
        now: u64,
        options: CcOptions,
    ) -> CcOutcome {
        if options.target_immune {
            return CcOutcome::Immune(ImmuneReason::Immunity);
        }
        let duration_ticks = match kind.dr_category() {
            Some(category) => {
                let Some(multiplier) = self.dr.multiplier(category, now) else {
                    return CcOutcome::Immune(ImmuneReason::DiminishingReturns);
                };
                self.dr.record(category, now);
                ((base_ticks as f32 * multiplier).round() as u64).max(1)
            }
            None => base_ticks.max(1),
        };

        self.entries.retain(|e| e.kind != kind);
        self.entries.push(CcEntry {
            kind,
            source,
            applied_at: now,
            expires_at: now + duration_ticks,
            break_threshold: options.break_on_damage,
            damage_taken: 0.0,
        });
        CcOutcome::Applied { duration_ticks }
    }

    /// Remove expired effects.
    pub fn tick(&mut self, now: u64) -> SmallVec<[CcEntry; 2]> {
        self.drain_where(|e| now >= e.expires_at)
    }

    /// Accumulate damage on breakable effects and remove those past their threshold.
    pub fn on_damage(&mut self, amount: f32) -> SmallVec<[CcEntry; 2]> {
        if amount <= 0.0 {
            return SmallVec::new();
        }
        for entry in self.entries.iter_mut() {
            if entry.break_threshold.is_some() {
                entry.damage_taken += amount;
            }
        }
        self.drain_where(|e| e.break_threshold.is_some_and(|t| e.damage_taken > t))
    }

    fn drain_where(&mut self, pred: impl Fn(&CcEntry) -> bool) -> SmallVec<[CcEntry; 2]> {
        let mut removed = SmallVec::new();
        self.entries.retain(|e| {
            if pred(e) {
                removed.push(*e);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn has(&self, kind: CcType) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    pub fn prevents_action(&self) -> bool {
        self.entries.iter().any(|e| e.kind.prevents_action())
    }

    pub fn prevents_movement(&self) -> bool {
        self.entries.iter().any(|e| e.kind.prevents_movement())
    }

    pub fn is_silenced(&self) -> bool {
        self.has(CcType::Silence)
    }

    pub fn is_disarmed(&self) -> bool {
        self.has(CcType::Disarm)
    }

    /// Feared or disoriented, and not pinned by anything else.
    pub fn is_wandering(&self) -> bool {
        self.entries.iter().any(|e| e.kind.wanders()) && !self.entries.iter().any(|e| e.kind.holds_in_place())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CcEntry> {
        self.entries.iter()
    }

    pub fn get(&self, kind: CcType) -> Option<&CcEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Drop all active effects (death). DR history is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(state: &mut CrowdControlState, kind: CcType, base: u64, now: u64) -> CcOutcome {
        state.apply(Some(ActorId(0)), kind, base, now, CcOptions::default())
    }

    #[test]
    fn test_dr_sequence_full_half_quarter_immune() {
        let mut state = CrowdControlState::default();
        let outcomes: Vec<_> = [0, 10, 20, 30]
            .into_iter()
            .map(|now| apply(&mut state, CcType::Stun, 80, now))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                CcOutcome::Applied { duration_ticks: 80 },
                CcOutcome::Applied { duration_ticks: 40 },
                CcOutcome::Applied { duration_ticks: 20 },
                CcOutcome::Immune(ImmuneReason::DiminishingReturns),
            ]
        );
    }

    #[test]
    fn test_immune_application_does_not_advance_counter() {
        let mut state = CrowdControlState::default();
        for now in 0..3 {
            apply(&mut state, CcType::Root, 40, now);
        }
        assert_eq!(state.dr.count(DrCategory::Root, 3), 3);
        apply(&mut state, CcType::Root, 40, 3);
        assert_eq!(state.dr.count(DrCategory::Root, 4), 3);
    }

    #[test]
    fn test_dr_resets_after_window() {
        let mut state = CrowdControlState::default();
        apply(&mut state, CcType::Stun, 80, 0);
        apply(&mut state, CcType::Stun, 80, 10);
        assert_eq!(
            apply(&mut state, CcType::Stun, 80, 10 + DR_RESET_TICKS + 1),
            CcOutcome::Applied { duration_ticks: 80 }
        );
    }

    #[test]
    fn test_fear_and_disorient_share_category() {
        let mut state = CrowdControlState::default();
        apply(&mut state, CcType::Fear, 60, 0);
        assert_eq!(
            apply(&mut state, CcType::Disorient, 60, 5),
            CcOutcome::Applied { duration_ticks: 30 }
        );
        // Different category is unaffected
        assert_eq!(
            apply(&mut state, CcType::Stun, 60, 5),
            CcOutcome::Applied { duration_ticks: 60 }
        );
    }

    #[test]
    fn test_disarm_has_no_dr() {
        let mut state = CrowdControlState::default();
        for now in 0..5 {
            assert_eq!(
                apply(&mut state, CcType::Disarm, 60, now * 100),
                CcOutcome::Applied { duration_ticks: 60 }
            );
        }
    }

    #[test]
    fn test_minimum_duration_is_one_tick() {
        let mut state = CrowdControlState::default();
        apply(&mut state, CcType::Silence, 1, 0);
        apply(&mut state, CcType::Silence, 1, 1);
        assert_eq!(
            apply(&mut state, CcType::Silence, 1, 2),
            CcOutcome::Applied { duration_ticks: 1 }
        );
    }

    #[test]
    fn test_immunity_rejects_without_dr() {
        let mut state = CrowdControlState::default();
        let outcome = state.apply(
            Some(ActorId(0)),
            CcType::Stun,
            40,
            0,
            CcOptions {
                target_immune: true,
                ..Default::default()
            },
        );
        assert_eq!(outcome, CcOutcome::Immune(ImmuneReason::Immunity));
        assert_eq!(state.dr.count(DrCategory::Stun, 0), 0);
    }

    #[test]
    fn test_root_pins_a_feared_unit() {
        let mut state = CrowdControlState::default();
        apply(&mut state, CcType::Fear, 60, 0);
        assert!(state.is_wandering());
        assert!(state.prevents_movement());

        apply(&mut state, CcType::Root, 20, 0);
        assert!(!state.is_wandering());

        state.tick(20);
        assert!(state.is_wandering(), "wandering resumes once the root ends");
    }

    #[test]
    fn test_zero_threshold_breaks_on_any_damage() {
        let mut state = CrowdControlState::default();
        state.apply(
            Some(ActorId(0)),
            CcType::Incapacitate,
            160,
            0,
            CcOptions {
                break_on_damage: Some(0.0),
                ..Default::default()
            },
        );
        apply(&mut state, CcType::Root, 40, 0);

        let broken = state.on_damage(1.0);
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].kind, CcType::Incapacitate);
        assert!(state.has(CcType::Root));
    }

    #[test]
    fn test_threshold_accumulates() {
        let mut state = CrowdControlState::default();
        state.apply(
            Some(ActorId(0)),
            CcType::Fear,
            160,
            0,
            CcOptions {
                break_on_damage: Some(50.0),
                ..Default::default()
            },
        );
        assert!(state.on_damage(30.0).is_empty());
        assert_eq!(state.on_damage(30.0).len(), 1);
        assert!(!state.prevents_action());
    }

    #[test]
    fn test_expiry() {
        let mut state = CrowdControlState::default();
        apply(&mut state, CcType::Stun, 20, 0);
        assert!(state.tick(19).is_empty());
        assert!(state.prevents_action());
        assert_eq!(state.tick(20).len(), 1);
        assert!(!state.prevents_action());
    }
}
