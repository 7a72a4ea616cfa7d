//! Ability cooldown and charge tracking.
//!
//! Single-use abilities are modelled as one charge. Multi-charge abilities
//! recharge one charge at a time; the next recharge is scheduled from the due
//! time of the previous one so charges never drift with tick timing.

use std::collections::BTreeMap;

use super::abilities::AbilityId;

/// Cooldown state for one ability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownEntry {
    pub max_charges: u8,
    pub charges: u8,
    pub recharge_ticks: u64,
    /// Tick at which the next missing charge comes back
    pub next_charge_at: Option<u64>,
}

/// Per-unit cooldown table keyed by ability.
#[derive(Clone, Debug, Default)]
pub struct CooldownTracker {
    entries: BTreeMap<AbilityId, CooldownEntry>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the ability has at least one charge available.
    pub fn is_ready(&self, ability: AbilityId) -> bool {
        self.entries.get(&ability).map_or(true, |e| e.charges > 0)
    }

    /// Charges currently available (`None` if the ability was never used).
    pub fn charges(&self, ability: AbilityId) -> Option<u8> {
        self.entries.get(&ability).map(|e| e.charges)
    }

    /// Ticks until a charge is available again (0 when ready).
    pub fn remaining(&self, ability: AbilityId, now: u64) -> u64 {
        match self.entries.get(&ability) {
            Some(e) if e.charges == 0 => e.next_charge_at.map_or(0, |at| at.saturating_sub(now)),
            _ => 0,
        }
    }

    /// Consume one charge. Abilities without a cooldown are not tracked.
    pub fn consume(&mut self, ability: AbilityId, max_charges: u8, recharge_ticks: u64, now: u64) {
        if recharge_ticks == 0 {
            return;
        }
        let max_charges = max_charges.max(1);
        let entry = self.entries.entry(ability).or_insert(CooldownEntry {
            max_charges,
            charges: max_charges,
            recharge_ticks,
            next_charge_at: None,
        });
        debug_assert!(entry.charges > 0, "consume() called on {:?} with no charges", ability);
        entry.charges = entry.charges.saturating_sub(1);
        if entry.next_charge_at.is_none() {
            entry.next_charge_at = Some(now + recharge_ticks);
        }
    }

    /// Restore charges whose recharge time has come.
    pub fn tick(&mut self, now: u64) {
        for entry in self.entries.values_mut() {
            while let Some(due) = entry.next_charge_at {
                if due > now {
                    break;
                }
                entry.charges = (entry.charges + 1).min(entry.max_charges);
                entry.next_charge_at = if entry.charges < entry.max_charges {
                    Some(due + entry.recharge_ticks)
                } else {
                    None
                };
            }
        }
    }

    /// Immediately restore every charge of an ability.
    pub fn reset(&mut self, ability: AbilityId) {
        self.entries.remove(&ability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_charge_cycle() {
        let mut cds = CooldownTracker::new();
        let id = AbilityId::Kick;
        assert!(cds.is_ready(id));

        cds.consume(id, 1, 100, 10);
        assert!(!cds.is_ready(id));
        assert_eq!(cds.remaining(id, 60), 50);

        cds.tick(109);
        assert!(!cds.is_ready(id));
        cds.tick(110);
        assert!(cds.is_ready(id));
        assert_eq!(cds.remaining(id, 110), 0);
    }

    #[test]
    fn test_multi_charge_recharges_one_at_a_time() {
        let mut cds = CooldownTracker::new();
        let id = AbilityId::Charge;

        cds.consume(id, 2, 50, 0);
        cds.consume(id, 2, 50, 5);
        assert_eq!(cds.charges(id), Some(0));

        cds.tick(50);
        assert_eq!(cds.charges(id), Some(1));
        // Second charge is scheduled from the first one's due time, not from the second use
        cds.tick(99);
        assert_eq!(cds.charges(id), Some(1));
        cds.tick(100);
        assert_eq!(cds.charges(id), Some(2));
    }

    #[test]
    fn test_no_cooldown_is_untracked() {
        let mut cds = CooldownTracker::new();
        cds.consume(AbilityId::Frostbolt, 1, 0, 0);
        assert!(cds.is_ready(AbilityId::Frostbolt));
        assert_eq!(cds.charges(AbilityId::Frostbolt), None);
    }

    #[test]
    fn test_reset_restores_charges() {
        let mut cds = CooldownTracker::new();
        cds.consume(AbilityId::Kick, 1, 100, 0);
        cds.reset(AbilityId::Kick);
        assert!(cds.is_ready(AbilityId::Kick));
    }
}
