//! Spell school lockouts from interrupts.

use super::abilities::SpellSchool;

/// Per-school lockout expiry ticks for one unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchoolLockouts {
    until: [u64; SpellSchool::ALL.len()],
}

impl SchoolLockouts {
    /// Lock a school until `until`. The physical school is never locked and an
    /// existing longer lockout is kept.
    pub fn lock(&mut self, school: SpellSchool, until: u64) -> bool {
        if school.is_physical() {
            return false;
        }
        let slot = &mut self.until[school.index()];
        *slot = (*slot).max(until);
        true
    }

    pub fn is_locked(&self, school: SpellSchool, now: u64) -> bool {
        now < self.until[school.index()]
    }

    pub fn remaining(&self, school: SpellSchool, now: u64) -> u64 {
        self.until[school.index()].saturating_sub(now)
    }

    /// Clear lockouts that have run out.
    pub fn tick(&mut self, now: u64) {
        for until in self.until.iter_mut() {
            if *until <= now {
                *until = 0;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
