//! Resource pools (mana, energy, rage, combo points).
//!
//! A unit owns one pool per resource type it uses. Pools regenerate every tick
//! and never exceed their capacity or drop below zero.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::constants::TICK_RATE;

/// Resource type for combatants.
/// Different classes use different resources with different mechanics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// Regenerates slowly, starts full.
    Mana,
    /// Regenerates rapidly, small capacity.
    Energy,
    /// Starts empty, built by swinging and taking damage, decays over time.
    Rage,
    /// Secondary resource built by builders and spent by finishers.
    ComboPoints,
}

impl ResourceType {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Mana => "Mana",
            ResourceType::Energy => "Energy",
            ResourceType::Rage => "Rage",
            ResourceType::ComboPoints => "Combo Points",
        }
    }
}

/// Class-defined pool description (content data).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourcePoolDef {
    pub kind: ResourceType,
    pub capacity: f32,
    /// Starting amount (defaults to full capacity)
    #[serde(default)]
    pub starting: Option<f32>,
    /// Regeneration per second (negative values decay toward zero)
    #[serde(default)]
    pub regen_per_sec: f32,
}

/// A single resource pool.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourcePool {
    pub kind: ResourceType,
    pub capacity: f32,
    pub current: f32,
    pub regen_per_sec: f32,
}

impl ResourcePool {
    pub fn from_def(def: &ResourcePoolDef) -> Self {
        let capacity = def.capacity.max(0.0);
        Self {
            kind: def.kind,
            capacity,
            current: def.starting.unwrap_or(capacity).clamp(0.0, capacity),
            regen_per_sec: def.regen_per_sec,
        }
    }

    /// Add up to `amount`, returning how much was actually gained.
    pub fn gain(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount).clamp(0.0, self.capacity);
        self.current - before
    }

    /// Advance regeneration by one tick.
    pub fn tick(&mut self) {
        if self.regen_per_sec != 0.0 {
            self.gain(self.regen_per_sec / TICK_RATE as f32);
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.capacity > 0.0 {
            self.current / self.capacity
        } else {
            0.0
        }
    }
}

/// All resource pools belonging to one unit.
#[derive(Clone, Debug, Default)]
pub struct ResourcePools {
    pools: SmallVec<[ResourcePool; 2]>,
}

impl ResourcePools {
    pub fn from_defs(defs: &[ResourcePoolDef]) -> Self {
        Self {
            pools: defs.iter().map(ResourcePool::from_def).collect(),
        }
    }

    pub fn get(&self, kind: ResourceType) -> Option<&ResourcePool> {
        self.pools.iter().find(|p| p.kind == kind)
    }

    pub fn get_mut(&mut self, kind: ResourceType) -> Option<&mut ResourcePool> {
        self.pools.iter_mut().find(|p| p.kind == kind)
    }

    /// Current amount of a resource (zero if the unit has no such pool).
    pub fn current(&self, kind: ResourceType) -> f32 {
        self.get(kind).map_or(0.0, |p| p.current)
    }

    pub fn can_afford(&self, kind: ResourceType, amount: f32) -> bool {
        amount <= 0.0 || self.current(kind) >= amount
    }

    /// Spend `amount`. Returns false (and spends nothing) if the pool is missing or short.
    pub fn spend(&mut self, kind: ResourceType, amount: f32) -> bool {
        if amount <= 0.0 {
            return true;
        }
        match self.get_mut(kind) {
            Some(pool) if pool.current >= amount => {
                pool.current -= amount;
                true
            }
            _ => false,
        }
    }

    /// Drain a pool entirely, returning the amount removed.
    pub fn drain(&mut self, kind: ResourceType) -> f32 {
        match self.get_mut(kind) {
            Some(pool) => std::mem::replace(&mut pool.current, 0.0),
            None => 0.0,
        }
    }

    /// Gain into a pool, returning the amount actually added (zero if missing).
    pub fn gain(&mut self, kind: ResourceType, amount: f32) -> f32 {
        self.get_mut(kind).map_or(0.0, |p| p.gain(amount))
    }

    pub fn tick(&mut self) {
        for pool in self.pools.iter_mut() {
            pool.tick();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourcePool> {
        self.pools.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mana(capacity: f32, starting: f32, regen: f32) -> ResourcePoolDef {
        ResourcePoolDef {
            kind: ResourceType::Mana,
            capacity,
            starting: Some(starting),
            regen_per_sec: regen,
        }
    }

    #[test]
    fn test_regen_caps_at_capacity() {
        let mut pools = ResourcePools::from_defs(&[mana(100.0, 90.0, 20.0)]);
        for _ in 0..200 {
            pools.tick();
            assert!(pools.current(ResourceType::Mana) <= 100.0);
        }
        assert_eq!(pools.current(ResourceType::Mana), 100.0);
    }

    #[test]
    fn test_decay_floors_at_zero() {
        let mut pools = ResourcePools::from_defs(&[ResourcePoolDef {
            kind: ResourceType::Rage,
            capacity: 100.0,
            starting: Some(1.0),
            regen_per_sec: -10.0,
        }]);
        for _ in 0..40 {
            pools.tick();
        }
        assert_eq!(pools.current(ResourceType::Rage), 0.0);
    }

    #[test]
    fn test_spend_fails_when_short() {
        let mut pools = ResourcePools::from_defs(&[mana(100.0, 30.0, 0.0)]);
        assert!(!pools.spend(ResourceType::Mana, 40.0));
        assert_eq!(pools.current(ResourceType::Mana), 30.0);
        assert!(pools.spend(ResourceType::Mana, 30.0));
        assert_eq!(pools.current(ResourceType::Mana), 0.0);
    }

    #[test]
    fn test_missing_pool_cannot_pay() {
        let mut pools = ResourcePools::from_defs(&[mana(100.0, 100.0, 0.0)]);
        assert!(!pools.can_afford(ResourceType::Energy, 10.0));
        assert!(pools.can_afford(ResourceType::Energy, 0.0));
        assert!(!pools.spend(ResourceType::Energy, 10.0));
    }

    #[test]
    fn test_starting_defaults_to_full() {
        let pool = ResourcePool::from_def(&ResourcePoolDef {
            kind: ResourceType::Energy,
            capacity: 100.0,
            starting: None,
            regen_per_sec: 10.0,
        });
        assert_eq!(pool.current, 100.0);
    }
}
