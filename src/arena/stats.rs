//! Combat stats with stackable multiplicative modifiers.
//!
//! Each stat keeps its base value plus an ordered list of modifiers tagged
//! with the aura that owns them. The effective value is always recomputed from
//! the base, so applying and removing a modifier any number of times returns
//! the stat exactly to its original value.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::auras::AuraId;

/// Stats that auras can modify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatKind {
    Armor,
    MagicResist,
    /// Outgoing damage multiplier
    DamageDone,
    /// Outgoing healing multiplier
    HealingDone,
    /// Incoming damage multiplier
    DamageTaken,
    /// Incoming healing multiplier
    HealingTaken,
    /// Probability in [0, 1]
    CritChance,
    /// Cast speed multiplier (1.0 = normal)
    Haste,
    /// Movement speed multiplier (1.0 = normal)
    MoveSpeed,
}

impl StatKind {
    pub const COUNT: usize = 9;

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Base combat stats authored per class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    #[serde(default)]
    pub armor: f32,
    #[serde(default)]
    pub magic_resist: f32,
    #[serde(default)]
    pub crit_chance: f32,
    #[serde(default = "unit_multiplier")]
    pub haste: f32,
}

fn unit_multiplier() -> f32 {
    1.0
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            armor: 0.0,
            magic_resist: 0.0,
            crit_chance: 0.0,
            haste: 1.0,
        }
    }
}

/// A multiplicative modifier owned by an aura.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub stat: StatKind,
    pub multiplier: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct AppliedModifier {
    source: AuraId,
    stat: StatKind,
    multiplier: f32,
}

/// Live stat block for one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct StatBlock {
    base: [f32; StatKind::COUNT],
    current: [f32; StatKind::COUNT],
    modifiers: SmallVec<[AppliedModifier; 4]>,
}

impl StatBlock {
    pub fn new(base: &BaseStats) -> Self {
        let mut values = [1.0; StatKind::COUNT];
        values[StatKind::Armor.index()] = base.armor;
        values[StatKind::MagicResist.index()] = base.magic_resist;
        values[StatKind::CritChance.index()] = base.crit_chance.clamp(0.0, 1.0);
        values[StatKind::Haste.index()] = base.haste.max(0.01);
        Self {
            base: values,
            current: values,
            modifiers: SmallVec::new(),
        }
    }

    #[inline]
    pub fn get(&self, stat: StatKind) -> f32 {
        self.current[stat.index()]
    }

    pub fn base(&self, stat: StatKind) -> f32 {
        self.base[stat.index()]
    }

    pub fn add_modifier(&mut self, source: AuraId, modifier: StatModifier) {
        self.modifiers.push(AppliedModifier {
            source,
            stat: modifier.stat,
            multiplier: modifier.multiplier,
        });
        self.recompute(modifier.stat);
    }

    /// Remove every modifier owned by `source` and recompute the affected stats.
    pub fn remove_modifiers(&mut self, source: AuraId) {
        let mut touched: SmallVec<[StatKind; 4]> = SmallVec::new();
        self.modifiers.retain(|m| {
            if m.source == source {
                if !touched.contains(&m.stat) {
                    touched.push(m.stat);
                }
                false
            } else {
                true
            }
        });
        for stat in touched {
            self.recompute(stat);
        }
    }

    fn recompute(&mut self, stat: StatKind) {
        let value = self
            .modifiers
            .iter()
            .filter(|m| m.stat == stat)
            .fold(self.base[stat.index()], |acc, m| acc * m.multiplier);
        self.current[stat.index()] = match stat {
            StatKind::CritChance => value.clamp(0.0, 1.0),
            _ => value.max(0.0),
        };
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }
}
