//! Match configuration data structures
//!
//! Everything needed to build a [`Match`](super::combat_core::Match): the two
//! combatants and who controls them, the arena layout, the tick budget, the
//! RNG seed and any environmental hazards scheduled ahead of time.

use bevy::math::Vec3;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::constants::{secs_to_ticks, SPAWN_DISTANCE};
use super::hazards::ScheduledHazard;
use super::terrain::ArenaLayout;

/// Available character classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CharacterClass {
    Warrior,
    Mage,
    Rogue,
    Warlock,
}

impl CharacterClass {
    /// Get all available character classes
    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Warrior,
            CharacterClass::Mage,
            CharacterClass::Rogue,
            CharacterClass::Warlock,
        ]
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Mage => "Mage",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Warlock => "Warlock",
        }
    }

    /// Get a short description
    pub fn description(&self) -> &'static str {
        match self {
            CharacterClass::Warrior => "Sturdy melee fighter",
            CharacterClass::Mage => "Powerful spellcaster",
            CharacterClass::Rogue => "Swift shadow striker",
            CharacterClass::Warlock => "Shadow magic and curses",
        }
    }

    /// Parse a class name (case-insensitive).
    pub fn from_name(name: &str) -> Option<CharacterClass> {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Available arena maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArenaMap {
    OpenArena,
    #[default]
    PillaredArena,
}

impl ArenaMap {
    pub fn all() -> &'static [ArenaMap] {
        &[ArenaMap::OpenArena, ArenaMap::PillaredArena]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArenaMap::OpenArena => "OpenArena",
            ArenaMap::PillaredArena => "PillaredArena",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ArenaMap::OpenArena => "Round arena with no cover",
            ArenaMap::PillaredArena => "Round arena with four pillars for cover",
        }
    }

    pub fn from_name(name: &str) -> Option<ArenaMap> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn layout(&self) -> ArenaLayout {
        match self {
            ArenaMap::OpenArena => ArenaLayout::default(),
            ArenaMap::PillaredArena => ArenaLayout::pillared(),
        }
    }
}

/// Scripted controller difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    #[default]
    Hard,
}

impl Difficulty {
    /// Ticks between choosing an action and queuing it.
    pub fn reaction_delay_ticks(&self) -> u64 {
        match self {
            Difficulty::Easy => 12,
            Difficulty::Normal => 6,
            Difficulty::Hard => 0,
        }
    }

    pub fn from_name(name: &str) -> Option<Difficulty> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Who drives a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerKind {
    Scripted { difficulty: Difficulty },
    /// Commands pushed through an input handle
    Human,
    /// Never acts (training dummy)
    Idle,
}

impl Default for ControllerKind {
    fn default() -> Self {
        ControllerKind::Scripted {
            difficulty: Difficulty::default(),
        }
    }
}

/// One side of the duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSetup {
    pub class: CharacterClass,
    #[serde(default)]
    pub controller: ControllerKind,
    /// Spawn point (x, z); defaults to the slot's side of the arena
    #[serde(default)]
    pub spawn: Option<(f32, f32)>,
}

impl CombatantSetup {
    pub fn scripted(class: CharacterClass) -> Self {
        Self {
            class,
            controller: ControllerKind::default(),
            spawn: None,
        }
    }
}

/// The match configuration resource
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub combatants: [CombatantSetup; 2],
    #[serde(default)]
    pub map: ArenaMap,
    /// Overrides the map's layout when set
    #[serde(default)]
    pub layout: Option<ArenaLayout>,
    pub max_duration_secs: f32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub hazards: Vec<ScheduledHazard>,
}

impl MatchConfig {
    /// Scripted duel between two classes with the default settings.
    pub fn duel(first: CharacterClass, second: CharacterClass) -> Self {
        Self {
            combatants: [CombatantSetup::scripted(first), CombatantSetup::scripted(second)],
            map: ArenaMap::default(),
            layout: None,
            max_duration_secs: 180.0,
            seed: None,
            hazards: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tick_budget(&self) -> u64 {
        secs_to_ticks(self.max_duration_secs).max(1)
    }

    pub fn arena_layout(&self) -> ArenaLayout {
        self.layout.clone().unwrap_or_else(|| self.map.layout())
    }

    /// Spawn point of a slot (0 or 1).
    pub fn spawn_position(&self, slot: usize) -> Vec3 {
        match self.combatants.get(slot).and_then(|c| c.spawn) {
            Some((x, z)) => Vec3::new(x, 0.0, z),
            None if slot == 0 => Vec3::new(-SPAWN_DISTANCE, 0.0, 0.0),
            None => Vec3::new(SPAWN_DISTANCE, 0.0, 0.0),
        }
    }
}
