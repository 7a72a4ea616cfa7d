//! Data-Driven Content Configuration
//!
//! Classes and abilities are defined in `assets/config/content.ron` instead of
//! being hardcoded. The bundled file is compiled into the binary; a different
//! file can be loaded at runtime for balance work.
//!
//! ## Usage
//! ```ignore
//! let content = ArenaContent::bundled()?;
//! let frostbolt = content.ability(AbilityId::Frostbolt).unwrap();
//! println!("Frostbolt cast time: {}", frostbolt.cast_time_secs);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use bevy::log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::abilities::{AbilityDef, AbilityId, CustomBehavior, Effect, ResourceGrant};
use super::constants::MELEE_RANGE;
use super::match_config::CharacterClass;
use super::resources::{ResourcePoolDef, ResourceType};
use super::stats::BaseStats;

/// The reference content shipped with the crate.
pub const BUNDLED_CONTENT: &str = include_str!("../../assets/config/content.ron");

/// Errors raised while loading or validating content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse content: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("class {0:?} is not defined")]
    MissingClass(CharacterClass),
    #[error("class {class:?} references undefined ability {ability:?}")]
    UndefinedAbility {
        class: CharacterClass,
        ability: AbilityId,
    },
    #[error("ability {ability:?} is invalid: {reason}")]
    InvalidAbility { ability: AbilityId, reason: String },
}

fn default_range() -> f32 {
    MELEE_RANGE
}

/// Weapon swing profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoAttackDef {
    pub min_damage: f32,
    pub max_damage: f32,
    pub interval_secs: f32,
    #[serde(default = "default_range")]
    pub range: f32,
}

/// Resource gained per point of damage taken (rage-style).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamageTakenResource {
    pub kind: ResourceType,
    pub per_damage: f32,
}

/// Class template a unit is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub max_health: f32,
    #[serde(default)]
    pub resources: Vec<ResourcePoolDef>,
    #[serde(default)]
    pub stats: BaseStats,
    /// Units per second
    pub move_speed: f32,
    pub auto_attack: AutoAttackDef,
    #[serde(default)]
    pub swing_resource: Option<ResourceGrant>,
    #[serde(default)]
    pub damage_taken_resource: Option<DamageTakenResource>,
    /// Distance the scripted controller tries to fight from
    pub preferred_range: f32,
    #[serde(default)]
    pub starts_stealthed: bool,
    pub abilities: Vec<AbilityId>,
}

impl ClassDef {
    pub fn is_melee(&self) -> bool {
        self.preferred_range <= MELEE_RANGE
    }
}

/// All classes and abilities available to a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaContent {
    pub classes: BTreeMap<CharacterClass, ClassDef>,
    pub abilities: BTreeMap<AbilityId, AbilityDef>,
}

impl ArenaContent {
    /// Parse and validate content from RON text.
    pub fn from_ron(text: &str) -> Result<Self, ContentError> {
        let content: ArenaContent = ron::from_str(text)?;
        content.validate()?;
        Ok(content)
    }

    /// The content compiled into the crate.
    pub fn bundled() -> Result<Self, ContentError> {
        Self::from_ron(BUNDLED_CONTENT)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let content = Self::from_ron(&text)?;
        info!(
            "Loaded {} classes and {} abilities from {}",
            content.classes.len(),
            content.abilities.len(),
            path.display()
        );
        Ok(content)
    }

    pub fn class(&self, class: CharacterClass) -> Option<&ClassDef> {
        self.classes.get(&class)
    }

    pub fn ability(&self, ability: AbilityId) -> Option<&AbilityDef> {
        self.abilities.get(&ability)
    }

    /// Every class is defined, every equipped ability resolves and every
    /// ability is internally consistent.
    pub fn validate(&self) -> Result<(), ContentError> {
        for class in CharacterClass::all() {
            let def = self
                .classes
                .get(class)
                .ok_or(ContentError::MissingClass(*class))?;
            if let Some(ability) = def.abilities.iter().find(|a| !self.abilities.contains_key(a)) {
                return Err(ContentError::UndefinedAbility {
                    class: *class,
                    ability: *ability,
                });
            }
        }
        for (id, def) in &self.abilities {
            validate_ability(*id, def)?;
        }
        Ok(())
    }
}

fn validate_ability(id: AbilityId, def: &AbilityDef) -> Result<(), ContentError> {
    let invalid = |reason: &str| ContentError::InvalidAbility {
        ability: id,
        reason: reason.to_string(),
    };
    if def.range < def.min_range {
        return Err(invalid("range is smaller than min_range"));
    }
    if def.charges == 0 {
        return Err(invalid("charges must be at least 1"));
    }
    if def.channel.as_ref().is_some_and(|c| c.duration_secs <= 0.0) {
        return Err(invalid("channel duration must be positive"));
    }
    if def.channel.is_some() && def.cast_time_secs > 0.0 {
        return Err(invalid("an ability cannot both cast and channel"));
    }

    let mut problem = None;
    def.visit_effects(|effect| match effect {
        Effect::PeriodicDamage(aura) if !aura.is_periodic() => {
            problem = Some("periodic effect without a tick interval and tick payload");
        }
        Effect::Custom(CustomBehavior::ComboFinisher { .. })
            if def.cost_of(ResourceType::ComboPoints) <= 0.0 =>
        {
            problem = Some("combo finisher must cost combo points");
        }
        _ => {}
    });
    match problem {
        Some(reason) => Err(invalid(reason)),
        None => Ok(()),
    }
}
