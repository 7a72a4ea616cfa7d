//! JSON configuration parsing for headless mode
//!
//! Parses JSON match configurations and converts them to the engine's MatchConfig format.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::arena::match_config::{
    ArenaMap, CharacterClass, CombatantSetup, ControllerKind, Difficulty, MatchConfig,
};

/// Problems loading or interpreting a headless configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown class: '{0}'. Valid classes: Warrior, Mage, Rogue, Warlock")]
    UnknownClass(String),
    #[error("unknown map: '{0}'. Valid maps: OpenArena, PillaredArena")]
    UnknownMap(String),
    #[error("unknown difficulty: '{0}'. Valid difficulties: Easy, Normal, Hard")]
    UnknownDifficulty(String),
    #[error("max_duration_secs must be positive, got {0}")]
    InvalidDuration(f32),
    #[error("batch_size must be at least 1")]
    EmptyBatch,
}

/// Headless match configuration loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    /// First combatant's class name
    pub combatant1: String,
    /// Second combatant's class name
    pub combatant2: String,
    /// Arena map name (default: "PillaredArena")
    #[serde(default = "default_map")]
    pub map: String,
    /// Maximum match duration in seconds (default: 180)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic match reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Scripted controller difficulty for both sides (default: "Hard")
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    /// Custom output path for match log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Number of seeded matches to run instead of a single one
    #[serde(default)]
    pub batch_size: Option<usize>,
}

fn default_map() -> String {
    "PillaredArena".to_string()
}

fn default_max_duration() -> f32 {
    180.0
}

fn default_difficulty() -> String {
    "Hard".to_string()
}

impl HeadlessMatchConfig {
    /// A config with defaults for everything but the two classes.
    pub fn duel(combatant1: &str, combatant2: &str) -> Self {
        Self {
            combatant1: combatant1.to_string(),
            combatant2: combatant2.to_string(),
            map: default_map(),
            max_duration_secs: default_max_duration(),
            random_seed: None,
            difficulty: default_difficulty(),
            output_path: None,
            batch_size: None,
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: HeadlessMatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::parse_class(&self.combatant1)?;
        Self::parse_class(&self.combatant2)?;
        Self::parse_map(&self.map)?;
        Self::parse_difficulty(&self.difficulty)?;

        if !(self.max_duration_secs > 0.0) {
            return Err(ConfigError::InvalidDuration(self.max_duration_secs));
        }
        if self.batch_size == Some(0) {
            return Err(ConfigError::EmptyBatch);
        }
        Ok(())
    }

    fn parse_class(name: &str) -> Result<CharacterClass, ConfigError> {
        CharacterClass::from_name(name).ok_or_else(|| ConfigError::UnknownClass(name.to_string()))
    }

    fn parse_map(name: &str) -> Result<ArenaMap, ConfigError> {
        ArenaMap::from_name(name).ok_or_else(|| ConfigError::UnknownMap(name.to_string()))
    }

    fn parse_difficulty(name: &str) -> Result<Difficulty, ConfigError> {
        Difficulty::from_name(name).ok_or_else(|| ConfigError::UnknownDifficulty(name.to_string()))
    }

    /// Convert to the engine's MatchConfig format
    pub fn to_match_config(&self) -> Result<MatchConfig, ConfigError> {
        self.validate()?;
        let controller = ControllerKind::Scripted {
            difficulty: Self::parse_difficulty(&self.difficulty)?,
        };
        let setup = |class| CombatantSetup {
            class,
            controller,
            spawn: None,
        };
        Ok(MatchConfig {
            combatants: [
                setup(Self::parse_class(&self.combatant1)?),
                setup(Self::parse_class(&self.combatant2)?),
            ],
            map: Self::parse_map(&self.map)?,
            layout: None,
            max_duration_secs: self.max_duration_secs,
            seed: self.random_seed,
            hazards: Vec::new(),
        })
    }
}
