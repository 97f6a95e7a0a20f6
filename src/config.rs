//! Parser configuration.
//!
//! Capacity limits are plain values handed to the core when a [`Sheet`] is
//! built. They can be read from YAML:
//!
//! ```yaml
//! max-voices: 4
//! pool-capacity: 512
//! ```

use crate::arena::MAX_CAPACITY;
use crate::error::AbcError;
use crate::sheet::Sheet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_VOICES: usize = 4;
pub const DEFAULT_POOL_CAPACITY: usize = 512;

/// Identifier given to the voice created for music that precedes any `V:` field.
pub const DEFAULT_VOICE_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Number of voice slots (one arena each).
    pub max_voices: usize,
    /// Events per arena.
    pub pool_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_voices: DEFAULT_MAX_VOICES,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl ParserConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, AbcError> {
        let config: ParserConfig = serde_yaml::from_str(content)?;
        config.validate()
    }

    pub fn load(path: &Path) -> Result<Self, AbcError> {
        let content = fs::read_to_string(path)?;
        log::debug!("Loaded configuration from {:?}", path);
        Self::from_yaml_str(&content)
    }

    fn validate(self) -> Result<Self, AbcError> {
        if self.max_voices == 0 {
            return Err(AbcError::Config("max-voices must be at least 1".to_string()));
        }
        if self.pool_capacity == 0 || self.pool_capacity > MAX_CAPACITY {
            return Err(AbcError::Config(format!(
                "pool-capacity must be between 1 and {}",
                MAX_CAPACITY
            )));
        }
        Ok(self)
    }

    /// Allocate a sheet with the configured arenas.
    pub fn build_sheet(&self) -> Sheet {
        Sheet::new(self.max_voices, self.pool_capacity)
    }
}
