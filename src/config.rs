//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Tunables for a [`GameRegistry`](crate::state::GameRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Events buffered per game. An observer further behind than this gets
    /// `SyncError::Lagged` and has to resync from a snapshot.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Upper bound on games held at once; unlimited when absent.
    #[serde(default)]
    pub max_games: Option<usize>,
}

fn default_event_capacity() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            max_games: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

impl EngineConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        info!(
            event_capacity = config.event_capacity,
            max_games = ?config.max_games,
            "Config loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be at least 1"));
        }
        if self.max_games == Some(0) {
            return Err(ConfigError::Invalid("max_games must be at least 1"));
        }
        Ok(())
    }
}
