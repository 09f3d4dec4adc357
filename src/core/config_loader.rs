// src/core/config_loader.rs

//! # Config Loader
//!
//! Loads the engine configuration from `actio.toml`. Every key is optional; a
//! missing file yields the defaults.
//!
//! ```toml
//! default_strategy = "members"
//!
//! [typo]
//! enabled = true
//! threshold = 0.4
//! ```

use crate::{
    constants::{DEFAULT_STRATEGY, DEFAULT_TYPO_THRESHOLD, TYPO_REJECTION_CEILING},
    core::paths::{self, PathError},
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Typo threshold must lie in (0, {ceiling}], got {threshold}.")]
    ThresholdOutOfRange { threshold: f64, ceiling: f64 },
    #[error("'default_strategy' must not be empty.")]
    EmptyStrategy,
    #[error(transparent)]
    Path(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypoConfig {
    pub enabled: bool,
    /// Mistyped targets closer than this are silently corrected.
    pub threshold: f64,
}

impl Default for TypoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_TYPO_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Strategy tried first for actions that do not choose one.
    pub default_strategy: String,
    pub typo: TypoConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_strategy: DEFAULT_STRATEGY.to_string(),
            typo: TypoConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_strategy.trim().is_empty() {
            return Err(ConfigError::EmptyStrategy);
        }
        let threshold = self.typo.threshold;
        if !(threshold > 0.0 && threshold <= TYPO_REJECTION_CEILING) {
            return Err(ConfigError::ThresholdOutOfRange {
                threshold,
                ceiling: TYPO_REJECTION_CEILING,
            });
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Loads the configuration at `path`. A file that does not exist yields defaults.
pub fn load(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        log::debug!("No config file at '{}', using defaults", path.display());
        return Ok(EngineConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_toml_str(&content, path)?;
    log::debug!("Loaded config from '{}': {:?}", path.display(), config);
    Ok(config)
}

/// Loads from an explicit, user-supplied path (`~` and `$VARS` expanded), or
/// from the default location when none is given.
pub fn load_from(explicit: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let path = match explicit {
        Some(raw) => paths::expand_user_path(raw)?,
        None => paths::get_default_config_path()?,
    };
    load(&path)
}
