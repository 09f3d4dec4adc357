// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
}

/// Returns the engine's configuration directory (`~/.config/actio` on Linux).
/// The directory is not created; a missing config file just means defaults.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Returns the path of the default `actio.toml`.
pub fn get_default_config_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_user_path(path: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(path).map_err(|e| PathError::Expansion {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
