// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config path: `Activity.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Activity.toml")
}

/// Read and deserialize a config file. No semantic checks; see
/// [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading activity config");
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Read, deserialize and validate a config file.
///
/// Missing optional fields take their serde defaults. Validation covers the
/// engine section, player and activity id uniqueness, and every activity's
/// time fields and templates.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let config = ConfigFile::try_from(load_from_path(path)?)?;
    info!(
        path = %path.display(),
        players = config.player.len(),
        activities = config.activity.len(),
        "activity config loaded"
    );
    Ok(config)
}
