use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    schema::RaglineConfig,
};

pub const CONFIG_FILE_NAME: &str = "ragline.toml";

/// Per-user config directory (`~/.config/ragline` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ragline").map(|d| d.config_dir().to_path_buf())
}

/// Parse a TOML config file. Missing sections fall back to defaults.
pub fn load_config(path: &Path) -> Result<RaglineConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: RaglineConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "loaded config");
    Ok(config)
}

/// Locate `ragline.toml`, first in `cwd`, then in the user config directory.
pub fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let user = config_dir()?.join(CONFIG_FILE_NAME);
    user.is_file().then_some(user)
}

/// Load the first config file found by [`find_config_file`], or defaults.
pub fn discover_and_load() -> Result<RaglineConfig> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match find_config_file(&cwd) {
        Some(path) => load_config(&path),
        None => {
            debug!("no config file found, using defaults");
            Ok(RaglineConfig::default())
        },
    }
}
