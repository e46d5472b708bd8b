//! Locating and reading `config.toml`.
//!
//! An explicit `--config` path must exist. Otherwise the first existing file
//! among the working-directory and platform locations wins, and a missing
//! file everywhere means the built-in defaults.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use quiver::{QuiverError, config::AppConfig};

/// Relative to the working directory.
const LOCAL_CONFIG: &str = "quiver/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot parse configuration: {0}")]
    Parse(String),

    #[error("configuration file `{}` does not exist", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl From<ConfigError> for QuiverError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Loads the configuration for one run.
///
/// Looks at `explicit_path`, then `quiver/config.toml`, then `config.toml`
/// in the platform config directory, and falls back to
/// [`AppConfig::default`].
///
/// # Errors
///
/// Returns [`QuiverError::Config`] if the explicit file is missing, or if the
/// chosen file fails to parse or validate.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, QuiverError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()).into());
        }
        return read_config(path, "explicit");
    }

    for (origin, candidate) in search_paths() {
        if candidate.exists() {
            return read_config(&candidate, origin);
        }
        debug!(origin, path:% = candidate.display(); "No configuration file here");
    }

    debug!("Using default configuration");
    Ok(AppConfig::default())
}

/// Implicit locations, in priority order.
fn search_paths() -> Vec<(&'static str, PathBuf)> {
    let mut paths = vec![("local", PathBuf::from(LOCAL_CONFIG))];
    match ProjectDirs::from("com", "quiver", "quiver") {
        Some(dirs) => paths.push(("platform", dirs.config_dir().join("config.toml"))),
        None => debug!("Platform config directory unavailable"),
    }
    paths
}

fn read_config(path: &Path, origin: &str) -> Result<AppConfig, QuiverError> {
    info!(origin, path:% = path.display(); "Reading configuration");
    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;
    config.validate().map_err(ConfigError::Validation)?;
    Ok(config)
}
