//! Configuration file loading for the config-composer CLI.
//!
//! The user configuration is read from a TOML file, or from a JSON file when
//! the file name ends in `.json`. When no path is given the CLI looks for
//! [`DEFAULT_CONFIG_FILENAME`] in the current directory and falls back to the
//! built-in defaults if that file does not exist.

use std::{
    fs,
    path::{Path, PathBuf},
};

use config_composer::UserConfigFile;
use tracing::{debug, info};

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "composer.toml";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Format of a configuration file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON regardless of case; anything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Loads a user configuration file.
///
/// # Errors
///
/// - `Error::Config` if the file does not exist
/// - `Error::LoadFile` if the file cannot be read
/// - `Error::ParseTomlFile` / `Error::ParseJsonFile` if the content does not
///   match the configuration schema
///
/// # Example
///
/// ```rust,no_run
/// use std::path::Path;
/// use config_composer_cli::config::load_config;
///
/// let config = load_config(Path::new("./composer.toml"))?;
/// println!("mode: {}", config.mode);
/// # Ok::<(), config_composer_cli::errors::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<UserConfigFile, Error> {
    debug!("Loading configuration from {:?}", path);

    if !path.exists() {
        return Err(Error::Config(format!(
            "Configuration file not found: {:?}",
            path
        )));
    }

    let content = fs::read_to_string(path).map_err(Error::LoadFile)?;

    let config = match ConfigFormat::from_path(path) {
        ConfigFormat::Toml => toml::from_str(&content).map_err(Error::ParseTomlFile)?,
        ConfigFormat::Json => serde_json::from_str(&content).map_err(Error::ParseJsonFile)?,
    };

    info!("Configuration loaded from {:?}", path);
    Ok(config)
}

/// Loads the configuration from `config_path`, or from the default location.
///
/// An explicitly named file must exist. A missing default file yields the
/// built-in defaults.
pub fn resolve_config(config_path: Option<&str>) -> Result<UserConfigFile, Error> {
    let path = get_config_path(config_path);
    if config_path.is_none() && !path.exists() {
        debug!(
            "No configuration file at {:?}, using built-in defaults",
            path
        );
        return Ok(UserConfigFile::default());
    }
    load_config(&path)
}

/// Resolves the path to the configuration file.
///
/// Returns `config_path` when given, otherwise `./composer.toml` in the
/// current directory.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
