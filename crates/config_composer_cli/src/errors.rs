use std::io;

use config_composer::ConfigError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the config-composer CLI.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error occurred while locating or interpreting the
    /// configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to load a file from the filesystem.
    #[error("Failed to load file.")]
    LoadFile(#[source] io::Error),

    /// The TOML configuration file has invalid syntax or structure.
    #[error("Failed to parse TOML configuration file.")]
    ParseTomlFile(#[source] toml::de::Error),

    /// The JSON configuration file has invalid syntax or structure.
    #[error("Failed to parse JSON configuration file.")]
    ParseJsonFile(#[source] serde_json::Error),

    /// The configuration pipeline failed for one of the targets.
    #[error("Configuration pipeline failed: {0}")]
    Pipeline(#[from] ConfigError),

    /// The composed configuration could not be serialized.
    #[error("Failed to serialize the composed configuration.")]
    Serialize(#[source] serde_json::Error),

    /// The composed configuration could not be written.
    #[error("Failed to write output.")]
    WriteOutput(#[source] io::Error),
}
