//! Configuration pipeline error types.
//!
//! Domain-specific errors for engine loading, hook execution and
//! builder chain manipulation.

use thiserror::Error;

use crate::pipeline::{PipelineState, Stage};

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Error raised by a hook or a user customization callable.
///
/// Hooks are free to fail with any error type; the pipeline keeps the
/// original error reachable through [`std::error::Error::source`].
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration pipeline errors.
///
/// Every variant is fatal for the run that produced it. The pipeline never
/// retries and never rolls back mutations made before the failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load engine dependency '{component}': {reason}")]
    EngineLoadFailed { component: String, reason: String },

    #[error("Hook '{hook}' failed during {stage}: {source}")]
    HookFailed {
        stage: Stage,
        hook: String,
        #[source]
        source: HookError,
    },

    #[error("Customization #{index} failed during {stage}: {source}")]
    CustomizationFailed {
        stage: Stage,
        index: usize,
        #[source]
        source: HookError,
    },

    #[error("Unknown {collection} entry: {name}")]
    UnknownChainEntry { collection: String, name: String },

    #[error("Path '{path}' is reserved for ordered entries, use the rule or plugin operations")]
    ReservedPath { path: String },

    #[error("Invalid configuration path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid user configuration: {reason}")]
    InvalidUserConfig { reason: String },

    #[error("Pipeline run already finished in state {state:?}")]
    RunFinished { state: PipelineState },
}

impl ConfigError {
    /// Returns the pipeline stage the error was raised in, if it came from a
    /// hook or customization.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ConfigError::HookFailed { stage, .. } => Some(*stage),
            ConfigError::CustomizationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias for configuration pipeline operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
