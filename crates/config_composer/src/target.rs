//! Build targets.
//!
//! A [`Target`] identifies the execution environment a configuration is
//! generated for. It drives the display name and the flags exposed through
//! the chain utilities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;

/// Execution environment a configuration is generated for.
///
/// # Examples
///
/// ```rust
/// use config_composer::Target;
///
/// let target: Target = "node".parse()?;
/// assert_eq!(target, Target::Node);
/// assert_eq!(target.display_name(), "server");
/// # Ok::<(), config_composer::ConfigError>(())
/// ```
///
/// # Serialization
///
/// Serializes to/from kebab-case strings: "web", "node", "web-worker", ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    /// Browser client bundle
    Web,

    /// Server-side bundle
    Node,

    /// Dedicated web worker bundle
    WebWorker,

    /// Service worker bundle
    ServiceWorker,

    /// Electron main process
    ElectronMain,

    /// Electron renderer process
    ElectronRenderer,
}

impl Target {
    /// Every known target, in declaration order.
    pub const ALL: [Target; 6] = [
        Target::Web,
        Target::Node,
        Target::WebWorker,
        Target::ServiceWorker,
        Target::ElectronMain,
        Target::ElectronRenderer,
    ];

    /// Kebab-case identifier of the target.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Node => "node",
            Self::WebWorker => "web-worker",
            Self::ServiceWorker => "service-worker",
            Self::ElectronMain => "electron-main",
            Self::ElectronRenderer => "electron-renderer",
        }
    }

    /// Display name used for the compiled configuration.
    ///
    /// Targets without a mapping yield an empty string rather than an error.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Web => "client",
            Self::Node => "server",
            Self::WebWorker => "web-worker",
            Self::ServiceWorker => "service-worker",
            Self::ElectronMain | Self::ElectronRenderer => "",
        }
    }

    /// Whether the bundle runs on the server (`node`).
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Node)
    }

    /// Whether the bundle runs in a web worker.
    pub fn is_web_worker(&self) -> bool {
        matches!(self, Self::WebWorker)
    }

    /// Whether the bundle runs in a service worker.
    pub fn is_service_worker(&self) -> bool {
        matches!(self, Self::ServiceWorker)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::InvalidUserConfig {
                reason: format!(
                    "Unknown target '{}'. Expected one of: {}",
                    s,
                    Target::ALL
                        .iter()
                        .map(Target::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}
