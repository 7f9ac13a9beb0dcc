//! Bundling engine boundary.
//!
//! The bundling engine itself is an external collaborator. This module only
//! models what the pipeline needs from it: tagged plugin values, the named
//! plugin constructors the engine exposes, and an asynchronous loader that
//! makes those primitives available to a pipeline run.
//!
//! Plugins carry their identity explicitly in [`Plugin::name`]. Removal from a
//! compiled tree matches on that tag, so two plugins built by the same
//! constructor are indistinguishable to removal.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::errors::ConfigResult;

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;

/// Name of the HTML plugin obtained through plugin discovery.
pub const HTML_PLUGIN: &str = "HtmlWebpackPlugin";

/// Plugin constructor names exposed by every engine loaded through
/// [`BuiltinEngineLoader`].
pub const BUILTIN_PLUGINS: [&str; 8] = [
    "BannerPlugin",
    "DefinePlugin",
    "IgnorePlugin",
    "ProvidePlugin",
    "HotModuleReplacementPlugin",
    "ProgressPlugin",
    "SourceMapDevToolPlugin",
    "EnvironmentPlugin",
];

/// An engine-native plugin value.
///
/// # Examples
///
/// ```rust
/// use config_composer::Plugin;
/// use serde_json::json;
///
/// let plugin = Plugin::new("DefinePlugin", json!({ "DEBUG": "false" }));
/// assert_eq!(plugin.name, "DefinePlugin");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plugin {
    /// Identity tag, normally the name of the constructor that built it.
    pub name: String,

    /// Options handed to the constructor.
    #[serde(default)]
    pub options: Value,
}

impl Plugin {
    /// Creates a plugin tagged `name` with the given constructor options.
    pub fn new(name: impl Into<String>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }

    /// Serialized form stored in a configuration tree.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "options": self.options,
        })
    }

    /// Reads the identity tag of a plugin entry stored in a tree.
    pub fn tag_of(entry: &Value) -> Option<&str> {
        entry.get("name").and_then(Value::as_str)
    }
}

impl From<Plugin> for Value {
    fn from(plugin: Plugin) -> Self {
        plugin.to_value()
    }
}

/// A named engine constructor producing tagged [`Plugin`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConstructor {
    name: String,
}

impl PluginConstructor {
    /// Wraps the engine constructor called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The constructor name, used as the tag of every plugin it creates.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builds a plugin tagged with this constructor's name.
    pub fn create(&self, options: Value) -> Plugin {
        Plugin::new(self.name.clone(), options)
    }
}

/// Primitive constructors of a loaded bundling engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePrimitives {
    version: String,
    constructors: BTreeMap<String, PluginConstructor>,
}

impl EnginePrimitives {
    /// Creates an empty primitive set for engine `version`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::{EnginePrimitives, PluginConstructor};
    ///
    /// let engine = EnginePrimitives::new("5")
    ///     .with_constructor(PluginConstructor::new("BannerPlugin"));
    ///
    /// assert_eq!(engine.version(), "5");
    /// assert_eq!(engine.constructor_names().collect::<Vec<_>>(), vec!["BannerPlugin"]);
    /// ```
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            constructors: BTreeMap::new(),
        }
    }

    /// Adds a constructor, replacing any constructor of the same name.
    pub fn with_constructor(mut self, constructor: PluginConstructor) -> Self {
        self.constructors
            .insert(constructor.name().to_string(), constructor);
        self
    }

    /// The engine version reported by the loader.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Looks up a constructor by name.
    pub fn constructor(&self, name: &str) -> Option<&PluginConstructor> {
        self.constructors.get(name)
    }

    /// Constructor names in lexical order.
    pub fn constructor_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

/// Loads engine primitives for a pipeline run.
///
/// Both methods are called once per run. Implementations must not rely on
/// results being cached across runs.
///
/// # Examples
///
/// ```rust
/// use config_composer::{BuiltinEngineLoader, EngineLoader};
///
/// # async fn example() -> config_composer::ConfigResult<()> {
/// let loader = BuiltinEngineLoader::default();
/// let engine = loader.load_engine().await?;
/// assert!(engine.constructor("DefinePlugin").is_some());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Loads the engine's primitive module.
    ///
    /// # Errors
    /// Returns `ConfigError::EngineLoadFailed` if the engine cannot be loaded.
    async fn load_engine(&self) -> ConfigResult<EnginePrimitives>;

    /// Loads the HTML plugin through the plugin-discovery helper.
    ///
    /// # Errors
    /// Returns `ConfigError::EngineLoadFailed` if discovery fails.
    async fn load_html_plugin(&self) -> ConfigResult<PluginConstructor>;
}

/// Engine loader exposing the standard constructor set.
#[derive(Debug, Clone)]
pub struct BuiltinEngineLoader {
    version: String,
}

impl BuiltinEngineLoader {
    /// Creates a loader reporting engine `version`. The default is `"5"`.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }
}

impl Default for BuiltinEngineLoader {
    fn default() -> Self {
        Self::new("5")
    }
}

#[async_trait]
impl EngineLoader for BuiltinEngineLoader {
    async fn load_engine(&self) -> ConfigResult<EnginePrimitives> {
        debug!(version = %self.version, "Loading builtin engine primitives");
        Ok(BUILTIN_PLUGINS
            .iter()
            .fold(EnginePrimitives::new(self.version.clone()), |engine, name| {
                engine.with_constructor(PluginConstructor::new(*name))
            }))
    }

    async fn load_html_plugin(&self) -> ConfigResult<PluginConstructor> {
        Ok(PluginConstructor::new(HTML_PLUGIN))
    }
}
