//! Build context: user configuration and registered hooks.
//!
//! A [`BuildContext`] is constructed explicitly for one build invocation and
//! shared read-only by every pipeline run of that invocation. Hooks are
//! registered through [`BuildContext::hooks_mut`] before any run starts; the
//! pipeline itself never mutates the context.
//!
//! # Examples
//!
//! ```
//! use config_composer::{BuildContext, BuildMode, UserConfig};
//!
//! let config = UserConfig {
//!     mode: BuildMode::Production,
//!     ..UserConfig::default()
//! };
//! let mut context = BuildContext::new(config);
//! context
//!     .hooks_mut()
//!     .modify_config
//!     .tap("noop", |tree, _utils| Ok(tree));
//!
//! assert_eq!(context.config().mode, BuildMode::Production);
//! assert_eq!(context.hooks().modify_config.len(), 1);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::chain::BuilderChain;
use crate::engine::{BuiltinEngineLoader, EngineLoader};
use crate::errors::ConfigError;
use crate::hooks::{Customizer, HookRegistry};
use crate::merge::{ArrayMergePolicy, ChainedConfig, DeepMerge, MergeStrategy};
use crate::pipeline::Stage;
use crate::tree::ConfigTree;
use crate::utils::{BundlerChainUtils, ChainUtils, ConfigUtils};

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// Default directory holding precompiled asset packages.
pub const DEFAULT_COMPILED_DIR: &str = "compiled";

/// Build mode selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Unminified build with development tooling.
    #[default]
    Development,
    /// Optimized build.
    Production,
}

impl BuildMode {
    /// Environment name, as exposed through `process.env.NODE_ENV`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::InvalidUserConfig {
                reason: format!(
                    "Unknown mode '{}'. Expected 'development' or 'production'",
                    other
                ),
            }),
        }
    }
}

/// Development server options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    /// Enables hot module replacement for web builds.
    pub hmr: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { hmr: true }
    }
}

/// Output options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root directory of precompiled asset packages.
    pub compiled_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compiled_dir: PathBuf::from(DEFAULT_COMPILED_DIR),
        }
    }
}

/// User customizations, applied after the corresponding hook registry.
#[derive(Clone, Default)]
pub struct ToolsConfig {
    /// Applied after the bundler-chain hooks.
    pub bundler_chain: Vec<Customizer<BuilderChain, BundlerChainUtils>>,

    /// Applied after the engine-chain hooks.
    pub chain: Vec<Customizer<BuilderChain, ChainUtils>>,

    /// Override list merged last, onto the hooked tree.
    pub config: Vec<ChainedConfig>,

    /// Array policy of the default merge strategy.
    pub merge_arrays: ArrayMergePolicy,
}

impl fmt::Debug for ToolsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolsConfig")
            .field("bundler_chain", &self.bundler_chain.len())
            .field("chain", &self.chain.len())
            .field("config", &self.config)
            .field("merge_arrays", &self.merge_arrays)
            .finish()
    }
}

/// Active user configuration. Read-only to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct UserConfig {
    pub mode: BuildMode,
    pub dev: DevConfig,
    pub output: OutputConfig,
    pub tools: ToolsConfig,
}

/// Serializable subset of [`UserConfig`], as stored in configuration files.
///
/// # TOML Format
///
/// ```toml
/// mode = "production"
///
/// [dev]
/// hmr = false
///
/// [tools]
/// merge_arrays = "concat"
///
/// [[tools.config]]
/// devtool = "source-map"
/// ```
///
/// `tools.config` accepts a single table or an array of tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfigFile {
    pub mode: BuildMode,
    pub dev: DevConfig,
    pub output: OutputConfig,
    pub tools: ToolsFile,
}

/// Serializable part of the `tools` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsFile {
    #[serde(deserialize_with = "one_or_many")]
    pub config: Vec<Value>,
    pub merge_arrays: ArrayMergePolicy,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}

impl From<UserConfigFile> for UserConfig {
    fn from(file: UserConfigFile) -> Self {
        Self {
            mode: file.mode,
            dev: file.dev,
            output: file.output,
            tools: ToolsConfig {
                config: file
                    .tools
                    .config
                    .into_iter()
                    .map(ChainedConfig::Fragment)
                    .collect(),
                merge_arrays: file.tools.merge_arrays,
                ..ToolsConfig::default()
            },
        }
    }
}

/// Registered hook collections, one per extension point.
#[derive(Debug, Clone)]
pub struct Hooks {
    pub modify_bundler_chain: HookRegistry<BuilderChain, BundlerChainUtils>,
    pub modify_chain: HookRegistry<BuilderChain, ChainUtils>,
    pub modify_config: HookRegistry<ConfigTree, ConfigUtils>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            modify_bundler_chain: HookRegistry::new(Stage::BundlerChain),
            modify_chain: HookRegistry::new(Stage::EngineChain),
            modify_config: HookRegistry::new(Stage::EngineConfig),
        }
    }
}

/// State shared by the pipeline runs of one build invocation.
#[derive(Clone)]
pub struct BuildContext {
    config: UserConfig,
    hooks: Hooks,
    engine_loader: Arc<dyn EngineLoader>,
    merge_strategy: Arc<dyn MergeStrategy>,
}

impl BuildContext {
    /// Creates a context with no hooks, the builtin engine loader and the
    /// default merge strategy for the configured array policy.
    pub fn new(config: UserConfig) -> Self {
        let merge_strategy = Arc::new(DeepMerge::new(config.tools.merge_arrays));
        Self {
            config,
            hooks: Hooks::default(),
            engine_loader: Arc::new(BuiltinEngineLoader::default()),
            merge_strategy,
        }
    }

    /// Replaces the engine loader.
    pub fn with_engine_loader(mut self, loader: impl EngineLoader + 'static) -> Self {
        self.engine_loader = Arc::new(loader);
        self
    }

    /// Replaces the merge strategy.
    pub fn with_merge_strategy(mut self, strategy: impl MergeStrategy + 'static) -> Self {
        self.merge_strategy = Arc::new(strategy);
        self
    }

    /// The user configuration shared by every run.
    pub fn config(&self) -> &UserConfig {
        &self.config
    }

    /// The registered hooks of all three stages.
    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Registration access. Only used while setting up the invocation.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// The loader each run uses to obtain engine primitives.
    pub fn engine_loader(&self) -> &dyn EngineLoader {
        self.engine_loader.as_ref()
    }

    /// The strategy used to merge override fragments.
    pub fn merge_strategy(&self) -> Arc<dyn MergeStrategy> {
        Arc::clone(&self.merge_strategy)
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("merge_strategy", &self.merge_strategy.name())
            .finish()
    }
}
