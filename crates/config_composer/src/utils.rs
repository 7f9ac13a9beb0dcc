//! Per-run capability bundles handed to hooks and customizations.
//!
//! Three flavours exist, one per stage:
//!
//! - [`BundlerChainUtils`] for the generic bundler-chain stage, adding a
//!   small set of engine plugin constructors
//! - [`ChainUtils`] for the engine-chain stage
//! - [`ConfigUtils`] for the compiled-tree stage, adding the merge strategy
//!   and the tree mutation helpers
//!
//! All of them are assembled fresh for every pipeline run.

use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::{BuildMode, UserConfig};
use crate::engine::{EngineLoader, EnginePrimitives, Plugin, PluginConstructor};
use crate::errors::{ConfigError, ConfigResult};
use crate::merge::MergeStrategy;
use crate::target::Target;
use crate::tree::ConfigTree;

#[cfg(test)]
#[path = "utils_tests.rs"]
mod tests;

/// A single item or a list of items.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    /// A single item.
    One(T),
    /// A list of items, kept in order.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens into a list.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::OneOrMany;
    ///
    /// assert_eq!(OneOrMany::<i32>::from(1).into_vec(), vec![1]);
    /// assert_eq!(OneOrMany::<i32>::from(vec![1, 2]).into_vec(), vec![1, 2]);
    /// ```
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(item: T) -> Self {
        OneOrMany::One(item)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(items: Vec<T>) -> Self {
        OneOrMany::Many(items)
    }
}

/// Capabilities available while hooks mutate the builder chain.
#[derive(Debug, Clone)]
pub struct ChainUtils {
    target: Target,
    mode: BuildMode,
    engine: Arc<EnginePrimitives>,
    html_plugin: PluginConstructor,
    compiled_root: PathBuf,
}

impl ChainUtils {
    /// Loads the engine primitives and the HTML plugin, then assembles the
    /// utils for `target`.
    ///
    /// # Errors
    /// Propagates `ConfigError::EngineLoadFailed` from the loader unchanged.
    pub async fn assemble(
        target: Target,
        config: &UserConfig,
        loader: &dyn EngineLoader,
    ) -> ConfigResult<Self> {
        debug!(%target, "Assembling chain utils");
        let engine = loader.load_engine().await?;
        let html_plugin = loader.load_html_plugin().await?;

        Ok(Self {
            target,
            mode: config.mode,
            engine: Arc::new(engine),
            html_plugin,
            compiled_root: config.output.compiled_dir.clone(),
        })
    }

    /// The build target of this run.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Display name derived from the target; empty for unmapped targets.
    pub fn name(&self) -> &'static str {
        self.target.display_name()
    }

    /// The configured build mode.
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    /// Build environment name, `"development"` or `"production"`.
    pub fn env(&self) -> &'static str {
        self.mode.as_str()
    }

    /// Whether this is a production build.
    pub fn is_prod(&self) -> bool {
        self.mode == BuildMode::Production
    }

    /// Whether this is a development build.
    pub fn is_dev(&self) -> bool {
        self.mode == BuildMode::Development
    }

    /// Whether the target runs on the server, see [`Target::is_server`].
    pub fn is_server(&self) -> bool {
        self.target.is_server()
    }

    /// Whether the target is a web worker.
    pub fn is_web_worker(&self) -> bool {
        self.target.is_web_worker()
    }

    /// Whether the target is a service worker.
    pub fn is_service_worker(&self) -> bool {
        self.target.is_service_worker()
    }

    /// Engine primitive constructors loaded for this run.
    pub fn engine(&self) -> &EnginePrimitives {
        &self.engine
    }

    /// The HTML plugin constructor found by plugin discovery.
    pub fn html_plugin(&self) -> &PluginConstructor {
        &self.html_plugin
    }

    /// Resolves the path of a precompiled asset package.
    pub fn compiled_path(&self, package: &str) -> PathBuf {
        self.compiled_root.join(package)
    }

    /// Root directory of precompiled asset packages.
    pub fn compiled_root(&self) -> &Path {
        &self.compiled_root
    }
}

/// Plugin constructors exposed to the bundler-chain stage.
#[derive(Debug, Clone)]
pub struct BundlerPrimitives {
    pub banner_plugin: PluginConstructor,
    pub define_plugin: PluginConstructor,
    pub ignore_plugin: PluginConstructor,
    pub provide_plugin: PluginConstructor,
    pub hot_module_replacement_plugin: PluginConstructor,
}

impl BundlerPrimitives {
    /// Picks the bundler subset out of the loaded engine.
    ///
    /// # Errors
    /// Returns `ConfigError::EngineLoadFailed` if the engine lacks one of the
    /// constructors.
    pub fn from_engine(engine: &EnginePrimitives) -> ConfigResult<Self> {
        let pick = |name: &str| {
            engine
                .constructor(name)
                .cloned()
                .ok_or_else(|| ConfigError::EngineLoadFailed {
                    component: name.to_string(),
                    reason: format!("engine {} does not provide {}", engine.version(), name),
                })
        };

        Ok(Self {
            banner_plugin: pick("BannerPlugin")?,
            define_plugin: pick("DefinePlugin")?,
            ignore_plugin: pick("IgnorePlugin")?,
            provide_plugin: pick("ProvidePlugin")?,
            hot_module_replacement_plugin: pick("HotModuleReplacementPlugin")?,
        })
    }
}

/// Capabilities available during the bundler-chain stage.
#[derive(Debug, Clone)]
pub struct BundlerChainUtils {
    chain: ChainUtils,
    bundler: BundlerPrimitives,
}

impl BundlerChainUtils {
    /// Extends `chain` with the bundler primitives of its engine.
    ///
    /// # Errors
    /// Returns `ConfigError::EngineLoadFailed` if the engine lacks a bundler
    /// primitive.
    pub fn new(chain: ChainUtils) -> ConfigResult<Self> {
        let bundler = BundlerPrimitives::from_engine(chain.engine())?;
        Ok(Self { chain, bundler })
    }

    /// Plugin constructors reserved for the bundler-chain stage.
    pub fn bundler(&self) -> &BundlerPrimitives {
        &self.bundler
    }
}

impl Deref for BundlerChainUtils {
    type Target = ChainUtils;

    fn deref(&self) -> &ChainUtils {
        &self.chain
    }
}

/// Capabilities available while hooks mutate the compiled tree.
///
/// # Examples
///
/// ```rust
/// use config_composer::{ConfigTree, ConfigUtils, Plugin};
/// use serde_json::json;
///
/// # fn example(utils: &ConfigUtils) {
/// let mut tree = ConfigTree::new();
/// utils.append_plugins(&mut tree, Plugin::new("ProgressPlugin", json!({})));
/// utils.prepend_plugins(&mut tree, vec![Plugin::new("DefinePlugin", json!({}))]);
/// assert_eq!(utils.remove_plugin(&mut tree, "ProgressPlugin"), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct ConfigUtils {
    chain: ChainUtils,
    merge: Arc<dyn MergeStrategy>,
}

impl ConfigUtils {
    /// Extends `chain` with the merge strategy used by [`ConfigUtils::merge_config`].
    pub fn new(chain: ChainUtils, merge: Arc<dyn MergeStrategy>) -> Self {
        Self { chain, merge }
    }

    /// Deep-merges `overlay` onto `base` with the configured strategy.
    pub fn merge_config(&self, base: Value, overlay: Value) -> Value {
        self.merge.merge(base, overlay)
    }

    /// The merge strategy applied to override fragments.
    pub fn merge_strategy(&self) -> &dyn MergeStrategy {
        self.merge.as_ref()
    }

    /// Inserts rules at the front of `module.rules`, keeping their relative
    /// order. A JSON array is treated as a list of rules.
    pub fn add_rules(&self, tree: &mut ConfigTree, rules: impl Into<OneOrMany<Value>>) {
        let rules = match rules.into() {
            OneOrMany::One(Value::Array(items)) => items,
            other => other.into_vec(),
        };
        tree.rules_mut().splice(0..0, rules);
    }

    /// Inserts plugins at the front of `plugins`, keeping their relative
    /// order.
    pub fn prepend_plugins(&self, tree: &mut ConfigTree, plugins: impl Into<OneOrMany<Plugin>>) {
        let plugins = plugins.into().into_vec().into_iter().map(Value::from);
        tree.plugins_mut().splice(0..0, plugins);
    }

    /// Appends plugins at the end of `plugins`.
    pub fn append_plugins(&self, tree: &mut ConfigTree, plugins: impl Into<OneOrMany<Plugin>>) {
        let plugins = plugins.into().into_vec().into_iter().map(Value::from);
        tree.plugins_mut().extend(plugins);
    }

    /// Removes every plugin tagged `name` and returns how many were removed.
    ///
    /// Absent plugin lists and missing matches are not errors. When the
    /// removed plugins differ from one another the tag is ambiguous; this is
    /// logged rather than resolved.
    pub fn remove_plugin(&self, tree: &mut ConfigTree, name: &str) -> usize {
        let Some(plugins) = tree.existing_plugins_mut() else {
            return 0;
        };

        let mut removed: Vec<Value> = Vec::new();
        plugins.retain(|plugin| {
            if Plugin::tag_of(plugin) == Some(name) {
                removed.push(plugin.clone());
                false
            } else {
                true
            }
        });

        if removed.windows(2).any(|pair| pair[0] != pair[1]) {
            warn!(
                plugin = name,
                count = removed.len(),
                "Removed structurally different plugins sharing one tag"
            );
        }
        removed.len()
    }
}

impl Deref for ConfigUtils {
    type Target = ChainUtils;

    fn deref(&self) -> &ChainUtils {
        &self.chain
    }
}

impl std::fmt::Debug for ConfigUtils {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigUtils")
            .field("chain", &self.chain)
            .field("merge", &self.merge.name())
            .finish()
    }
}
