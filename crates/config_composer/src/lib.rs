//! Bundler configuration composition pipeline.
//!
//! Produces the final configuration tree a bundling engine consumes, for one
//! build target at a time. Each run goes through three extension points:
//!
//! 1. **Bundler chain**: hooks mutate a fresh [`BuilderChain`] using
//!    [`BundlerChainUtils`]
//! 2. **Engine chain**: hooks mutate the same chain using [`ChainUtils`]
//! 3. **Engine config**: the chain is compiled into a [`ConfigTree`], hooks
//!    transform it using [`ConfigUtils`], and the user overrides are merged
//!    last
//!
//! Hooks are registered on a [`BuildContext`] before any run starts.
//!
//! ```rust
//! use config_composer::{generate_config, BuildContext, Target, UserConfig};
//! use serde_json::json;
//!
//! # async fn example() -> config_composer::ConfigResult<()> {
//! let mut context = BuildContext::new(UserConfig::default());
//! config_composer::presets::register_defaults(&mut context);
//! context.hooks_mut().modify_chain.tap("devtool", |mut chain, utils| {
//!     if utils.is_dev() {
//!         chain.set("devtool", json!("eval-source-map"))?;
//!     }
//!     Ok(chain)
//! });
//!
//! let tree = generate_config(Target::Web, &context).await?;
//! assert_eq!(tree.get("devtool"), Some(&json!("eval-source-map")));
//! # Ok(())
//! # }
//! ```

// Builder chain and compilation
pub mod chain;
pub mod chain_id;
pub mod compiler;
pub mod tree;

// Engine boundary
pub mod engine;
pub mod target;

// Hooks and per-run utils
pub mod hooks;
pub mod utils;

// Merging and configuration
pub mod context;
pub mod merge;

pub mod errors;
pub mod pipeline;
pub mod presets;


pub use chain::{BuilderChain, Rule, UseEntry};
pub use compiler::compile;
pub use context::{
    BuildContext, BuildMode, DevConfig, Hooks, OutputConfig, ToolsConfig, ToolsFile, UserConfig,
    UserConfigFile,
};
pub use engine::{
    BuiltinEngineLoader, EngineLoader, EnginePrimitives, Plugin, PluginConstructor,
};
pub use errors::{ConfigError, ConfigResult, HookError};
pub use hooks::{
    apply_customizations, customizer, run_with_customizations, Customizer, FnHook, Hook,
    HookRegistry,
};
pub use merge::{merge_chained_options, ArrayMergePolicy, ChainedConfig, DeepMerge, MergeStrategy};
pub use pipeline::{generate_config, generate_configs, Pipeline, PipelineState, Stage};
pub use target::Target;
pub use tree::ConfigTree;
pub use utils::{BundlerChainUtils, BundlerPrimitives, ChainUtils, ConfigUtils, OneOrMany};
