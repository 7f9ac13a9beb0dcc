//! Built-in hooks that establish the base configuration.
//!
//! [`register_defaults`] installs them on a context before any user hook, so
//! user hooks and customizations always run on top of the base settings.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::chain::BuilderChain;
use crate::chain_id;
use crate::context::BuildContext;
use crate::errors::HookError;
use crate::hooks::Hook;
use crate::target::Target;
use crate::utils::BundlerChainUtils;

#[cfg(test)]
#[path = "presets_tests.rs"]
mod tests;

/// Registers the built-in bundler-chain hooks on `context`.
///
/// Call this before registering user hooks; registration order is execution
/// order.
pub fn register_defaults(context: &mut BuildContext) {
    let hmr = context.config().dev.hmr;
    context
        .hooks_mut()
        .modify_bundler_chain
        .register(BaseSettings)
        .register(DefineEnv)
        .register(HotReload { enabled: hmr });
    debug!(hmr, "Registered default hooks");
}

/// Engine target string for a build target.
pub fn engine_target(target: Target) -> &'static str {
    match target {
        Target::Web => "web",
        Target::Node => "node",
        Target::WebWorker | Target::ServiceWorker => "webworker",
        Target::ElectronMain => "electron-main",
        Target::ElectronRenderer => "electron-renderer",
    }
}

/// Sets `mode`, `name` and `target`.
pub struct BaseSettings;

#[async_trait]
impl Hook<BuilderChain, BundlerChainUtils> for BaseSettings {
    fn name(&self) -> &str {
        "base-settings"
    }

    async fn call(
        &self,
        mut chain: BuilderChain,
        utils: &BundlerChainUtils,
    ) -> Result<BuilderChain, HookError> {
        chain.set("mode", utils.env())?;
        chain.set("target", engine_target(utils.target()))?;
        if !utils.name().is_empty() {
            chain.set("name", utils.name())?;
        }
        Ok(chain)
    }
}

/// Defines `process.env.NODE_ENV` for the bundled code.
pub struct DefineEnv;

#[async_trait]
impl Hook<BuilderChain, BundlerChainUtils> for DefineEnv {
    fn name(&self) -> &str {
        "define-env"
    }

    async fn call(
        &self,
        mut chain: BuilderChain,
        utils: &BundlerChainUtils,
    ) -> Result<BuilderChain, HookError> {
        let env = serde_json::to_string(utils.env())?;
        let plugin = utils
            .bundler()
            .define_plugin
            .create(json!({ "process.env.NODE_ENV": env }));
        chain.plugin(chain_id::plugin::DEFINE, plugin);
        Ok(chain)
    }
}

/// Adds hot module replacement to development web builds.
pub struct HotReload {
    enabled: bool,
}

impl HotReload {
    /// Creates the hook. When `enabled` is false it leaves the chain untouched.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl Hook<BuilderChain, BundlerChainUtils> for HotReload {
    fn name(&self) -> &str {
        "hot-reload"
    }

    async fn call(
        &self,
        mut chain: BuilderChain,
        utils: &BundlerChainUtils,
    ) -> Result<BuilderChain, HookError> {
        if self.enabled && utils.is_dev() && utils.target() == Target::Web {
            let plugin = utils
                .bundler()
                .hot_module_replacement_plugin
                .create(json!({}));
            chain.plugin(chain_id::plugin::HMR, plugin);
        }
        Ok(chain)
    }
}
