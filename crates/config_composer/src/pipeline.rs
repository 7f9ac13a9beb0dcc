//! Pipeline orchestration.
//!
//! One run produces the final configuration tree for one target:
//!
//! 1. Assemble utils (loads the engine primitives)
//! 2. Bundler-chain hooks and customizations over a fresh builder chain
//! 3. Engine-chain hooks and customizations
//! 4. Compile the chain into a tree
//! 5. Config hooks over the tree
//! 6. Merge the user overrides
//!
//! Every step completes before the next starts. A failure moves the run to
//! [`PipelineState::Failed`] and the error is returned as raised; nothing is
//! retried.
//!
//! Runs for different targets are independent and may execute concurrently,
//! see [`generate_configs`].

use std::fmt;

use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::chain::BuilderChain;
use crate::compiler::compile;
use crate::context::BuildContext;
use crate::errors::{ConfigError, ConfigResult};
use crate::hooks::run_with_customizations;
use crate::merge::merge_chained_options;
use crate::target::Target;
use crate::tree::ConfigTree;
use crate::utils::{BundlerChainUtils, ChainUtils, ConfigUtils};

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

/// Extension points of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Bundler-specific chain setup, with access to the bundler primitives.
    BundlerChain,
    /// Engine-agnostic chain setup.
    EngineChain,
    /// Mutation of the compiled tree.
    EngineConfig,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BundlerChain => "modify bundler chain",
            Self::EngineChain => "modify engine chain",
            Self::EngineConfig => "modify engine config",
        })
    }
}

/// Lifecycle of a single run.
///
/// `Init → ChainBuilt → ChainHooked → TreeCompiled → TreeHooked → Merged`,
/// with `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    /// Created, not yet run.
    Init,
    /// Bundler-chain stage finished.
    ChainBuilt,
    /// Engine-chain stage finished.
    ChainHooked,
    /// Chain compiled into a tree.
    TreeCompiled,
    /// Config hooks finished.
    TreeHooked,
    /// User overrides merged. The run succeeded.
    Merged,
    /// A step failed. The run is over.
    Failed,
}

impl PipelineState {
    /// Whether the run is over, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Merged | Self::Failed)
    }

    /// The successor on the success path, `None` for terminal states.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            Self::Init => Some(Self::ChainBuilt),
            Self::ChainBuilt => Some(Self::ChainHooked),
            Self::ChainHooked => Some(Self::TreeCompiled),
            Self::TreeCompiled => Some(Self::TreeHooked),
            Self::TreeHooked => Some(Self::Merged),
            Self::Merged | Self::Failed => None,
        }
    }
}

/// A single configuration pipeline run.
///
/// # Examples
///
/// ```rust
/// use config_composer::{BuildContext, Pipeline, PipelineState, Target, UserConfig};
///
/// # async fn example() -> config_composer::ConfigResult<()> {
/// let context = BuildContext::new(UserConfig::default());
/// let mut pipeline = Pipeline::new(&context, Target::Web);
/// let tree = pipeline.run().await?;
///
/// assert_eq!(pipeline.state(), PipelineState::Merged);
/// assert!(tree.plugins().is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Pipeline<'a> {
    context: &'a BuildContext,
    target: Target,
    run_id: Uuid,
    state: PipelineState,
}

impl<'a> Pipeline<'a> {
    /// Prepares a run for `target`. Nothing executes until [`Pipeline::run`].
    pub fn new(context: &'a BuildContext, target: Target) -> Self {
        Self {
            context,
            target,
            run_id: Uuid::new_v4(),
            state: PipelineState::Init,
        }
    }

    /// The target this run builds for.
    pub fn target(&self) -> Target {
        self.target
    }

    /// Unique id of this run, recorded on its tracing span.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    /// - `ConfigError::RunFinished` if this run already ran
    /// - any error raised by a stage, unchanged
    #[instrument(
        name = "generate_config",
        skip(self),
        fields(target = %self.target, run_id = %self.run_id)
    )]
    pub async fn run(&mut self) -> ConfigResult<ConfigTree> {
        if self.state != PipelineState::Init {
            return Err(ConfigError::RunFinished { state: self.state });
        }

        let result = self.execute().await;
        match &result {
            Ok(_) => info!("Configuration generated"),
            Err(error) => {
                warn!(from = ?self.state, %error, "Configuration pipeline failed");
                self.state = PipelineState::Failed;
            }
        }
        result
    }

    async fn execute(&mut self) -> ConfigResult<ConfigTree> {
        let context = self.context;
        let config = context.config();
        let hooks = context.hooks();

        let chain_utils = ChainUtils::assemble(self.target, config, context.engine_loader()).await?;
        let bundler_utils = BundlerChainUtils::new(chain_utils.clone())?;

        let chain = run_with_customizations(
            &hooks.modify_bundler_chain,
            &config.tools.bundler_chain,
            BuilderChain::new(),
            &bundler_utils,
        )
        .await?;
        self.advance(PipelineState::ChainBuilt);

        let chain = run_with_customizations(
            &hooks.modify_chain,
            &config.tools.chain,
            chain,
            &chain_utils,
        )
        .await?;
        self.advance(PipelineState::ChainHooked);

        let tree = compile(&chain);
        drop(chain);
        self.advance(PipelineState::TreeCompiled);

        let config_utils = ConfigUtils::new(chain_utils, context.merge_strategy());
        debug!(stage = %hooks.modify_config.stage(), "{} start", hooks.modify_config.stage());
        let tree = hooks.modify_config.call(tree, &config_utils).await?;
        self.advance(PipelineState::TreeHooked);

        let tree = merge_chained_options(
            hooks.modify_config.stage(),
            tree,
            &config.tools.config,
            &config_utils,
        )?;
        debug!(stage = %hooks.modify_config.stage(), "{} done", hooks.modify_config.stage());
        self.advance(PipelineState::Merged);

        Ok(tree)
    }

    fn advance(&mut self, to: PipelineState) {
        debug_assert_eq!(self.state.next(), Some(to));
        debug!(from = ?self.state, to = ?to, "Pipeline state transition");
        self.state = to;
    }
}

/// Generates the final configuration tree for `target`.
///
/// # Errors
/// Returns the first error raised by any stage.
pub async fn generate_config(target: Target, context: &BuildContext) -> ConfigResult<ConfigTree> {
    Pipeline::new(context, target).run().await
}

/// Generates configuration trees for several targets concurrently.
///
/// Each target gets its own independent run; results keep the order of
/// `targets`.
///
/// # Errors
/// Fails as a whole with the first error raised by any run.
pub async fn generate_configs(
    targets: &[Target],
    context: &BuildContext,
) -> ConfigResult<Vec<(Target, ConfigTree)>> {
    try_join_all(targets.iter().map(|&target| async move {
        generate_config(target, context)
            .await
            .map(|tree| (target, tree))
    }))
    .await
}
