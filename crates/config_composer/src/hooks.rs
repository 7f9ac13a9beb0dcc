//! Ordered asynchronous hook registries.
//!
//! A [`HookRegistry`] holds the hooks of one extension point in registration
//! order. Calling it runs a strict waterfall: each hook receives the value
//! returned by the previous one together with the run's utils, and finishes
//! before the next starts. The first failure aborts the waterfall; effects of
//! hooks that already completed are kept.
//!
//! After the registry, user customizations (plain synchronous callables from
//! the user configuration) are applied in array order through
//! [`run_with_customizations`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::{ConfigError, ConfigResult, HookError};
use crate::pipeline::Stage;

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;

/// A registered extension function taking part in a waterfall.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use config_composer::{BuilderChain, ChainUtils, Hook, HookError};
/// use serde_json::json;
///
/// struct SourceMaps;
///
/// #[async_trait]
/// impl Hook<BuilderChain, ChainUtils> for SourceMaps {
///     fn name(&self) -> &str {
///         "source-maps"
///     }
///
///     async fn call(
///         &self,
///         mut chain: BuilderChain,
///         utils: &ChainUtils,
///     ) -> Result<BuilderChain, HookError> {
///         if !utils.is_prod() {
///             chain.set("devtool", json!("eval-source-map"))?;
///         }
///         Ok(chain)
///     }
/// }
/// ```
#[async_trait]
pub trait Hook<T, U>: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Transforms the value. May perform asynchronous work.
    async fn call(&self, value: T, utils: &U) -> Result<T, HookError>;
}

/// Hook backed by a synchronous closure.
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F> {
    /// Names a closure so it can be registered as a hook.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<T, U, F> Hook<T, U> for FnHook<F>
where
    T: Send + 'static,
    U: Sync,
    F: Fn(T, &U) -> Result<T, HookError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, value: T, utils: &U) -> Result<T, HookError> {
        (self.f)(value, utils)
    }
}

/// Ordered hooks of a single extension point.
pub struct HookRegistry<T, U> {
    stage: Stage,
    hooks: Vec<Arc<dyn Hook<T, U>>>,
}

impl<T, U> HookRegistry<T, U>
where
    T: Send + 'static,
    U: Sync + 'static,
{
    /// Creates an empty registry for `stage`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::{BuilderChain, ChainUtils, HookRegistry, Stage};
    ///
    /// let mut registry: HookRegistry<BuilderChain, ChainUtils> = HookRegistry::new(Stage::EngineChain);
    /// registry.tap("noop", |chain, _utils| Ok(chain));
    ///
    /// assert_eq!(registry.len(), 1);
    /// assert_eq!(registry.names().collect::<Vec<_>>(), vec!["noop"]);
    /// ```
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            hooks: Vec::new(),
        }
    }

    /// The extension point these hooks belong to.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Appends a hook. Hooks run in registration order.
    pub fn register(&mut self, hook: impl Hook<T, U> + 'static) -> &mut Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Appends a synchronous closure as a named hook.
    pub fn tap<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(T, &U) -> Result<T, HookError> + Send + Sync + 'static,
    {
        self.register(FnHook::new(name, f))
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hook names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|h| h.name())
    }

    /// Runs every hook as a waterfall and returns the final value.
    ///
    /// # Errors
    /// Returns `ConfigError::HookFailed` for the first hook that fails; no
    /// later hook runs.
    pub async fn call(&self, value: T, utils: &U) -> ConfigResult<T> {
        let mut value = value;
        for (index, hook) in self.hooks.iter().enumerate() {
            debug!(stage = %self.stage, index, hook = hook.name(), "Running hook");
            value = match hook.call(value, utils).await {
                Ok(next) => next,
                Err(source) => {
                    warn!(stage = %self.stage, hook = hook.name(), error = %source, "Hook failed");
                    return Err(ConfigError::HookFailed {
                        stage: self.stage,
                        hook: hook.name().to_string(),
                        source,
                    });
                }
            };
        }
        Ok(value)
    }
}

impl<T, U> Clone for HookRegistry<T, U> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage,
            hooks: self.hooks.clone(),
        }
    }
}

impl<T, U> fmt::Debug for HookRegistry<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("stage", &self.stage)
            .field(
                "hooks",
                &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A user customization: mutates the value in place, return value ignored.
pub type Customizer<T, U> = Arc<dyn Fn(&mut T, &U) -> Result<(), HookError> + Send + Sync>;

/// Wraps a closure as a [`Customizer`].
pub fn customizer<T, U, F>(f: F) -> Customizer<T, U>
where
    F: Fn(&mut T, &U) -> Result<(), HookError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Applies customizations synchronously in array order.
///
/// # Errors
/// Returns `ConfigError::CustomizationFailed` for the first failing
/// customization; later ones do not run.
pub fn apply_customizations<T, U>(
    stage: Stage,
    value: &mut T,
    customizations: &[Customizer<T, U>],
    utils: &U,
) -> ConfigResult<()> {
    for (index, customize) in customizations.iter().enumerate() {
        customize(value, utils).map_err(|source| {
            warn!(%stage, index, error = %source, "Customization failed");
            ConfigError::CustomizationFailed {
                stage,
                index,
                source,
            }
        })?;
    }
    Ok(())
}

/// Runs a registry waterfall, then applies the user customizations to its
/// result.
pub async fn run_with_customizations<T, U>(
    registry: &HookRegistry<T, U>,
    customizations: &[Customizer<T, U>],
    value: T,
    utils: &U,
) -> ConfigResult<T>
where
    T: Send + 'static,
    U: Sync + 'static,
{
    debug!(stage = %registry.stage(), "{} start", registry.stage());
    let mut value = registry.call(value, utils).await?;
    apply_customizations(registry.stage(), &mut value, customizations, utils)?;
    debug!(stage = %registry.stage(), "{} done", registry.stage());
    Ok(value)
}
