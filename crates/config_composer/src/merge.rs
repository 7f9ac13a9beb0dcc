//! Deep-merge engine for user override fragments.
//!
//! Implements structural merging with:
//! - Objects: deep-merge by key (recursive)
//! - Arrays: REPLACE by default, or concatenated under
//!   [`ArrayMergePolicy::Concat`]
//! - Scalars: override (overlay wins)
//!
//! Independently of the policy, an overlay value written as
//! `{"$append": [...]}` or `{"$prepend": [...]}` concatenates onto a base
//! array (or an absent/null base) instead of replacing it. Onto a mapping
//! base the marker is an ordinary key merged like any other, so a mapping
//! never changes type; onto a scalar base the items replace the scalar.
//!
//! User overrides are applied last through [`merge_chained_options`], so
//! they take precedence over every computed default and hook mutation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{ConfigError, ConfigResult, HookError};
use crate::pipeline::Stage;
use crate::tree::ConfigTree;
use crate::utils::ConfigUtils;

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;

/// Overlay marker concatenating its items after the base array.
pub const APPEND_MARKER: &str = "$append";

/// Overlay marker concatenating its items before the base array.
pub const PREPEND_MARKER: &str = "$prepend";

/// Pluggable deep-merge algorithm.
pub trait MergeStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Merges `overlay` onto `base`. Never fails: conflicts are resolved by
    /// the strategy.
    fn merge(&self, base: Value, overlay: Value) -> Value;
}

/// How conflicting arrays are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayMergePolicy {
    /// Overlay array replaces the base array.
    #[default]
    Replace,

    /// Overlay items are appended to the base array.
    Concat,
}

/// Default recursive merge strategy.
///
/// # Examples
///
/// ```rust
/// use config_composer::{DeepMerge, MergeStrategy};
/// use serde_json::json;
///
/// let merged = DeepMerge::default().merge(
///     json!({ "a": 1, "b": { "c": 2 } }),
///     json!({ "b": { "c": 3, "d": 4 } }),
/// );
/// assert_eq!(merged, json!({ "a": 1, "b": { "c": 3, "d": 4 } }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepMerge {
    arrays: ArrayMergePolicy,
}

impl DeepMerge {
    /// Creates a strategy resolving array conflicts with `arrays`.
    pub fn new(arrays: ArrayMergePolicy) -> Self {
        Self { arrays }
    }

    /// The configured array policy.
    pub fn array_policy(&self) -> ArrayMergePolicy {
        self.arrays
    }

    fn deep_merge(&self, base: Value, overlay: Value) -> Value {
        match (base, overlay) {
            (base @ (Value::Array(_) | Value::Null), Value::Object(overlay))
                if marker_of(&overlay).is_some() =>
            {
                apply_marker(base, overlay)
            }

            (Value::Object(mut base_map), Value::Object(overlay_map)) => {
                for (key, overlay_value) in overlay_map {
                    let merged = match base_map.remove(&key) {
                        Some(base_value) => self.deep_merge(base_value, overlay_value),
                        None => strip_markers(overlay_value),
                    };
                    base_map.insert(key, merged);
                }
                Value::Object(base_map)
            }

            (Value::Array(mut base_items), Value::Array(overlay_items))
                if self.arrays == ArrayMergePolicy::Concat =>
            {
                base_items.extend(overlay_items.into_iter().map(strip_markers));
                Value::Array(base_items)
            }

            (_, overlay) => strip_markers(overlay),
        }
    }
}

impl MergeStrategy for DeepMerge {
    fn name(&self) -> &str {
        match self.arrays {
            ArrayMergePolicy::Replace => "deep-merge",
            ArrayMergePolicy::Concat => "deep-merge-concat",
        }
    }

    fn merge(&self, base: Value, overlay: Value) -> Value {
        self.deep_merge(base, overlay)
    }
}

/// Returns the marker key if `map` is exactly one concatenation marker
/// holding an array.
fn marker_of(map: &Map<String, Value>) -> Option<&'static str> {
    if map.len() != 1 {
        return None;
    }
    [APPEND_MARKER, PREPEND_MARKER]
        .into_iter()
        .find(|marker| map.get(*marker).is_some_and(Value::is_array))
}

/// Concatenates the marker items onto `base`, which must be an array or null.
fn apply_marker(base: Value, mut overlay: Map<String, Value>) -> Value {
    let marker = marker_of(&overlay);
    let items = match marker.and_then(|m| overlay.remove(m)) {
        Some(Value::Array(items)) => items.into_iter().map(strip_markers).collect::<Vec<_>>(),
        _ => return strip_markers(Value::Object(overlay)),
    };
    let base_items = match base {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let merged = if marker == Some(PREPEND_MARKER) {
        items.into_iter().chain(base_items).collect()
    } else {
        base_items.into_iter().chain(items).collect()
    };
    Value::Array(merged)
}

/// Turns markers inside a value that has no base into plain arrays.
fn strip_markers(value: Value) -> Value {
    match value {
        Value::Object(map) if marker_of(&map).is_some() => apply_marker(Value::Null, map),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, strip_markers(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_markers).collect()),
        other => other,
    }
}

/// Callable producing or mutating the override tree.
///
/// It receives the current tree and may mutate it in place. Returning
/// `Some(tree)` replaces the current tree entirely.
pub type ConfigFn =
    Arc<dyn Fn(&mut ConfigTree, &ConfigUtils) -> Result<Option<ConfigTree>, HookError> + Send + Sync>;

/// One item of the user override list.
#[derive(Clone)]
pub enum ChainedConfig {
    /// Partial tree deep-merged onto the current tree.
    Fragment(Value),

    /// Callable given the current tree and the utils.
    Function(ConfigFn),
}

impl ChainedConfig {
    /// Wraps a partial tree. It must be a JSON object when applied.
    pub fn fragment(value: Value) -> Self {
        ChainedConfig::Fragment(value)
    }

    /// Wraps a callable override.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::{ChainedConfig, ConfigTree, ConfigUtils};
    /// use serde_json::json;
    ///
    /// let option = ChainedConfig::function(|tree: &mut ConfigTree, _utils: &ConfigUtils| {
    ///     tree.insert("devtool", json!("source-map"));
    ///     Ok(None)
    /// });
    /// assert!(matches!(option, ChainedConfig::Function(_)));
    /// ```
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut ConfigTree, &ConfigUtils) -> Result<Option<ConfigTree>, HookError>
            + Send
            + Sync
            + 'static,
    {
        ChainedConfig::Function(Arc::new(f))
    }
}

impl fmt::Debug for ChainedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainedConfig::Fragment(value) => f.debug_tuple("Fragment").field(value).finish(),
            ChainedConfig::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Applies the override list to `defaults` in array order.
///
/// # Errors
/// - `ConfigError::CustomizationFailed` if a callable fails
/// - `ConfigError::InvalidUserConfig` if a fragment is not an object
pub fn merge_chained_options(
    stage: Stage,
    defaults: ConfigTree,
    options: &[ChainedConfig],
    utils: &ConfigUtils,
) -> ConfigResult<ConfigTree> {
    options
        .iter()
        .enumerate()
        .try_fold(defaults, |mut tree, (index, option)| match option {
            ChainedConfig::Fragment(fragment) => {
                debug!(index, strategy = utils.merge_strategy().name(), "Merging override fragment");
                if !fragment.is_object() {
                    return Err(ConfigError::InvalidUserConfig {
                        reason: format!("override #{} must be an object, got {}", index, fragment),
                    });
                }
                ConfigTree::from_value(utils.merge_config(tree.into_value(), fragment.clone()))
            }
            ChainedConfig::Function(f) => match f(&mut tree, utils) {
                Ok(Some(replacement)) => Ok(replacement),
                Ok(None) => Ok(tree),
                Err(source) => Err(ConfigError::CustomizationFailed {
                    stage,
                    index,
                    source,
                }),
            },
        })
}
