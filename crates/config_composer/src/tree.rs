//! Compiled configuration tree.
//!
//! The tree is the declarative form handed to the bundling engine. It is a
//! mapping from string keys to nested JSON values; rules live under
//! `module.rules` and plugins under `plugins`, both as ordered sequences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::{ConfigError, ConfigResult};

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;

/// Top-level key holding module settings.
pub const MODULE_KEY: &str = "module";
/// Key of the rule list inside [`MODULE_KEY`].
pub const RULES_KEY: &str = "rules";
/// Top-level key holding the plugin list.
pub const PLUGINS_KEY: &str = "plugins";

/// Declarative configuration tree consumed by the bundling engine.
///
/// # Examples
///
/// ```rust
/// use config_composer::ConfigTree;
/// use serde_json::json;
///
/// let tree = ConfigTree::from_value(json!({ "output": { "path": "dist" } }))?;
/// assert_eq!(tree.get("output.path"), Some(&json!("dist")));
/// assert!(tree.plugins().is_empty());
/// # Ok::<(), config_composer::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree(Map<String, Value>);

impl ConfigTree {
    /// Creates an empty tree. The rule and plugin lists are absent until written.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value, which must be an object.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidUserConfig` for non-object values.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ConfigError::InvalidUserConfig {
                reason: format!("configuration tree must be an object, got {}", other),
            }),
        }
    }

    /// The top-level entries.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutable access to the top-level entries.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Unwraps into a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Looks up a value by dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.0.get(first)?, |value, segment| value.get(segment))
    }

    /// Inserts a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Rule entries in order; empty if `module.rules` is absent.
    pub fn rules(&self) -> &[Value] {
        self.get("module.rules")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Plugin entries in order; empty if `plugins` is absent.
    pub fn plugins(&self) -> &[Value] {
        self.0
            .get(PLUGINS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable access to `module.rules`, creating `module` and `rules` when
    /// they are absent.
    pub fn rules_mut(&mut self) -> &mut Vec<Value> {
        let module = self
            .0
            .entry(MODULE_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        let module = ensure_object(module, MODULE_KEY);
        let rules = module
            .entry(RULES_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        ensure_array(rules, "module.rules")
    }

    /// Mutable access to `plugins`, creating it when absent.
    pub fn plugins_mut(&mut self) -> &mut Vec<Value> {
        let plugins = self
            .0
            .entry(PLUGINS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        ensure_array(plugins, PLUGINS_KEY)
    }

    /// Mutable access to `plugins` only if it already exists as a sequence.
    pub(crate) fn existing_plugins_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.0.get_mut(PLUGINS_KEY).and_then(Value::as_array_mut)
    }
}

impl From<ConfigTree> for Value {
    fn from(tree: ConfigTree) -> Self {
        tree.into_value()
    }
}

fn ensure_object<'a>(slot: &'a mut Value, path: &str) -> &'a mut Map<String, Value> {
    if !slot.is_object() {
        warn!(path, found = %slot, "Replacing non-object configuration value");
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot holds an object"),
    }
}

fn ensure_array<'a>(slot: &'a mut Value, path: &str) -> &'a mut Vec<Value> {
    if !slot.is_array() {
        warn!(path, found = %slot, "Replacing non-sequence configuration value");
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => items,
        _ => unreachable!("slot holds an array"),
    }
}
