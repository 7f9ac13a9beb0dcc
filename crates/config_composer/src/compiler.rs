//! Builder-to-tree compilation.

use serde_json::{Map, Value};
use tracing::debug;

use crate::chain::BuilderChain;
use crate::tree::{ConfigTree, MODULE_KEY, PLUGINS_KEY, RULES_KEY};

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;

/// Compiles a builder chain into a configuration tree.
///
/// Pure traversal: the chain is not modified and compiling the same chain
/// twice yields equal trees. Rules and plugins keep the chain's order, and
/// `module.rules` and `plugins` are always present, empty when the chain
/// declares none.
///
/// # Examples
///
/// ```rust
/// use config_composer::{compile, BuilderChain};
/// use serde_json::json;
///
/// let chain = BuilderChain::new();
/// let tree = compile(&chain);
/// assert_eq!(tree.into_value(), json!({ "module": { "rules": [] }, "plugins": [] }));
/// ```
pub fn compile(chain: &BuilderChain) -> ConfigTree {
    let mut fields = chain.fields();

    let rules: Vec<Value> = chain.rule_entries().map(|(_, rule)| rule.to_value()).collect();
    let plugins: Vec<Value> = chain
        .plugin_entries()
        .map(|(_, plugin)| plugin.to_value())
        .collect();
    debug!(
        rules = rules.len(),
        plugins = plugins.len(),
        "Compiled builder chain"
    );

    let module = fields
        .entry(MODULE_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(module) = module {
        module.insert(RULES_KEY.to_string(), Value::Array(rules));
    }
    fields.insert(PLUGINS_KEY.to_string(), Value::Array(plugins));

    let mut tree = ConfigTree::new();
    *tree.as_map_mut() = fields;
    tree
}
