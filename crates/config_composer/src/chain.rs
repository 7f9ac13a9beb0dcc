//! Builder chain: the mutable intermediate configuration representation.
//!
//! The chain stores nested fields as an arena of nodes addressed by stable
//! node ids, plus two ordered collections of named entries (rules and
//! plugins). Hooks and user customizations mutate the chain in place; the
//! compiler later walks it to produce a [`ConfigTree`](crate::ConfigTree).
//!
//! Nested fields are addressed with dotted paths (`"output.path"`). Setting
//! an object value expands it into child nodes, so later writes below it
//! extend rather than replace it. The `module.rules` and `plugins` paths are
//! reserved for the ordered collections.
//!
//! # Examples
//!
//! ```rust
//! use config_composer::{BuilderChain, Plugin};
//! use serde_json::json;
//!
//! let mut chain = BuilderChain::new();
//! chain.set("output.path", json!("dist"))?;
//! chain
//!     .rule("js")
//!     .test("\\.js$")
//!     .use_loader("babel", "babel-loader")
//!     .options(json!({ "cacheDirectory": true }));
//! chain.plugin("define", Plugin::new("DefinePlugin", json!({})));
//!
//! assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["js"]);
//! assert_eq!(chain.get("output"), Some(json!({ "path": "dist" })));
//! # Ok::<(), config_composer::ConfigError>(())
//! ```

use std::ops::{Index, IndexMut};

use serde_json::{Map, Value};

use crate::engine::Plugin;
use crate::errors::{ConfigError, ConfigResult};

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;

/// Stable identifier of a node inside a chain arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(usize);

/// Append-only storage. Ids stay valid for the lifetime of the arena;
/// removed entries are simply no longer referenced.
#[derive(Debug, Clone)]
struct Arena<T> {
    items: Vec<T>,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn alloc(&mut self, item: T) -> NodeId {
        self.items.push(item);
        NodeId(self.items.len() - 1)
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        &self.items[id.0]
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.items[id.0]
    }
}

/// Named entries kept in an explicit order.
#[derive(Debug, Clone)]
struct OrderedEntries<T> {
    collection: &'static str,
    arena: Arena<T>,
    order: Vec<(String, NodeId)>,
}

impl<T> OrderedEntries<T> {
    fn new(collection: &'static str) -> Self {
        Self {
            collection,
            arena: Arena::new(),
            order: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|(n, _)| n == name)
    }

    fn get(&self, name: &str) -> Option<&T> {
        self.position(name).map(|pos| &self.arena[self.order[pos].1])
    }

    fn get_or_insert_with(&mut self, name: &str, create: impl FnOnce() -> T) -> &mut T {
        let id = match self.position(name) {
            Some(pos) => self.order[pos].1,
            None => {
                let id = self.arena.alloc(create());
                self.order.push((name.to_string(), id));
                id
            }
        };
        &mut self.arena[id]
    }

    /// Replaces an existing entry in place or appends a new one.
    fn upsert(&mut self, name: &str, item: T) {
        match self.position(name) {
            Some(pos) => {
                let id = self.order[pos].1;
                self.arena[id] = item;
            }
            None => {
                let id = self.arena.alloc(item);
                self.order.push((name.to_string(), id));
            }
        }
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(pos) => {
                self.order.remove(pos);
                true
            }
            None => false,
        }
    }

    fn move_relative(&mut self, name: &str, anchor: &str, after: bool) -> ConfigResult<()> {
        let from = self.position(name).ok_or_else(|| self.unknown(name))?;
        if self.position(anchor).is_none() {
            return Err(self.unknown(anchor));
        }
        if name == anchor {
            return Ok(());
        }

        let entry = self.order.remove(from);
        let to = self.position(anchor).ok_or_else(|| self.unknown(anchor))?;
        let to = if after { to + 1 } else { to };
        self.order.insert(to, entry);
        Ok(())
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|(n, _)| n.as_str())
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order
            .iter()
            .map(|(n, id)| (n.as_str(), &self.arena[*id]))
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn unknown(&self, name: &str) -> ConfigError {
        ConfigError::UnknownChainEntry {
            collection: self.collection.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum ChainNode {
    Branch(Vec<(String, NodeId)>),
    Leaf(Value),
}

/// A loader applied by a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct UseEntry {
    loader: String,
    options: Option<Value>,
}

impl UseEntry {
    fn new(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: None,
        }
    }

    /// The loader module name.
    pub fn loader(&self) -> &str {
        &self.loader
    }

    /// The loader options, if any were set.
    pub fn get_options(&self) -> Option<&Value> {
        self.options.as_ref()
    }

    /// Replaces the loader options.
    pub fn options(&mut self, options: Value) -> &mut Self {
        self.options = Some(options);
        self
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("loader".to_string(), Value::String(self.loader.clone()));
        if let Some(options) = &self.options {
            map.insert("options".to_string(), options.clone());
        }
        Value::Object(map)
    }
}

/// A module rule under construction.
///
/// Structured fields (`test`, `include`, `exclude`, `type`, `use`) take
/// precedence over free-form fields of the same name set through
/// [`Rule::set`].
#[derive(Debug, Clone)]
pub struct Rule {
    test: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    kind: Option<String>,
    uses: OrderedEntries<UseEntry>,
    fields: Map<String, Value>,
}

impl Default for Rule {
    fn default() -> Self {
        Self {
            test: None,
            include: Vec::new(),
            exclude: Vec::new(),
            kind: None,
            uses: OrderedEntries::new("use"),
            fields: Map::new(),
        }
    }
}

impl Rule {
    /// Sets the resource pattern matched by this rule.
    pub fn test(&mut self, pattern: impl Into<String>) -> &mut Self {
        self.test = Some(pattern.into());
        self
    }

    /// Adds a path the rule is restricted to. Repeated calls accumulate.
    pub fn include(&mut self, path: impl Into<String>) -> &mut Self {
        self.include.push(path.into());
        self
    }

    /// Adds a path the rule never applies to. Repeated calls accumulate.
    pub fn exclude(&mut self, path: impl Into<String>) -> &mut Self {
        self.exclude.push(path.into());
        self
    }

    /// Sets the module type (`type` in the compiled rule).
    pub fn kind(&mut self, kind: impl Into<String>) -> &mut Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets a free-form rule field.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Returns the named loader entry, appending it if absent. The loader is
    /// updated either way.
    pub fn use_loader(&mut self, name: &str, loader: impl Into<String>) -> &mut UseEntry {
        let loader = loader.into();
        let entry = self
            .uses
            .get_or_insert_with(name, || UseEntry::new(loader.clone()));
        entry.loader = loader;
        entry
    }

    /// Returns the named loader entry without inserting it.
    pub fn get_use(&self, name: &str) -> Option<&UseEntry> {
        self.uses.get(name)
    }

    /// Removes the named loader entry. Returns `false` if it was absent.
    pub fn delete_use(&mut self, name: &str) -> bool {
        self.uses.remove(name)
    }

    /// Loader entry names in application order.
    pub fn use_names(&self) -> impl Iterator<Item = &str> {
        self.uses.names()
    }

    pub(crate) fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        if let Some(test) = &self.test {
            map.insert("test".to_string(), Value::String(test.clone()));
        }
        if !self.include.is_empty() {
            map.insert("include".to_string(), strings(&self.include));
        }
        if !self.exclude.is_empty() {
            map.insert("exclude".to_string(), strings(&self.exclude));
        }
        if let Some(kind) = &self.kind {
            map.insert("type".to_string(), Value::String(kind.clone()));
        }
        if self.uses.len() > 0 {
            let uses = self.uses.iter().map(|(_, entry)| entry.to_value()).collect();
            map.insert("use".to_string(), Value::Array(uses));
        }
        Value::Object(map)
    }
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Mutable intermediate configuration.
#[derive(Debug, Clone)]
pub struct BuilderChain {
    nodes: Arena<ChainNode>,
    root: NodeId,
    rules: OrderedEntries<Rule>,
    plugins: OrderedEntries<Plugin>,
}

impl Default for BuilderChain {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderChain {
    /// Creates an empty chain with no fields, rules or plugins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::{compile, BuilderChain};
    /// use serde_json::json;
    ///
    /// let chain = BuilderChain::new();
    /// assert_eq!(
    ///     compile(&chain).into_value(),
    ///     json!({ "module": { "rules": [] }, "plugins": [] })
    /// );
    /// ```
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(ChainNode::Branch(Vec::new()));
        Self {
            nodes,
            root,
            rules: OrderedEntries::new("rule"),
            plugins: OrderedEntries::new("plugin"),
        }
    }

    /// Sets a nested field, overwriting any previous value at that path.
    ///
    /// # Errors
    /// - `ConfigError::InvalidPath` for empty paths or empty segments
    /// - `ConfigError::ReservedPath` for `plugins`, `module.rules`, or a
    ///   non-object `module`
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> ConfigResult<&mut Self> {
        let segments = split_path(path)?;
        let value = value.into();
        if path == "module" && !value.is_object() {
            return Err(ConfigError::ReservedPath {
                path: path.to_string(),
            });
        }
        let value_id = self.alloc_value(path, value)?;

        let (last, parents) = segments
            .split_last()
            .ok_or_else(|| invalid_path(path, "path is empty"))?;
        let mut current = self.root;
        for segment in parents {
            current = match self.child(current, segment) {
                Some(id) if matches!(self.nodes[id], ChainNode::Branch(_)) => id,
                _ => {
                    let id = self.nodes.alloc(ChainNode::Branch(Vec::new()));
                    self.set_child(current, segment, id);
                    id
                }
            };
        }
        self.set_child(current, last, value_id);
        Ok(self)
    }

    /// Appends to the sequence at `path`, creating it when absent. A scalar
    /// already stored at the path becomes the first element.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidPath` if the path holds nested fields.
    pub fn push(&mut self, path: &str, value: impl Into<Value>) -> ConfigResult<&mut Self> {
        let value = value.into();
        match self.find(path) {
            None => {
                self.set(path, Value::Array(vec![value]))?;
            }
            Some(id) => match &mut self.nodes[id] {
                ChainNode::Leaf(Value::Array(items)) => items.push(value),
                ChainNode::Leaf(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                ChainNode::Branch(_) => {
                    return Err(invalid_path(path, "path holds nested fields"));
                }
            },
        }
        Ok(self)
    }

    /// Returns the value at `path`, materializing nested fields.
    ///
    /// Rules and plugins are not visible through this accessor.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.find(path).map(|id| self.materialize(id))
    }

    /// Whether a field, leaf or nested, exists at `path`.
    pub fn has(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Removes the field at `path`. Returns `false` if it was absent.
    pub fn delete(&mut self, path: &str) -> bool {
        let Ok(segments) = split_path(path) else {
            return false;
        };
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };
        let parent = match parents.iter().try_fold(self.root, |id, s| self.child(id, s)) {
            Some(id) => id,
            None => return false,
        };
        match &mut self.nodes[parent] {
            ChainNode::Branch(children) => {
                let before = children.len();
                children.retain(|(key, _)| key != last);
                children.len() != before
            }
            ChainNode::Leaf(_) => false,
        }
    }

    /// Returns the named rule, appending an empty one if absent.
    pub fn rule(&mut self, name: &str) -> &mut Rule {
        self.rules.get_or_insert_with(name, Rule::default)
    }

    /// Returns the named rule without inserting it.
    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Whether a rule named `name` exists.
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.position(name).is_some()
    }

    /// Removes the named rule. Returns `false` if it was absent.
    pub fn delete_rule(&mut self, name: &str) -> bool {
        self.rules.remove(name)
    }

    /// Rule names in compile order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::BuilderChain;
    ///
    /// let mut chain = BuilderChain::new();
    /// chain.rule("css");
    /// chain.rule("js");
    /// chain.move_rule_before("js", "css").unwrap();
    ///
    /// assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["js", "css"]);
    /// ```
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules.names()
    }

    /// Moves rule `name` directly before rule `anchor`.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownChainEntry` if either rule is missing.
    pub fn move_rule_before(&mut self, name: &str, anchor: &str) -> ConfigResult<&mut Self> {
        self.rules.move_relative(name, anchor, false)?;
        Ok(self)
    }

    /// Moves rule `name` directly after rule `anchor`.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownChainEntry` if either rule is missing.
    pub fn move_rule_after(&mut self, name: &str, anchor: &str) -> ConfigResult<&mut Self> {
        self.rules.move_relative(name, anchor, true)?;
        Ok(self)
    }

    /// Registers a plugin under `id`. An existing plugin with the same id is
    /// replaced in place, keeping its position.
    pub fn plugin(&mut self, id: &str, plugin: Plugin) -> &mut Self {
        self.plugins.upsert(id, plugin);
        self
    }

    /// Returns the plugin registered under `id`.
    pub fn get_plugin(&self, id: &str) -> Option<&Plugin> {
        self.plugins.get(id)
    }

    /// Whether a plugin is registered under `id`.
    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.position(id).is_some()
    }

    /// Removes the plugin registered under `id`. Returns `false` if it was
    /// absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use config_composer::{BuilderChain, Plugin};
    /// use serde_json::json;
    ///
    /// let mut chain = BuilderChain::new();
    /// chain.plugin("banner", Plugin::new("BannerPlugin", json!({ "banner": "v1" })));
    ///
    /// assert!(chain.delete_plugin("banner"));
    /// assert!(!chain.has_plugin("banner"));
    /// assert!(!chain.delete_plugin("banner"));
    /// ```
    pub fn delete_plugin(&mut self, id: &str) -> bool {
        self.plugins.remove(id)
    }

    /// Plugin ids in compile order.
    pub fn plugin_ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.names()
    }

    /// Moves plugin `id` directly before plugin `anchor`.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownChainEntry` if either plugin is missing.
    pub fn move_plugin_before(&mut self, id: &str, anchor: &str) -> ConfigResult<&mut Self> {
        self.plugins.move_relative(id, anchor, false)?;
        Ok(self)
    }

    /// Moves plugin `id` directly after plugin `anchor`.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownChainEntry` if either plugin is missing.
    pub fn move_plugin_after(&mut self, id: &str, anchor: &str) -> ConfigResult<&mut Self> {
        self.plugins.move_relative(id, anchor, true)?;
        Ok(self)
    }

    pub(crate) fn fields(&self) -> Map<String, Value> {
        match self.materialize(self.root) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    pub(crate) fn rule_entries(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter()
    }

    pub(crate) fn plugin_entries(&self) -> impl Iterator<Item = (&str, &Plugin)> {
        self.plugins.iter()
    }

    fn alloc_value(&mut self, path: &str, value: Value) -> ConfigResult<NodeId> {
        if is_reserved(path) {
            return Err(ConfigError::ReservedPath {
                path: path.to_string(),
            });
        }
        match value {
            Value::Object(map) => {
                let mut children = Vec::with_capacity(map.len());
                for (key, child) in map {
                    let id = self.alloc_value(&format!("{}.{}", path, key), child)?;
                    children.push((key, id));
                }
                Ok(self.nodes.alloc(ChainNode::Branch(children)))
            }
            other => Ok(self.nodes.alloc(ChainNode::Leaf(other))),
        }
    }

    fn find(&self, path: &str) -> Option<NodeId> {
        let segments = split_path(path).ok()?;
        segments
            .iter()
            .try_fold(self.root, |id, segment| self.child(id, segment))
    }

    fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        match &self.nodes[parent] {
            ChainNode::Branch(children) => children
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, id)| *id),
            ChainNode::Leaf(_) => None,
        }
    }

    fn set_child(&mut self, parent: NodeId, key: &str, child: NodeId) {
        if let ChainNode::Branch(children) = &mut self.nodes[parent] {
            match children.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = child,
                None => children.push((key.to_string(), child)),
            }
        }
    }

    fn materialize(&self, id: NodeId) -> Value {
        match &self.nodes[id] {
            ChainNode::Leaf(value) => value.clone(),
            ChainNode::Branch(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), self.materialize(*child)))
                    .collect(),
            ),
        }
    }
}

fn split_path(path: &str) -> ConfigResult<Vec<&str>> {
    if path.is_empty() {
        return Err(invalid_path(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid_path(path, "path contains an empty segment"));
    }
    Ok(segments)
}

fn is_reserved(path: &str) -> bool {
    let reserved = |prefix: &str| path == prefix || path.starts_with(&format!("{}.", prefix));
    reserved("plugins") || reserved("module.rules")
}

fn invalid_path(path: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
