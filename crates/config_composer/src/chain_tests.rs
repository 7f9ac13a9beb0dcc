//! Tests for the builder chain.

use super::*;
use serde_json::json;

// ============================================================================
// Nested fields
// ============================================================================

#[test]
fn test_set_and_get_nested_field() {
    let mut chain = BuilderChain::new();
    chain.set("output.path", json!("dist")).unwrap();
    chain.set("output.filename", json!("[name].js")).unwrap();

    assert_eq!(
        chain.get("output"),
        Some(json!({ "path": "dist", "filename": "[name].js" }))
    );
    assert!(chain.has("output.path"));
    assert!(!chain.has("output.publicPath"));
}

#[test]
fn test_set_overwrites_same_key_only() {
    let mut chain = BuilderChain::new();
    chain.set("resolve.alias.react", json!("preact")).unwrap();
    chain.set("resolve.mainFields", json!(["module"])).unwrap();
    chain.set("resolve.alias.react", json!("react")).unwrap();

    assert_eq!(chain.get("resolve.alias.react"), Some(json!("react")));
    assert_eq!(chain.get("resolve.mainFields"), Some(json!(["module"])));
}

/// Object values expand into child nodes so later writes extend them.
#[test]
fn test_set_object_then_extend() {
    let mut chain = BuilderChain::new();
    chain
        .set("devServer", json!({ "port": 3000, "hot": true }))
        .unwrap();
    chain.set("devServer.host", json!("localhost")).unwrap();

    assert_eq!(
        chain.get("devServer"),
        Some(json!({ "port": 3000, "hot": true, "host": "localhost" }))
    );
}

#[test]
fn test_set_below_scalar_replaces_it() {
    let mut chain = BuilderChain::new();
    chain.set("optimization", json!(false)).unwrap();
    chain.set("optimization.minimize", json!(true)).unwrap();

    assert_eq!(chain.get("optimization"), Some(json!({ "minimize": true })));
}

#[test]
fn test_set_rejects_reserved_paths() {
    let mut chain = BuilderChain::new();

    for path in ["plugins", "plugins.0", "module.rules", "module.rules.0"] {
        match chain.set(path, json!([])) {
            Err(ConfigError::ReservedPath { path: reported }) => assert_eq!(reported, path),
            other => panic!("Expected ReservedPath for {}, got {:?}", path, other.err()),
        }
    }
    assert!(matches!(
        chain.set("module", json!({ "rules": [] })),
        Err(ConfigError::ReservedPath { .. })
    ));
    assert!(matches!(
        chain.set("module", json!("nope")),
        Err(ConfigError::ReservedPath { .. })
    ));
}

#[test]
fn test_failed_set_leaves_chain_unchanged() {
    let mut chain = BuilderChain::new();
    chain.set("module.noParse", json!("jquery")).unwrap();

    let result = chain.set("module", json!({ "strictExportPresence": true, "rules": [] }));

    assert!(result.is_err());
    assert_eq!(chain.get("module"), Some(json!({ "noParse": "jquery" })));
}

#[test]
fn test_set_rejects_empty_segments() {
    let mut chain = BuilderChain::new();

    assert!(matches!(
        chain.set("", json!(1)),
        Err(ConfigError::InvalidPath { .. })
    ));
    assert!(matches!(
        chain.set("output..path", json!(1)),
        Err(ConfigError::InvalidPath { .. })
    ));
}

#[test]
fn test_push_builds_sequence() {
    let mut chain = BuilderChain::new();
    chain.push("entry.main", json!("./src/index.js")).unwrap();
    chain.push("entry.main", json!("./src/polyfill.js")).unwrap();

    assert_eq!(
        chain.get("entry.main"),
        Some(json!(["./src/index.js", "./src/polyfill.js"]))
    );
}

#[test]
fn test_push_onto_scalar_keeps_it_first() {
    let mut chain = BuilderChain::new();
    chain.set("resolve.extensions", json!(".js")).unwrap();
    chain.push("resolve.extensions", json!(".ts")).unwrap();

    assert_eq!(chain.get("resolve.extensions"), Some(json!([".js", ".ts"])));
}

#[test]
fn test_push_onto_branch_fails() {
    let mut chain = BuilderChain::new();
    chain.set("output.path", json!("dist")).unwrap();

    assert!(matches!(
        chain.push("output", json!("x")),
        Err(ConfigError::InvalidPath { .. })
    ));
}

#[test]
fn test_delete_field() {
    let mut chain = BuilderChain::new();
    chain.set("output.path", json!("dist")).unwrap();
    chain.set("output.clean", json!(true)).unwrap();

    assert!(chain.delete("output.clean"));
    assert!(!chain.delete("output.clean"));
    assert!(!chain.delete("missing.path"));
    assert_eq!(chain.get("output"), Some(json!({ "path": "dist" })));
}

// ============================================================================
// Rules
// ============================================================================

#[test]
fn test_rules_keep_insertion_order() {
    let mut chain = BuilderChain::new();
    chain.rule("js").test("\\.js$");
    chain.rule("css").test("\\.css$");
    chain.rule("svg").test("\\.svg$");
    // Re-accessing an existing rule does not move it.
    chain.rule("js").exclude("node_modules");

    assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["js", "css", "svg"]);
}

#[test]
fn test_rule_compiles_structured_fields() {
    let mut chain = BuilderChain::new();
    let rule = chain.rule("ts");
    rule.test("\\.tsx?$")
        .include("src")
        .exclude("node_modules")
        .kind("javascript/auto")
        .set("sideEffects", json!(false));
    rule.use_loader("swc", "swc-loader")
        .options(json!({ "jsc": { "target": "es2020" } }));
    rule.use_loader("raw", "raw-loader");

    assert_eq!(
        chain.get_rule("ts").unwrap().to_value(),
        json!({
            "test": "\\.tsx?$",
            "include": ["src"],
            "exclude": ["node_modules"],
            "type": "javascript/auto",
            "sideEffects": false,
            "use": [
                { "loader": "swc-loader", "options": { "jsc": { "target": "es2020" } } },
                { "loader": "raw-loader" }
            ]
        })
    );
}

#[test]
fn test_use_loader_updates_existing_entry_in_place() {
    let mut rule = Rule::default();
    rule.use_loader("a", "a-loader");
    rule.use_loader("b", "b-loader");
    rule.use_loader("a", "a2-loader").options(json!({ "x": 1 }));

    assert_eq!(rule.use_names().collect::<Vec<_>>(), vec!["a", "b"]);
    let entry = rule.get_use("a").unwrap();
    assert_eq!(entry.loader(), "a2-loader");
    assert_eq!(entry.get_options(), Some(&json!({ "x": 1 })));
    assert!(rule.delete_use("b"));
    assert!(rule.get_use("b").is_none());
}

#[test]
fn test_move_rule_before_and_after() {
    let mut chain = BuilderChain::new();
    for name in ["a", "b", "c"] {
        chain.rule(name);
    }

    chain.move_rule_before("c", "a").unwrap();
    assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["c", "a", "b"]);

    chain.move_rule_after("c", "b").unwrap();
    assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn test_move_rule_relative_to_unknown_fails() {
    let mut chain = BuilderChain::new();
    chain.rule("a");

    match chain.move_rule_before("a", "ghost") {
        Err(ConfigError::UnknownChainEntry { collection, name }) => {
            assert_eq!(collection, "rule");
            assert_eq!(name, "ghost");
        }
        other => panic!("Expected UnknownChainEntry, got {:?}", other.err()),
    }
    assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn test_delete_rule() {
    let mut chain = BuilderChain::new();
    chain.rule("a");
    chain.rule("b");

    assert!(chain.delete_rule("a"));
    assert!(!chain.has_rule("a"));
    assert!(chain.has_rule("b"));
    // Re-adding appends at the end with a fresh rule.
    chain.rule("a");
    assert_eq!(chain.rule_names().collect::<Vec<_>>(), vec!["b", "a"]);
}

// ============================================================================
// Plugins
// ============================================================================

#[test]
fn test_plugin_replace_keeps_position() {
    let mut chain = BuilderChain::new();
    chain.plugin("define", Plugin::new("DefinePlugin", json!({ "A": 1 })));
    chain.plugin("banner", Plugin::new("BannerPlugin", json!("hi")));
    chain.plugin("define", Plugin::new("DefinePlugin", json!({ "A": 2 })));

    assert_eq!(chain.plugin_ids().collect::<Vec<_>>(), vec!["define", "banner"]);
    assert_eq!(
        chain.get_plugin("define").unwrap().options,
        json!({ "A": 2 })
    );
}

#[test]
fn test_move_and_delete_plugins() {
    let mut chain = BuilderChain::new();
    chain.plugin("a", Plugin::new("A", json!(null)));
    chain.plugin("b", Plugin::new("B", json!(null)));
    chain.plugin("c", Plugin::new("C", json!(null)));

    chain.move_plugin_after("a", "c").unwrap();
    assert_eq!(chain.plugin_ids().collect::<Vec<_>>(), vec!["b", "c", "a"]);

    chain.move_plugin_before("a", "a").unwrap();
    assert_eq!(chain.plugin_ids().collect::<Vec<_>>(), vec!["b", "c", "a"]);

    assert!(chain.delete_plugin("c"));
    assert!(!chain.has_plugin("c"));
    assert!(chain.move_plugin_before("c", "a").is_err());
    assert_eq!(chain.plugin_ids().collect::<Vec<_>>(), vec!["b", "a"]);
}
