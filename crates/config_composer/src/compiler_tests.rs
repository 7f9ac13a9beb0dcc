//! Tests for builder-to-tree compilation.

use super::*;
use crate::engine::Plugin;
use serde_json::json;

fn sample_chain() -> BuilderChain {
    let mut chain = BuilderChain::new();
    chain.set("mode", json!("production")).unwrap();
    chain.set("output.path", json!("dist")).unwrap();
    chain.set("module.noParse", json!("jquery")).unwrap();
    chain.rule("js").test("\\.js$").use_loader("babel", "babel-loader");
    chain.rule("css").test("\\.css$");
    chain.plugin("define", Plugin::new("DefinePlugin", json!({ "X": "1" })));
    chain.plugin("banner", Plugin::new("BannerPlugin", json!("hi")));
    chain
}

#[test]
fn test_empty_chain_defaults_ordered_collections() {
    let tree = compile(&BuilderChain::new());

    assert_eq!(tree.get("module.rules"), Some(&json!([])));
    assert_eq!(tree.get("plugins"), Some(&json!([])));
}

#[test]
fn test_compile_preserves_declared_order() {
    let tree = compile(&sample_chain());

    let tests: Vec<_> = tree.rules().iter().map(|r| r["test"].clone()).collect();
    assert_eq!(tests, vec![json!("\\.js$"), json!("\\.css$")]);

    let names: Vec<_> = tree
        .plugins()
        .iter()
        .filter_map(Plugin::tag_of)
        .collect();
    assert_eq!(names, vec!["DefinePlugin", "BannerPlugin"]);
}

#[test]
fn test_compile_emits_fields_and_module_siblings() {
    let tree = compile(&sample_chain());

    assert_eq!(
        tree.into_value(),
        json!({
            "mode": "production",
            "output": { "path": "dist" },
            "module": {
                "noParse": "jquery",
                "rules": [
                    { "test": "\\.js$", "use": [{ "loader": "babel-loader" }] },
                    { "test": "\\.css$" }
                ]
            },
            "plugins": [
                { "name": "DefinePlugin", "options": { "X": "1" } },
                { "name": "BannerPlugin", "options": "hi" }
            ]
        })
    );
}

#[test]
fn test_compile_is_idempotent() {
    let chain = sample_chain();

    let first = compile(&chain);
    let second = compile(&chain);

    assert_eq!(first, second);
}

#[test]
fn test_compile_reflects_reordering() {
    let mut chain = sample_chain();
    chain.move_plugin_before("banner", "define").unwrap();
    chain.delete_rule("js");

    let tree = compile(&chain);

    assert_eq!(Plugin::tag_of(&tree.plugins()[0]), Some("BannerPlugin"));
    assert_eq!(tree.rules().len(), 1);
}
