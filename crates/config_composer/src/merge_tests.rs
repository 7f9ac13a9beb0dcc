//! Tests for the deep-merge engine.

use super::*;
use crate::context::UserConfig;
use crate::engine::BuiltinEngineLoader;
use crate::target::Target;
use crate::utils::ChainUtils;
use serde_json::json;

async fn config_utils() -> ConfigUtils {
    let chain = ChainUtils::assemble(
        Target::Web,
        &UserConfig::default(),
        &BuiltinEngineLoader::default(),
    )
    .await
    .unwrap();
    ConfigUtils::new(chain, Arc::new(DeepMerge::default()))
}

fn tree(value: Value) -> ConfigTree {
    ConfigTree::from_value(value).unwrap()
}

// ============================================================================
// DeepMerge
// ============================================================================

#[test]
fn test_override_wins_and_nested_maps_merge() {
    let merged = DeepMerge::default().merge(
        json!({ "a": 1, "b": { "c": 2 } }),
        json!({ "b": { "c": 3, "d": 4 } }),
    );

    assert_eq!(merged, json!({ "a": 1, "b": { "c": 3, "d": 4 } }));
}

#[test]
fn test_arrays_replace_by_default() {
    let merged = DeepMerge::default().merge(
        json!({ "resolve": { "extensions": [".js", ".jsx"] } }),
        json!({ "resolve": { "extensions": [".ts"] } }),
    );

    assert_eq!(merged, json!({ "resolve": { "extensions": [".ts"] } }));
}

#[test]
fn test_concat_policy_appends_arrays() {
    let strategy = DeepMerge::new(ArrayMergePolicy::Concat);
    let merged = strategy.merge(json!({ "list": [1, 2] }), json!({ "list": [3] }));

    assert_eq!(merged, json!({ "list": [1, 2, 3] }));
    assert_eq!(strategy.name(), "deep-merge-concat");
}

#[test]
fn test_append_marker_concatenates_under_replace_policy() {
    let merged = DeepMerge::default().merge(
        json!({ "plugins": [{ "name": "A" }] }),
        json!({ "plugins": { "$append": [{ "name": "B" }] } }),
    );

    assert_eq!(merged, json!({ "plugins": [{ "name": "A" }, { "name": "B" }] }));
}

#[test]
fn test_prepend_marker_concatenates_before_base() {
    let merged = DeepMerge::default().merge(
        json!({ "entry": ["./b.js"] }),
        json!({ "entry": { "$prepend": ["./a.js"] } }),
    );

    assert_eq!(merged, json!({ "entry": ["./a.js", "./b.js"] }));
}

#[test]
fn test_marker_without_base_becomes_plain_array() {
    let merged = DeepMerge::default().merge(
        json!({}),
        json!({ "externals": { "$append": ["react"] } }),
    );

    assert_eq!(merged, json!({ "externals": ["react"] }));
}

#[test]
fn test_marker_onto_null_becomes_plain_array() {
    let merged = DeepMerge::default().merge(
        json!({ "externals": null }),
        json!({ "externals": { "$prepend": ["react"] } }),
    );

    assert_eq!(merged, json!({ "externals": ["react"] }));
}

/// Verify a marker onto a scalar replaces it like any other overlay.
#[test]
fn test_marker_onto_scalar_replaces_scalar() {
    let merged = DeepMerge::default().merge(
        json!({ "entry": "./main.js" }),
        json!({ "entry": { "$append": ["./extra.js"] } }),
    );

    assert_eq!(merged, json!({ "entry": ["./extra.js"] }));
}

/// Verify a marker onto a mapping merges key-by-key and keeps the mapping.
#[test]
fn test_marker_onto_mapping_keeps_mapping() {
    let merged = DeepMerge::default().merge(
        json!({ "resolve": { "alias": { "a": "b" } } }),
        json!({ "resolve": { "alias": { "$append": ["x"] } } }),
    );

    assert!(merged["resolve"]["alias"].is_object());
    assert_eq!(merged["resolve"]["alias"]["a"], json!("b"));
    assert_eq!(
        merged,
        json!({ "resolve": { "alias": { "a": "b", "$append": ["x"] } } })
    );
}

/// Verify a nested marker under a mapping base still concatenates onto its own array.
#[test]
fn test_nested_marker_inside_mapping_concatenates() {
    let merged = DeepMerge::default().merge(
        json!({ "resolve": { "alias": { "a": "b" }, "extensions": [".js"] } }),
        json!({ "resolve": { "extensions": { "$append": [".ts"] } } }),
    );

    assert_eq!(
        merged,
        json!({ "resolve": { "alias": { "a": "b" }, "extensions": [".js", ".ts"] } })
    );
}

/// Objects that merely contain a marker key among others are plain objects.
#[test]
fn test_object_with_extra_keys_is_not_a_marker() {
    let merged = DeepMerge::default().merge(
        json!({ "x": [1] }),
        json!({ "x": { "$append": [2], "other": true } }),
    );

    assert_eq!(merged, json!({ "x": { "$append": [2], "other": true } }));
}

#[test]
fn test_null_overrides_value() {
    let merged = DeepMerge::default().merge(json!({ "devtool": "source-map" }), json!({ "devtool": null }));

    assert!(merged["devtool"].is_null());
}

#[test]
fn test_object_replaces_scalar() {
    let merged = DeepMerge::default().merge(
        json!({ "optimization": false }),
        json!({ "optimization": { "minimize": true } }),
    );

    assert_eq!(merged, json!({ "optimization": { "minimize": true } }));
}

// ============================================================================
// Chained options
// ============================================================================

#[tokio::test]
async fn test_fragments_apply_in_order() {
    let utils = config_utils().await;
    let options = vec![
        ChainedConfig::fragment(json!({ "devtool": "eval", "output": { "path": "a" } })),
        ChainedConfig::fragment(json!({ "output": { "path": "b" } })),
    ];

    let merged = merge_chained_options(
        Stage::EngineConfig,
        tree(json!({ "mode": "development" })),
        &options,
        &utils,
    )
    .unwrap();

    assert_eq!(
        merged.into_value(),
        json!({ "mode": "development", "devtool": "eval", "output": { "path": "b" } })
    );
}

#[tokio::test]
async fn test_function_can_mutate_or_replace() {
    let utils = config_utils().await;
    let options = vec![
        ChainedConfig::function(|tree: &mut ConfigTree, utils: &ConfigUtils| {
            tree.insert("name", json!(utils.name()));
            Ok(None)
        }),
        ChainedConfig::function(|tree: &mut ConfigTree, _utils: &ConfigUtils| {
            let mut replacement = tree.clone();
            replacement.insert("replaced", json!(true));
            Ok(Some(replacement))
        }),
    ];

    let merged =
        merge_chained_options(Stage::EngineConfig, ConfigTree::new(), &options, &utils).unwrap();

    assert_eq!(
        merged.into_value(),
        json!({ "name": "client", "replaced": true })
    );
}

#[tokio::test]
async fn test_function_sees_result_of_previous_fragment() {
    let utils = config_utils().await;
    let options = vec![
        ChainedConfig::fragment(json!({ "target": "web" })),
        ChainedConfig::function(|tree: &mut ConfigTree, _utils: &ConfigUtils| {
            if tree.get("target") != Some(&json!("web")) {
                return Err("fragment not applied yet".into());
            }
            Ok(None)
        }),
    ];

    assert!(merge_chained_options(Stage::EngineConfig, ConfigTree::new(), &options, &utils).is_ok());
}

#[tokio::test]
async fn test_failing_function_reports_index() {
    let utils = config_utils().await;
    let options = vec![
        ChainedConfig::fragment(json!({})),
        ChainedConfig::function(|_tree: &mut ConfigTree, _utils: &ConfigUtils| {
            Err("broken override".into())
        }),
    ];

    let error =
        merge_chained_options(Stage::EngineConfig, ConfigTree::new(), &options, &utils).unwrap_err();

    match error {
        ConfigError::CustomizationFailed { stage, index, source } => {
            assert_eq!(stage, Stage::EngineConfig);
            assert_eq!(index, 1);
            assert_eq!(source.to_string(), "broken override");
        }
        other => panic!("Expected CustomizationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_object_fragment_is_rejected() {
    let utils = config_utils().await;
    let options = vec![ChainedConfig::fragment(json!([1, 2, 3]))];

    let error =
        merge_chained_options(Stage::EngineConfig, ConfigTree::new(), &options, &utils).unwrap_err();

    assert!(matches!(error, ConfigError::InvalidUserConfig { .. }));
}

#[test]
fn test_chained_config_debug_hides_callables() {
    let function = ChainedConfig::function(|_tree: &mut ConfigTree, _utils: &ConfigUtils| Ok(None));
    assert_eq!(format!("{:?}", function), "Function(..)");
    assert!(format!("{:?}", ChainedConfig::fragment(json!({ "a": 1 }))).starts_with("Fragment"));
}
