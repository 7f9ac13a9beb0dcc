//! Tests for the build context and user configuration.

use super::*;
use serde_json::json;

#[test]
fn test_build_mode_defaults_to_development() {
    assert_eq!(BuildMode::default(), BuildMode::Development);
    assert_eq!(UserConfig::default().mode, BuildMode::Development);
}

#[test]
fn test_build_mode_parse() {
    assert_eq!("production".parse::<BuildMode>().unwrap(), BuildMode::Production);
    assert_eq!(BuildMode::Production.to_string(), "production");
    assert!(matches!(
        "staging".parse::<BuildMode>(),
        Err(ConfigError::InvalidUserConfig { .. })
    ));
}

#[test]
fn test_user_config_defaults() {
    let config = UserConfig::default();

    assert!(config.dev.hmr);
    assert_eq!(config.output.compiled_dir, PathBuf::from("compiled"));
    assert!(config.tools.chain.is_empty());
    assert!(config.tools.config.is_empty());
    assert_eq!(config.tools.merge_arrays, ArrayMergePolicy::Replace);
}

#[test]
fn test_config_file_accepts_single_override_table() {
    let file: UserConfigFile = serde_json::from_value(json!({
        "mode": "production",
        "tools": { "config": { "devtool": "source-map" } }
    }))
    .unwrap();

    assert_eq!(file.mode, BuildMode::Production);
    assert_eq!(file.tools.config, vec![json!({ "devtool": "source-map" })]);
}

#[test]
fn test_config_file_accepts_override_list() {
    let file: UserConfigFile = serde_json::from_value(json!({
        "dev": { "hmr": false },
        "output": { "compiled_dir": "vendor/compiled" },
        "tools": {
            "merge_arrays": "concat",
            "config": [{ "a": 1 }, { "b": 2 }]
        }
    }))
    .unwrap();

    assert!(!file.dev.hmr);
    assert_eq!(file.output.compiled_dir, PathBuf::from("vendor/compiled"));
    assert_eq!(file.tools.merge_arrays, ArrayMergePolicy::Concat);
    assert_eq!(file.tools.config.len(), 2);
}

#[test]
fn test_empty_config_file_uses_defaults() {
    let file: UserConfigFile = serde_json::from_value(json!({})).unwrap();
    assert_eq!(file, UserConfigFile::default());
}

#[test]
fn test_config_file_converts_overrides_to_fragments() {
    let file: UserConfigFile = serde_json::from_value(json!({
        "tools": { "config": [{ "a": 1 }, { "b": 2 }] }
    }))
    .unwrap();

    let config = UserConfig::from(file);

    assert_eq!(config.tools.config.len(), 2);
    match &config.tools.config[1] {
        ChainedConfig::Fragment(value) => assert_eq!(value, &json!({ "b": 2 })),
        other => panic!("Expected Fragment, got {:?}", other),
    }
}

#[test]
fn test_hooks_default_to_one_stage_each() {
    let hooks = Hooks::default();

    assert_eq!(hooks.modify_bundler_chain.stage(), Stage::BundlerChain);
    assert_eq!(hooks.modify_chain.stage(), Stage::EngineChain);
    assert_eq!(hooks.modify_config.stage(), Stage::EngineConfig);
    assert!(hooks.modify_chain.is_empty());
}

#[test]
fn test_context_merge_strategy_follows_array_policy() {
    let mut config = UserConfig::default();
    config.tools.merge_arrays = ArrayMergePolicy::Concat;

    let context = BuildContext::new(config);

    assert_eq!(context.merge_strategy().name(), "deep-merge-concat");
}

#[test]
fn test_context_with_custom_merge_strategy() {
    struct KeepBase;

    impl MergeStrategy for KeepBase {
        fn name(&self) -> &str {
            "keep-base"
        }

        fn merge(&self, base: Value, _overlay: Value) -> Value {
            base
        }
    }

    let context = BuildContext::new(UserConfig::default()).with_merge_strategy(KeepBase);

    assert_eq!(context.merge_strategy().name(), "keep-base");
    assert!(format!("{:?}", context).contains("keep-base"));
}

#[test]
fn test_hooks_registered_through_context() {
    let mut context = BuildContext::new(UserConfig::default());
    context
        .hooks_mut()
        .modify_chain
        .tap("first", |chain, _utils| Ok(chain))
        .tap("second", |chain, _utils| Ok(chain));

    assert_eq!(
        context.hooks().modify_chain.names().collect::<Vec<_>>(),
        vec!["first", "second"]
    );
}
