//! Tests for configuration pipeline error types.

use std::error::Error as _;

use super::*;

#[derive(Debug)]
struct Boom;

impl std::fmt::Display for Boom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "boom")
    }
}

impl std::error::Error for Boom {}

#[test]
fn hook_failed_keeps_original_error_as_source() {
    let error = ConfigError::HookFailed {
        stage: Stage::EngineChain,
        hook: "second".to_string(),
        source: Box::new(Boom),
    };

    assert_eq!(
        error.to_string(),
        "Hook 'second' failed during modify engine chain: boom"
    );
    let source = error.source().expect("source should be kept");
    assert_eq!(source.to_string(), "boom");
    assert!(source.downcast_ref::<Boom>().is_some());
}

#[test]
fn customization_failed_reports_index_and_stage() {
    let error = ConfigError::CustomizationFailed {
        stage: Stage::BundlerChain,
        index: 2,
        source: "bad customization".into(),
    };

    assert_eq!(
        error.to_string(),
        "Customization #2 failed during modify bundler chain: bad customization"
    );
    assert_eq!(error.stage(), Some(Stage::BundlerChain));
}

#[test]
fn non_hook_errors_have_no_stage() {
    let error = ConfigError::EngineLoadFailed {
        component: "engine".to_string(),
        reason: "not installed".to_string(),
    };

    assert_eq!(error.stage(), None);
    assert!(error.to_string().contains("not installed"));
}

#[test]
fn reserved_path_message_names_path() {
    let error = ConfigError::ReservedPath {
        path: "module.rules".to_string(),
    };

    let debug_string = format!("{:?}", error);
    assert!(debug_string.contains("ReservedPath"));
    assert!(error.to_string().contains("module.rules"));
}
