//! Well-known builder chain entry names.
//!
//! Hooks that touch the same rule or plugin must agree on its chain id;
//! these constants are the shared vocabulary.

/// Rule names.
pub mod rule {
    /// Script sources.
    pub const JS: &str = "js";
    /// Stylesheets.
    pub const CSS: &str = "css";
}

/// Loader names inside rules.
pub mod use_ {
    /// The stylesheet loader of the [`rule::CSS`](super::rule::CSS) rule.
    pub const CSS: &str = "css";
}

/// Plugin ids.
pub mod plugin {
    /// Compile-time constant definitions, registered by the `define-env` preset.
    pub const DEFINE: &str = "define";
    /// Hot module replacement, registered by the `hot-reload` preset.
    pub const HMR: &str = "hmr";
    /// Build progress reporting.
    pub const PROGRESS: &str = "progress";
}
