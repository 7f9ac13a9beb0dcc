//! Command modules for the config-composer CLI.
//!
//! - `compose_cmd`: runs the configuration pipeline for one or more targets
//! - `targets_cmd`: lists the supported build targets

pub mod compose_cmd;
pub mod targets_cmd;
