use std::fs;
use std::path::PathBuf;

use clap::Args;
use config_composer::{generate_configs, presets, BuildContext, BuildMode, Target, UserConfig};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::resolve_config;
use crate::errors::Error;

#[cfg(test)]
#[path = "compose_cmd_tests.rs"]
mod tests;

/// Arguments for the compose command
#[derive(Args, Debug, Clone, Default)]
pub struct ComposeArgs {
    /// Path to the configuration file (TOML, or JSON with a .json extension)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Build target; repeat to compose several targets
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<Target>,

    /// Build mode, overrides the configuration file
    #[arg(short, long)]
    pub mode: Option<BuildMode>,

    /// Pretty-print the composed configuration
    #[arg(long)]
    pub pretty: bool,

    /// Write the composed configuration to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the built-in default hooks
    #[arg(long)]
    pub no_defaults: bool,
}

impl ComposeArgs {
    /// Requested targets without duplicates, `web` when none were given.
    pub fn resolved_targets(&self) -> Vec<Target> {
        if self.targets.is_empty() {
            return vec![Target::Web];
        }

        let mut targets = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            if !targets.contains(target) {
                targets.push(*target);
            }
        }
        targets
    }
}

/// Execute the compose command
#[instrument(skip(args))]
pub async fn execute(args: &ComposeArgs) -> Result<(), Error> {
    let composed = compose(args).await?;
    let rendered = render(&composed, args.pretty)?;

    match &args.output {
        Some(path) => {
            fs::write(path, format!("{}\n", rendered)).map_err(Error::WriteOutput)?;
            info!(message = "Configuration written", path = ?path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

/// Runs the pipeline for the requested targets.
///
/// A single target yields its configuration tree. Several targets yield an
/// object keyed by target name.
pub async fn compose(args: &ComposeArgs) -> Result<Value, Error> {
    let file = resolve_config(args.config.as_deref())?;
    let mut config = UserConfig::from(file);
    if let Some(mode) = args.mode {
        config.mode = mode;
    }

    let mut context = BuildContext::new(config);
    if !args.no_defaults {
        presets::register_defaults(&mut context);
    }

    let targets = args.resolved_targets();
    debug!(message = "Composing configuration", targets = ?targets);
    let results = generate_configs(&targets, &context).await?;

    Ok(match <[_; 1]>::try_from(results) {
        Ok([(_, tree)]) => tree.into_value(),
        Err(results) => Value::Object(
            results
                .into_iter()
                .map(|(target, tree)| (target.as_str().to_string(), tree.into_value()))
                .collect(),
        ),
    })
}

/// Serializes the composed configuration.
pub fn render(composed: &Value, pretty: bool) -> Result<String, Error> {
    let rendered = if pretty {
        serde_json::to_string_pretty(composed)
    } else {
        serde_json::to_string(composed)
    };
    rendered.map_err(Error::Serialize)
}
