use clap::{Parser, Subcommand};
use config_composer_cli::commands::{
    compose_cmd::{self, ComposeArgs},
    targets_cmd,
};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// config-composer CLI: compose bundler configurations from hooks and overrides
#[derive(Parser)]
#[command(name = "config-composer")]
#[command(about = "Compose bundler configurations for one or more build targets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configuration pipeline and print the result
    #[command()]
    Compose(ComposeArgs),

    /// List the supported build targets
    Targets,

    /// Show the CLI version
    Version,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so the composed configuration can be piped.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CONFIG_COMPOSER_LOG"))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Compose(args) => {
            if let Err(e) = compose_cmd::execute(args).await {
                error!("Error: {e}");
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Targets => targets_cmd::execute(),
        Commands::Version => {
            println!(
                "config-composer version {}",
                option_env!("CONFIG_COMPOSER_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
        }
    }
}
