use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod api;
mod build;
mod commands;
mod config;
mod markdown;
mod plugins;
mod site;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: QuireCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "quire.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind to
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// The port to bind to
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Open the site in the default browser
    #[arg(short, long, default_value = "false")]
    open: bool,

    /// The path to the configuration file
    #[arg(short, long, default_value = "quire.yaml")]
    config_file: Option<PathBuf>,

    /// Whether to watch for changes and rebuild automatically
    #[arg(short, long, default_value = "true", action = clap::ArgAction::Set)]
    watch: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "quire.yaml")]
    config_file: Option<PathBuf>,

    /// Print what would be deleted without deleting it
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Subcommand)]
enum QuireCommand {
    /// Build the site
    Build(BuildArgs),

    /// Build and serve the site on a local port, with the API mounted
    Serve(ServeArgs),

    /// Delete the generated site
    Clean(CleanArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quire=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        QuireCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        QuireCommand::Serve(args) => {
            commands::serve::run(&args).await?;
        }
        QuireCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
    }

    Ok(())
}
