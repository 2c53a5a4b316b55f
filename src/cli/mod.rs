//! CLI type definitions and command dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::domain::models::Config;

#[derive(Parser)]
#[command(name = "conductor")]
#[command(about = "Conductor - confidence-scored task router and workflow engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a configuration file (defaults to .conductor/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Route a request and run the detected workflow
    Dispatch {
        /// The request text (positional argument)
        text: String,

        /// Aggregation strategy: comprehensive, summary, or errors_only
        #[arg(short, long, default_value = "comprehensive")]
        strategy: String,

        /// Print the per-worker metrics summary after the run
        #[arg(long)]
        metrics: bool,
    },

    /// Score a request against the routing rules without executing anything
    Route {
        /// The request text (positional argument)
        text: String,
    },

    /// List the registered workers
    Workers,

    /// Show the effective configuration after merging
    Config,
}

/// Run a parsed command against a loaded configuration.
pub async fn run(command: Commands, config: Config, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Dispatch {
            text,
            strategy,
            metrics,
        } => commands::dispatch::execute(&text, &strategy, metrics, config, json).await,
        Commands::Route { text } => commands::route::execute(&text, config, json),
        Commands::Workers => commands::workers::execute(json),
        Commands::Config => commands::config::execute(&config, json),
    }
}
