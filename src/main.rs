//! Conductor CLI entry point.

use clap::Parser;

use conductor::cli::{run, Cli};
use conductor::infrastructure::{logging, ConfigLoader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_ref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(2);
        }
    };

    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging setup error: {err:#}");
        std::process::exit(2);
    }

    if let Err(err) = run(cli.command, config, cli.json).await {
        if cli.json {
            eprintln!("{}", serde_json::json!({ "error": format!("{err:#}") }));
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}
