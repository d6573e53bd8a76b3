//! xporter CLI entry point.

use clap::Parser;

use xporter::cli::commands::{self, load_config};
use xporter::cli::{handle_error, Cli, Commands};
use xporter::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging)
        .map_err(anyhow::Error::msg)
        .and_then(|log_config| LoggerImpl::init(&log_config))
    {
        Ok(logger) => logger,
        Err(err) => handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Report(args) => commands::report::execute(args, config, cli.json).await,
        Commands::Merge(args) => commands::merge::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
