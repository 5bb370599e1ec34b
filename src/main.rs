use anyhow::Context;
use clap::Parser;

use httpware::cli::Cli;
use httpware::logger::init_logger;
use httpware::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli.load_settings().context("Failed to load configuration")?;

    if cli.dry_run {
        println!("Configuration is valid");
        println!("Server would bind to: {}", settings.server.address());
        return Ok(());
    }

    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(logger_config).context("Failed to initialize logger")?;

    Server::new(settings).run().await
}
