mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use sitesensor_config::Config;
use sitesensor_storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so recipe blocks on stdout stay pasteable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let config = Config::load()?;

    // Initialize storage once (creates connection pool and runs migrations)
    let storage = Storage::new(cli.database.clone().or_else(|| config.database.clone())).await?;

    match cli.command {
        cli::Commands::Device(cmd) => commands::device::handle(cmd, &storage).await,
        cli::Commands::State(cmd) => commands::state::handle(cmd, &storage).await,
        cli::Commands::Field(cmd) => commands::field::handle(cmd, &storage, &config).await,
        cli::Commands::Recipe(cmd) => commands::recipe::handle(cmd, &storage, &config).await,
        cli::Commands::Status {
            device,
            watch,
            format,
        } => commands::status::handle(&storage, device, watch, &format).await,
        cli::Commands::ChildTypes { format } => {
            commands::child_types::handle(&config, &format).await
        }
    }
}
