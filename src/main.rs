//! countryblock - block whole countries at the firewall.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use countryblock::cache::Cache;
use countryblock::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cache_path = cli.cache.clone().unwrap_or_else(Cache::default_path);

    match cli.command {
        Commands::Add { code, dir } => {
            countryblock::commands::add::run(&code, dir, &cache_path, &cli.api_url).await
        }
        Commands::Remove { code, dir } => {
            countryblock::commands::remove::run(&code, dir, &cache_path).await
        }
        Commands::Addresses { code, live } => {
            countryblock::commands::addresses::run(&code, live, &cache_path, &cli.api_url).await
        }
        Commands::Countries => {
            countryblock::commands::countries::run(&cache_path, &cli.api_url).await
        }
        Commands::Rules => countryblock::commands::rules::run().await,
        Commands::Refresh => {
            countryblock::commands::refresh::run(&cache_path, &cli.api_url).await
        }
        Commands::Panic => countryblock::commands::panic::run().await,
    }
}
