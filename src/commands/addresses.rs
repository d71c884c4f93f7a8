//! Addresses command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::Cache;

/// Run the addresses command, printing one address per line.
pub async fn run(code: &str, live: bool, cache_path: &Path, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    if live {
        let addresses = client.country_addresses(code).await?;
        for addr in &addresses {
            println!("{}", addr);
        }
        info!("{} address(es) for {} (live)", addresses.len(), code.to_uppercase());
        return Ok(());
    }

    let cache = Cache::load_or_fetch(cache_path, &client).await?;
    let country = cache.lookup(code)?;
    for addr in &country.addresses {
        println!("{}", addr);
    }
    info!("{} address(es) for {}", country.addresses.len(), country.name);
    Ok(())
}
