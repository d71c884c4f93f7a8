//! Refresh command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::Cache;

/// Run the refresh command: fetch both IP versions, merge and replace
/// the cache file wholesale.
pub async fn run(cache_path: &Path, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;

    info!("Fetching country lists...");
    let cache = Cache::fetch(&client).await?;
    cache.save(cache_path)?;

    println!(
        "[OK] Cache refreshed: {} countries in {}",
        cache.len(),
        cache_path.display()
    );
    Ok(())
}
