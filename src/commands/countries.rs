//! Countries command implementation.

use anyhow::Result;
use std::path::Path;

use crate::api::ApiClient;
use crate::cache::Cache;

/// Run the countries command, printing `CODE=Name` lines.
pub async fn run(cache_path: &Path, api_url: &str) -> Result<()> {
    let client = ApiClient::new(api_url)?;
    let cache = Cache::load_or_fetch(cache_path, &client).await?;

    for entry in cache.entries() {
        println!("{}={}", entry.code, entry.name);
    }
    Ok(())
}
