//! Add (block) command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::api::ApiClient;
use crate::cache::Cache;
use crate::firewall::{self, Direction};

/// Run the add command
pub async fn run(code: &str, direction: Direction, cache_path: &Path, api_url: &str) -> Result<()> {
    if code.eq_ignore_ascii_case("all") {
        anyhow::bail!("Blocking every country would cut this machine off; pick a country code");
    }

    let client = ApiClient::new(api_url)?;
    let cache = Cache::load_or_fetch(cache_path, &client).await?;
    let country = cache.lookup(code)?;

    info!(
        "Blocking {} ({} addresses)...",
        country.name,
        country.addresses.len()
    );

    let engine = firewall::create_engine()?;
    firewall::block_country(engine.as_ref(), &country.code, &country.addresses, direction).await?;

    println!("[OK] {} blocked ({})", country.name, direction);
    Ok(())
}
