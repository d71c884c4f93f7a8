//! Remove (unblock) command implementation.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::cache::Cache;
use crate::firewall::{self, Direction};

/// Run the remove command. `ALL` unblocks every currently blocked
/// country; unblocking needs no address list, so the cache is only
/// consulted for a friendly display name.
pub async fn run(code: &str, direction: Direction, cache_path: &Path) -> Result<()> {
    let engine = firewall::create_engine()?;

    if code.eq_ignore_ascii_case("all") {
        let blocked = firewall::blocked_countries(engine.as_ref()).await?;
        if blocked.is_empty() {
            println!("No blocked countries");
            return Ok(());
        }
        for blocked_code in blocked.keys() {
            info!("Unblocking {}...", blocked_code);
            firewall::unblock_country(engine.as_ref(), blocked_code, direction).await?;
        }
        println!("[OK] {} countries unblocked ({})", blocked.len(), direction);
        return Ok(());
    }

    // Not `display`: tracing macros shadow that name with their field helper.
    let friendly = Cache::load(cache_path)
        .ok()
        .and_then(|cache| cache.find(code).map(|entry| entry.name.clone()))
        .unwrap_or_else(|| code.to_uppercase());

    info!("Unblocking {}...", friendly);
    firewall::unblock_country(engine.as_ref(), code, direction).await?;

    println!("[OK] {} unblocked ({})", friendly, direction);
    Ok(())
}
