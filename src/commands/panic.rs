//! Panic command implementation.

use anyhow::Result;
use tracing::warn;

use crate::firewall;

/// Run the panic command: strip every rule carrying the tool prefix,
/// regardless of country or direction.
pub async fn run() -> Result<()> {
    warn!("Removing every {} rule", firewall::RULE_PREFIX);

    let engine = firewall::create_engine()?;
    let removed = firewall::remove_all_rules(engine.as_ref()).await?;

    println!("[OK] Removed {} rule(s)", removed);
    Ok(())
}
