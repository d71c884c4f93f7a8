//! Rules command implementation.

use anyhow::Result;

use crate::firewall;

/// Run the rules command, printing `CODE=Direction` lines.
pub async fn run() -> Result<()> {
    let engine = firewall::create_engine()?;
    let blocked = firewall::blocked_countries(engine.as_ref()).await?;

    if blocked.is_empty() {
        println!("No blocked countries");
        return Ok(());
    }
    for (code, direction) in &blocked {
        println!("{}={}", code, direction);
    }
    Ok(())
}
