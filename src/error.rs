//! Error types for countryblock.

use thiserror::Error;

use crate::firewall::Direction;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider request failed: {0}")]
    Fetch(String),

    #[error("Invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("No usable country data from either IP version")]
    Merge,

    #[error("Unknown country code: {0}")]
    UnknownCountry(String),

    #[error("Firewall engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Firewall engine call failed: {0}")]
    Engine(String),

    #[error("Failed to create rule for {code} ({direction}), chunk {chunk} of {chunks}: {reason}")]
    RuleCreation {
        code: String,
        direction: Direction,
        chunk: usize,
        chunks: usize,
        reason: String,
    },
}
