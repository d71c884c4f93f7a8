//! # countryblock - country-level IP blocking
//!
//! Blocks all network traffic from/to whole countries by pairing a
//! cached per-country IP range dataset with named firewall rules.
//! Written in Rust for memory safety and a single static binary.
//!
//! ## Features
//!
//! - **Merged dataset** - IPv4 and IPv6 lists are fetched separately and
//!   folded into one canonical, deduplicated, code-sorted cache
//! - **Canonical IPv6** - every IPv6 address is stored in shortest
//!   RFC 5952 form, so no network is ever represented twice
//! - **Name-addressed rules** - `CountryBlock-In-CH` is a rule's whole
//!   identity; no GUIDs, no handles, no orphans
//! - **Chunked rules** - long address lists split into equally-named
//!   rules of at most 1000 addresses each
//! - **Idempotent blocks** - re-blocking tears down and recreates, never
//!   stacks duplicates
//! - **Panic switch** - one command removes every rule the tool owns
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      countryblock                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: add, remove, addresses, countries,         │
//! │                  rules, refresh, panic                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Api (reqwest + rustls)                                     │
//! │    └── Provider modes: all (v=4|6), country                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Cache (serde_json)                                         │
//! │    ├── merge: v4 verbatim + v6 normalized, code-sorted      │
//! │    └── single JSON file, replaced wholesale on refresh      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Firewall (FirewallEngine trait)                            │
//! │    ├── block/unblock: chunked, name-addressed rules         │
//! │    ├── inventory: names parsed back into code + direction   │
//! │    └── NetshEngine (netsh advfirewall adapter)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use countryblock::api::ApiClient;
//! use countryblock::cache::Cache;
//! use countryblock::firewall::{self, Direction};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load the country dataset, building it on first use
//!     let client = ApiClient::new(countryblock::api::DEFAULT_API_URL)?;
//!     let cache = Cache::load_or_fetch(Path::new("cache.json"), &client).await?;
//!
//!     // Block one country in both directions
//!     let country = cache.lookup("CH")?;
//!     let engine = firewall::create_engine()?;
//!     firewall::block_country(
//!         engine.as_ref(),
//!         &country.code,
//!         &country.addresses,
//!         Direction::Both,
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Concurrent invocations are not guarded against; run one countryblock
//! at a time.
//!
//! ## Modules
//!
//! - [`api`] - HTTP client for the country IP list provider
//! - [`cache`] - dataset merge and JSON persistence
//! - [`cli`] - command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`error`] - error taxonomy
//! - [`firewall`] - rule synchronizer, inventory and engine adapter
//! - [`normalize`] - canonical IP address rendering

pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod error;
pub mod firewall;
pub mod normalize;

pub use cli::{Cli, Commands};
pub use error::Error;
