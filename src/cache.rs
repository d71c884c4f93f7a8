//! Country address cache: merge and persistence.
//!
//! The provider serves IPv4 and IPv6 lists separately. `merge` folds the
//! two into one entry per country, IPv4 addresses first, and the result
//! is persisted as a single JSON file. The file is replaced wholesale on
//! refresh and never patched in place; a half-built dataset must not
//! reach disk.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, IpVersion};
use crate::error::Error;
use crate::normalize::{normalize, normalize_all};

const CACHE_FILE: &str = "cache.json";

/// Cache files older than this earn an advisory warning on load.
pub const STALE_AFTER_DAYS: i64 = 180;

/// One country's addresses for a single IP version, exactly as the
/// provider returns them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawCountry {
    pub code: String,
    pub name: String,
    #[serde(rename = "addr")]
    pub addresses: Vec<String>,
}

/// One country's merged address list. Constructed once during a merge
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub code: String,
    pub name: String,
    #[serde(rename = "addr")]
    pub addresses: Vec<String>,
}

impl CountryEntry {
    fn new(code: &str, name: String, mut addresses: Vec<String>) -> Self {
        // Two spellings of one network must not both survive; inputs are
        // canonical by this point, so string equality is enough.
        let mut seen = HashSet::with_capacity(addresses.len());
        addresses.retain(|addr| seen.insert(addr.clone()));
        Self {
            code: code.to_string(),
            name,
            addresses,
        }
    }
}

/// Fold separately-fetched IPv4 and IPv6 lists into one entry per
/// country, sorted ascending by code.
///
/// IPv4 addresses pass through verbatim and lead each entry; IPv6
/// addresses are normalized and appended. Where both versions name a
/// country, the IPv4 name wins. Fails only when both inputs are empty:
/// a single dead version still yields a usable cache.
pub fn merge(v4: &[RawCountry], v6: &[RawCountry]) -> Result<Vec<CountryEntry>, Error> {
    if v4.is_empty() && v6.is_empty() {
        return Err(Error::Merge);
    }

    let mut slots: BTreeMap<&str, (Option<&RawCountry>, Option<&RawCountry>)> = BTreeMap::new();
    for entry in v4 {
        if entry.code.is_empty() {
            warn!("Skipping IPv4 entry with empty country code ({})", entry.name);
            continue;
        }
        let slot = slots.entry(entry.code.as_str()).or_default();
        if slot.0.is_none() {
            slot.0 = Some(entry);
        }
    }
    for entry in v6 {
        if entry.code.is_empty() {
            warn!("Skipping IPv6 entry with empty country code ({})", entry.name);
            continue;
        }
        let slot = slots.entry(entry.code.as_str()).or_default();
        if slot.1.is_none() {
            slot.1 = Some(entry);
        }
    }

    let mut merged = Vec::with_capacity(slots.len());
    for (code, slot) in slots {
        let entry = match slot {
            (Some(four), Some(six)) => {
                let mut addresses = four.addresses.clone();
                for addr in &six.addresses {
                    addresses.push(normalize(addr)?);
                }
                CountryEntry::new(code, four.name.clone(), addresses)
            }
            (Some(four), None) => {
                CountryEntry::new(code, four.name.clone(), four.addresses.clone())
            }
            (None, Some(six)) => {
                CountryEntry::new(code, six.name.clone(), normalize_all(&six.addresses)?)
            }
            (None, None) => unreachable!(),
        };
        merged.push(entry);
    }
    Ok(merged)
}

/// Loaded country dataset. Immutable once constructed; a refresh builds
/// a whole new one.
#[derive(Debug, Clone)]
pub struct Cache {
    entries: Vec<CountryEntry>,
}

impl Cache {
    /// Default cache location: `cache.json` next to the executable.
    pub fn default_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CACHE_FILE)
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive lookup by country code.
    pub fn find(&self, code: &str) -> Option<&CountryEntry> {
        self.entries
            .iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(code))
    }

    /// Like [`find`](Self::find), but an absent code is an error.
    pub fn lookup(&self, code: &str) -> Result<&CountryEntry, Error> {
        self.find(code)
            .ok_or_else(|| Error::UnknownCountry(code.to_uppercase()))
    }

    /// Load the persisted cache. A file that exists but does not parse
    /// is a hard error; it is never silently rebuilt.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache file: {:?}", path))?;
        let entries: Vec<CountryEntry> = serde_json::from_str(&content).with_context(|| {
            format!(
                "Cache file {:?} is corrupt; delete it or run 'refresh'",
                path
            )
        })?;
        Ok(Self { entries })
    }

    /// Write the cache atomically (temp file in the same directory, then
    /// rename). Refuses to write an empty dataset over a valid file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.entries.is_empty() {
            anyhow::bail!("Refusing to write an empty cache to {:?}", path);
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let content = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize cache")?;

        let mut temp_file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write cache contents")?;
        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist cache file: {:?}", path))?;

        debug!("Wrote {} countries to {:?}", self.entries.len(), path);
        Ok(())
    }

    /// Fetch both IP versions and merge. A version that fails to fetch
    /// degrades to an empty list; the merge still fails when neither
    /// version produced data.
    pub async fn fetch(client: &ApiClient) -> Result<Self> {
        let v4 = match client.raw_entries(IpVersion::V4).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("IPv4 list unavailable: {}", e);
                Vec::new()
            }
        };
        let v6 = match client.raw_entries(IpVersion::V6).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("IPv6 list unavailable: {}", e);
                Vec::new()
            }
        };

        let entries = merge(&v4, &v6)?;
        info!(
            "Merged {} countries ({} IPv4 entries, {} IPv6 entries)",
            entries.len(),
            v4.len(),
            v6.len()
        );
        Ok(Self { entries })
    }

    /// Load the persisted cache, or build and persist one if the file
    /// does not exist yet.
    pub async fn load_or_fetch(path: &Path, client: &ApiClient) -> Result<Self> {
        if path.exists() {
            let cache = Self::load(path)?;
            if let Some(age) = Self::age_days(path) {
                if age > STALE_AFTER_DAYS {
                    warn!(
                        "Cache file is {} days old; run 'refresh' to update it",
                        age
                    );
                }
            }
            debug!("Loaded {} countries from {:?}", cache.len(), path);
            return Ok(cache);
        }

        info!("No cache file at {:?}, fetching country lists...", path);
        let cache = Self::fetch(client).await?;
        cache.save(path)?;
        Ok(cache)
    }

    /// Age of the cache file in days, from its modification time.
    pub fn age_days(path: &Path) -> Option<i64> {
        let modified = fs::metadata(path).ok()?.modified().ok()?;
        let modified: DateTime<Utc> = modified.into();
        Some(Utc::now().signed_duration_since(modified).num_days())
    }
}
