//! Firewall rule management for country blocks.
//!
//! Every rule this tool creates is identified purely by name:
//! `CountryBlock-In-CH` says everything there is to know. No GUIDs or
//! handles are tracked, so rules survive across runs and can always be
//! found again. Engines cap how many remote addresses one rule may
//! carry, so a country block is a run of equally-named rules of at most
//! [`MAX_ADDRESSES_PER_RULE`] addresses each; deletion by name sweeps
//! the whole run at once.

mod netsh;

use async_trait::async_trait;
use clap::ValueEnum;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, error, info, warn};

pub use netsh::NetshEngine;

use crate::error::Error;

/// Name prefix identifying rules owned by this tool.
pub const RULE_PREFIX: &str = "CountryBlock";

/// Upper bound on remote addresses per rule; longer lists are split
/// into consecutive, equally-named rules.
pub const MAX_ADDRESSES_PER_RULE: usize = 1000;

/// Traffic direction a block applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    /// The single directions this covers. `Both` expands to In then Out;
    /// rules themselves only ever exist per single direction.
    pub fn singles(self) -> Vec<Direction> {
        match self {
            Direction::Both => vec![Direction::In, Direction::Out],
            single => vec![single],
        }
    }

    /// Aggregate two observed directions for one country.
    pub fn combine(self, other: Direction) -> Direction {
        if self == other {
            self
        } else {
            Direction::Both
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::In => "In",
            Direction::Out => "Out",
            Direction::Both => "Both",
        })
    }
}

/// Full description of one rule to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub name: String,
    pub direction: Direction,
    pub description: String,
    pub remote_addresses: Vec<String>,
}

/// Name and direction of an existing rule, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub name: String,
    pub direction: Direction,
}

/// Derive the rule name for a country and a single direction.
pub fn rule_name(direction: Direction, code: &str) -> String {
    debug_assert!(direction != Direction::Both);
    format!("{}-{}-{}", RULE_PREFIX, direction, code.to_uppercase())
}

/// Extract the country code from a rule name, or `None` when the rule
/// is not ours. The code is the last `-`-delimited token, uppercased.
fn country_code(name: &str) -> Option<String> {
    let rest = name.strip_prefix(RULE_PREFIX)?;
    let rest = rest.strip_prefix('-')?;
    rest.rsplit('-').next().map(str::to_uppercase)
}

/// Narrow interface onto the platform firewall. Three calls cover
/// everything the tool does; anything richer would tie the block logic
/// to one engine.
#[async_trait]
pub trait FirewallEngine: Send + Sync {
    /// Create one rule. The engine pins everything a [`RuleSpec`]
    /// leaves open: block action, enabled, all profiles and interface
    /// types, any protocol, unrestricted local addresses.
    async fn add_rule(&self, rule: &RuleSpec) -> Result<(), Error>;

    /// Remove every rule carrying exactly this name. Returns how many
    /// were removed; zero matches is success, not an error.
    async fn remove_rules_by_name(&self, name: &str) -> Result<usize, Error>;

    /// Enumerate all rules currently present, ours or not.
    async fn list_rules(&self) -> Result<Vec<RuleInfo>, Error>;
}

/// Open a handle to the platform engine. Called once per logical
/// operation; handles are never cached across operations.
pub fn create_engine() -> Result<Box<dyn FirewallEngine>, Error> {
    Ok(Box::new(NetshEngine::detect()?))
}

/// Remove a country's rules in the given direction(s).
///
/// Deletion goes by derived name until nothing matches; a country that
/// was never blocked removes zero rules and still succeeds. With
/// `Both`, each direction is attempted even if the other fails, and the
/// first failure is reported after both passes.
pub async fn unblock_country(
    engine: &dyn FirewallEngine,
    code: &str,
    direction: Direction,
) -> Result<(), Error> {
    let code = code.to_uppercase();
    let mut failure = None;

    for dir in direction.singles() {
        let name = rule_name(dir, &code);
        match engine.remove_rules_by_name(&name).await {
            Ok(0) => debug!("No {} rules for {}", dir, code),
            Ok(removed) => info!("Removed {} {} rule(s) for {}", removed, dir, code),
            Err(e) => {
                error!("Failed to remove {} rules for {}: {}", dir, code, e);
                failure.get_or_insert(e);
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Block a country's addresses in the given direction(s).
///
/// Existing rules for the code/direction are torn down first, then the
/// address list is recreated in consecutive chunks that preserve its
/// order. A chunk failure stops that direction and leaves the already
/// created chunks in place; re-running block (or unblock) converges.
pub async fn block_country(
    engine: &dyn FirewallEngine,
    code: &str,
    addresses: &[String],
    direction: Direction,
) -> Result<(), Error> {
    let code = code.to_uppercase();
    let mut failure = None;

    for dir in direction.singles() {
        if let Err(e) = block_single(engine, &code, addresses, dir).await {
            error!("Blocking {} ({}) failed: {}", code, dir, e);
            failure.get_or_insert(e);
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn block_single(
    engine: &dyn FirewallEngine,
    code: &str,
    addresses: &[String],
    direction: Direction,
) -> Result<(), Error> {
    let name = rule_name(direction, code);

    // Tear down first so a re-block never stacks stale chunks.
    let removed = engine.remove_rules_by_name(&name).await?;
    if removed > 0 {
        debug!("Replacing {} existing {} rule(s) for {}", removed, direction, code);
    }

    if addresses.is_empty() {
        warn!("{} has no addresses; nothing to block", code);
        return Ok(());
    }

    let chunks = addresses.len().div_ceil(MAX_ADDRESSES_PER_RULE);
    for (index, chunk) in addresses.chunks(MAX_ADDRESSES_PER_RULE).enumerate() {
        let rule = RuleSpec {
            name: name.clone(),
            direction,
            description: format!("Blocking all IP addresses of the country {}", code),
            remote_addresses: chunk.to_vec(),
        };
        engine
            .add_rule(&rule)
            .await
            .map_err(|e| Error::RuleCreation {
                code: code.to_string(),
                direction,
                chunk: index,
                chunks,
                reason: e.to_string(),
            })?;
        debug!(
            "Created rule {} chunk {}/{} ({} addresses)",
            name,
            index + 1,
            chunks,
            chunk.len()
        );
    }

    info!(
        "Blocked {} ({}): {} address(es) in {} rule(s)",
        code,
        direction,
        addresses.len(),
        chunks
    );
    Ok(())
}

/// Countries currently blocked, keyed by code.
///
/// Any rule named `CountryBlock-...` counts, whatever created it. The
/// direction comes from the rule itself, not its name; a code seen with
/// both In and Out rules reports `Both`, and chunk duplicates collapse.
pub async fn blocked_countries(
    engine: &dyn FirewallEngine,
) -> Result<BTreeMap<String, Direction>, Error> {
    let mut blocked = BTreeMap::new();

    for rule in engine.list_rules().await? {
        let Some(code) = country_code(&rule.name) else {
            continue;
        };
        blocked
            .entry(code)
            .and_modify(|dir: &mut Direction| *dir = dir.combine(rule.direction))
            .or_insert(rule.direction);
    }

    Ok(blocked)
}

/// Remove every rule carrying the tool prefix, whatever its code or
/// direction. Returns how many rules went away.
pub async fn remove_all_rules(engine: &dyn FirewallEngine) -> Result<usize, Error> {
    let names: BTreeSet<String> = engine
        .list_rules()
        .await?
        .into_iter()
        .filter(|rule| country_code(&rule.name).is_some())
        .map(|rule| rule.name)
        .collect();

    let mut removed = 0;
    for name in names {
        let count = engine.remove_rules_by_name(&name).await?;
        info!("Removed {} rule(s) named {}", count, name);
        removed += count;
    }
    Ok(removed)
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// In-memory engine for tests.
    pub struct MockEngine {
        pub rules: Mutex<Vec<RuleSpec>>,
        /// When set, the nth add_rule call since construction fails.
        pub fail_add_at: Mutex<Option<usize>>,
        adds: Mutex<usize>,
    }

    impl MockEngine {
        pub fn new() -> Self {
            Self {
                rules: Mutex::new(Vec::new()),
                fail_add_at: Mutex::new(None),
                adds: Mutex::new(0),
            }
        }

        pub fn insert(&self, name: &str, direction: Direction) {
            self.rules.lock().unwrap().push(RuleSpec {
                name: name.to_string(),
                direction,
                description: String::new(),
                remote_addresses: Vec::new(),
            });
        }

        pub fn names(&self) -> Vec<String> {
            self.rules
                .lock()
                .unwrap()
                .iter()
                .map(|rule| rule.name.clone())
                .collect()
        }

        pub fn all_addresses(&self) -> Vec<String> {
            self.rules
                .lock()
                .unwrap()
                .iter()
                .flat_map(|rule| rule.remote_addresses.clone())
                .collect()
        }
    }

    #[async_trait]
    impl FirewallEngine for MockEngine {
        async fn add_rule(&self, rule: &RuleSpec) -> Result<(), Error> {
            let mut adds = self.adds.lock().unwrap();
            let call = *adds;
            *adds += 1;
            if Some(call) == *self.fail_add_at.lock().unwrap() {
                return Err(Error::Engine("simulated add failure".to_string()));
            }
            self.rules.lock().unwrap().push(rule.clone());
            Ok(())
        }

        async fn remove_rules_by_name(&self, name: &str) -> Result<usize, Error> {
            let mut rules = self.rules.lock().unwrap();
            let before = rules.len();
            rules.retain(|rule| rule.name != name);
            Ok(before - rules.len())
        }

        async fn list_rules(&self) -> Result<Vec<RuleInfo>, Error> {
            Ok(self
                .rules
                .lock()
                .unwrap()
                .iter()
                .map(|rule| RuleInfo {
                    name: rule.name.clone(),
                    direction: rule.direction,
                })
                .collect())
        }
    }
}
