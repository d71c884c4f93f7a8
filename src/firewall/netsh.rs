//! netsh advfirewall adapter.
//!
//! Drives the Windows Advanced Firewall through `netsh advfirewall
//! firewall`. Everything a [`RuleSpec`] leaves open is pinned here:
//! block action, enabled, every profile and interface type, any
//! protocol, unrestricted local addresses.

use async_trait::async_trait;
use ipnet::IpNet;
use std::net::IpAddr;
use std::process::{Command, Output};
use tracing::debug;

use super::{Direction, FirewallEngine, RuleInfo, RuleSpec};
use crate::error::Error;

pub struct NetshEngine;

impl NetshEngine {
    /// Probe the engine before any mutation. A machine without a
    /// reachable firewall service fails here, not halfway through a
    /// block.
    pub fn detect() -> Result<Self, Error> {
        let output = Command::new("netsh")
            .args(["advfirewall", "show", "currentprofile"])
            .output()
            .map_err(|e| Error::EngineUnavailable(format!("Failed to execute netsh: {}", e)))?;

        if !output.status.success() {
            return Err(Error::EngineUnavailable(failure_text(&output)));
        }
        Ok(Self)
    }
}

#[async_trait]
impl FirewallEngine for NetshEngine {
    async fn add_rule(&self, rule: &RuleSpec) -> Result<(), Error> {
        for addr in &rule.remote_addresses {
            if !is_safe_remote_address(addr) {
                return Err(Error::Engine(format!(
                    "Refusing to pass unparseable address to netsh: {}",
                    addr
                )));
            }
        }

        let dir = match rule.direction {
            Direction::In => "in",
            Direction::Out => "out",
            Direction::Both => {
                return Err(Error::Engine(
                    "Rules are created per single direction".to_string(),
                ))
            }
        };

        let name = format!("name={}", rule.name);
        let dir = format!("dir={}", dir);
        let remote = format!("remoteip={}", rule.remote_addresses.join(","));
        let description = format!("description={}", rule.description);

        run_netsh(&[
            "advfirewall",
            "firewall",
            "add",
            "rule",
            name.as_str(),
            dir.as_str(),
            "action=block",
            "enable=yes",
            "profile=any",
            "interfacetype=any",
            "protocol=any",
            "localip=any",
            remote.as_str(),
            description.as_str(),
        ])?;
        Ok(())
    }

    async fn remove_rules_by_name(&self, name: &str) -> Result<usize, Error> {
        // netsh has no "delete if present": deleting a name that matches
        // nothing exits non-zero. Count matches first so absence stays a
        // clean zero; one delete call then sweeps every match.
        let matching = self
            .list_rules()
            .await?
            .into_iter()
            .filter(|rule| rule.name == name)
            .count();
        if matching == 0 {
            return Ok(0);
        }

        let name = format!("name={}", name);
        run_netsh(&["advfirewall", "firewall", "delete", "rule", name.as_str()])?;
        Ok(matching)
    }

    async fn list_rules(&self) -> Result<Vec<RuleInfo>, Error> {
        let listing = run_netsh(&["advfirewall", "firewall", "show", "rule", "name=all"])?;
        Ok(parse_rule_listing(&listing))
    }
}

/// A remote address must parse as an IP literal or CIDR before it goes
/// on a netsh command line; anything else would build a rule that
/// matches nothing while looking like protection.
fn is_safe_remote_address(addr: &str) -> bool {
    addr.parse::<IpNet>().is_ok() || addr.parse::<IpAddr>().is_ok()
}

fn run_netsh(args: &[&str]) -> Result<String, Error> {
    debug!("netsh {} {} ...", args[0], args.get(2).unwrap_or(&""));

    let output = Command::new("netsh")
        .args(args)
        .output()
        .map_err(|e| Error::EngineUnavailable(format!("Failed to execute netsh: {}", e)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        Err(Error::Engine(format!(
            "netsh {} failed: {}",
            args.get(2).unwrap_or(&""),
            failure_text(&output)
        )))
    }
}

/// netsh reports most errors on stdout, not stderr.
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout)
    } else {
        stderr
    };
    text.trim().to_string()
}

/// Parse `netsh advfirewall firewall show rule` output.
///
/// Records look like:
///
/// ```text
/// Rule Name:                            CountryBlock-In-CH
/// ----------------------------------------------------------------------
/// Enabled:                              Yes
/// Direction:                            In
/// Profiles:                             Domain,Private,Public
/// ```
///
/// Only the English field labels are recognized.
fn parse_rule_listing(listing: &str) -> Vec<RuleInfo> {
    let mut rules = Vec::new();
    let mut current: Option<String> = None;

    for line in listing.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Rule Name:") {
            current = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("Direction:") {
            let direction = match rest.trim() {
                "In" => Direction::In,
                "Out" => Direction::Out,
                _ => continue,
            };
            if let Some(name) = current.take() {
                rules.push(RuleInfo { name, direction });
            }
        }
    }

    rules
}
