//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::api::DEFAULT_API_URL;
use crate::firewall::Direction;

#[derive(Parser)]
#[command(name = "countryblock")]
#[command(author, version, about = "Block whole countries at the firewall")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Cache file path (defaults to cache.json next to the executable)
    #[arg(long, global = true)]
    pub cache: Option<PathBuf>,

    /// Base URL of the IP list provider
    #[arg(long, global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Block a country's addresses
    Add {
        /// Two-letter country code
        code: String,

        /// Direction to block
        #[arg(long, value_enum, default_value_t = Direction::Both)]
        dir: Direction,
    },

    /// Unblock a country, or ALL for every blocked country
    Remove {
        /// Two-letter country code, or ALL
        code: String,

        /// Direction to unblock
        #[arg(long, value_enum, default_value_t = Direction::Both)]
        dir: Direction,
    },

    /// Show a country's cached addresses
    Addresses {
        /// Two-letter country code
        code: String,

        /// Query the provider instead of the cache
        #[arg(long)]
        live: bool,
    },

    /// List cached countries
    Countries,

    /// List blocked countries and their directions
    Rules,

    /// Rebuild the cache from the provider
    Refresh,

    /// Remove every firewall rule this tool has created
    Panic,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_add_defaults_to_both() {
        let cli = Cli::try_parse_from(["countryblock", "add", "CH"]).unwrap();
        match cli.command {
            Commands::Add { code, dir } => {
                assert_eq!(code, "CH");
                assert_eq!(dir, Direction::Both);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_add_with_direction() {
        let cli = Cli::try_parse_from(["countryblock", "add", "ch", "--dir", "in"]).unwrap();
        match cli.command {
            Commands::Add { code, dir } => {
                assert_eq!(code, "ch");
                assert_eq!(dir, Direction::In);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_cli_remove_all() {
        let cli = Cli::try_parse_from(["countryblock", "remove", "ALL", "--dir", "out"]).unwrap();
        match cli.command {
            Commands::Remove { code, dir } => {
                assert_eq!(code, "ALL");
                assert_eq!(dir, Direction::Out);
            }
            _ => panic!("Expected Remove command"),
        }
    }

    #[test]
    fn test_cli_addresses_live_flag() {
        let cli = Cli::try_parse_from(["countryblock", "addresses", "CH", "--live"]).unwrap();
        match cli.command {
            Commands::Addresses { code, live } => {
                assert_eq!(code, "CH");
                assert!(live);
            }
            _ => panic!("Expected Addresses command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_direction() {
        assert!(Cli::try_parse_from(["countryblock", "add", "CH", "--dir", "sideways"]).is_err());
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "countryblock",
            "-q",
            "-v",
            "--cache",
            "/tmp/cache.json",
            "--api-url",
            "http://localhost:8080/api.php",
            "rules",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert!(cli.verbose);
        assert_eq!(cli.cache.as_deref().unwrap().to_str().unwrap(), "/tmp/cache.json");
        assert_eq!(cli.api_url, "http://localhost:8080/api.php");
    }

    #[test]
    fn test_cli_default_api_url() {
        let cli = Cli::try_parse_from(["countryblock", "countries"]).unwrap();
        assert_eq!(cli.api_url, DEFAULT_API_URL);
        assert!(cli.cache.is_none());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["countryblock"]).is_err());
    }
}
