//! CLI Module
//!
//! Operator front end for the transient store. One-shot commands work against
//! the file-backed option table; `serve` starts the HTTP API on top of it.

mod output;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

pub use output::{
    expiration_label, humanize, parse_value, render_listing, render_value, Console, Format,
};

use crate::transient::{Scope, Transients};

const AFTER_HELP: &str = "\
EXAMPLES:
  transient set feed_cache '<rss/>' 3600      Set a transient for one hour
  transient get feed_cache                    Read it back
  transient update feed_cache '<rss v2/>'     Change it, keeping its expiry
  transient get --all --network               List network transients
  transient delete --all                      Delete every local transient
  transient clean                             Reclaim expired transients
  transient serve --port 8080                 Run the HTTP API";

#[derive(Debug, Parser)]
#[command(name = "transient")]
#[command(version)]
#[command(about = "Durable key-value store with expiring entries")]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Option table file (overrides DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose/debug output for any command
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Get a transient value, or list them all
    ///
    /// Examples:
    ///   transient get feed_cache
    ///   transient get feed_cache --format=json
    ///   transient get --all --network
    Get {
        /// Key of the transient
        key: Option<String>,
        /// List every transient in the scope
        #[arg(long, conflicts_with = "key")]
        all: bool,
        /// Use the network scope
        #[arg(long)]
        network: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Plain)]
        format: Format,
    },
    /// Set a transient, optionally expiring after N seconds
    ///
    /// An existing transient keeps its current expiry unless a new
    /// non-zero expiration is given.
    Set {
        key: String,
        value: String,
        /// Seconds until expiry; 0 means none
        #[arg(default_value_t = 0)]
        expiration: u64,
        #[arg(long)]
        network: bool,
        /// Parse `value` as json or yaml instead of storing it as a string
        #[arg(long, value_enum, default_value_t = Format::Plain)]
        format: Format,
    },
    /// Update a transient's value, keeping its current expiry
    ///
    /// Creates the transient with `expiration` if it does not exist.
    Update {
        key: String,
        value: String,
        /// Seconds until expiry, used only when the transient is created
        #[arg(default_value_t = 0)]
        expiration: u64,
        #[arg(long)]
        network: bool,
        #[arg(long, value_enum, default_value_t = Format::Plain)]
        format: Format,
    },
    /// Delete a transient, or every transient in the scope
    Delete {
        key: Option<String>,
        #[arg(long, conflicts_with = "key")]
        all: bool,
        #[arg(long)]
        network: bool,
    },
    /// Reclaim transients that expired over a minute ago, in both scopes
    Clean,
    /// Serve the HTTP API with a periodic sweep
    Serve {
        /// Port for the HTTP server (overrides SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Runs a one-shot command against `transients`.
///
/// Returns an error for outcomes that should exit non-zero.
pub fn execute(
    command: &Commands,
    transients: &Transients,
    console: &mut Console<'_>,
) -> Result<()> {
    match command {
        Commands::Get {
            key,
            all,
            network,
            format,
        } => {
            let store = transients.scope(Scope::from_network(*network));
            if *all {
                let format = if *format == Format::Plain {
                    Format::Table
                } else {
                    *format
                };
                let rendered = render_listing(store.list(), transients.now(), format)?;
                console.line(&rendered)?;
                return Ok(());
            }

            let Some(key) = key else {
                bail!("Please specify transient key, or use --all.");
            };
            match store.get(key) {
                Some(value) => console.line(&render_value(&value, *format)?)?,
                None => console.warning(&format!("Transient with key \"{key}\" is not set."))?,
            }
        }

        Commands::Set {
            key,
            value,
            expiration,
            network,
            format,
        } => {
            let value = parse_value(value, *format)?;
            if !transients
                .scope(Scope::from_network(*network))
                .set(key, value, *expiration)
            {
                bail!("Transient could not be set.");
            }
            console.success("Transient added.")?;
        }

        Commands::Update {
            key,
            value,
            expiration,
            network,
            format,
        } => {
            let value = parse_value(value, *format)?;
            if !transients
                .scope(Scope::from_network(*network))
                .update(key, value, *expiration)
            {
                bail!("Transient could not be updated.");
            }
            console.success("Transient updated.")?;
        }

        Commands::Delete { key, all, network } => {
            let store = transients.scope(Scope::from_network(*network));
            if *all {
                match store.delete_all() {
                    0 => console.success("No transients found.")?,
                    1 => console.success("1 transient deleted from the database.")?,
                    n => console.success(&format!("{n} transients deleted from the database."))?,
                }
                return Ok(());
            }

            let Some(key) = key else {
                bail!("Please specify transient key, or use --all.");
            };
            if store.delete(key) {
                console.success("Transient deleted.")?;
            } else {
                console.warning(
                    "Transient was not deleted; either it doesn't exist, or it has already been deleted.",
                )?;
            }
        }

        Commands::Clean => match transients.sweep() {
            Some(report) => console.success(&format!(
                "{} expired transients deleted from the database.",
                report.reclaimed()
            ))?,
            None => console.warning("Sweep was skipped.")?,
        },

        Commands::Serve { .. } => bail!("`serve` cannot run as a one-shot command."),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::options::MemoryOptions;
    use serde_json::json;
    use std::sync::Arc;

    const T0: i64 = 1_700_000_000;

    struct Harness {
        transients: Transients,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(T0));
            let transients = Transients::builder(Arc::new(MemoryOptions::new()))
                .clock(clock.clone())
                .build();
            Self { transients, clock }
        }

        /// Runs a command line, returning (result, stdout, stderr).
        fn run(&self, args: &[&str]) -> (Result<()>, String, String) {
            let argv = std::iter::once("transient").chain(args.iter().copied());
            let cli = Cli::try_parse_from(argv).expect("arguments should parse");
            let mut out = Vec::new();
            let mut err = Vec::new();
            let result = {
                let mut console = Console::new(&mut out, &mut err);
                execute(&cli.command, &self.transients, &mut console)
            };
            (
                result,
                String::from_utf8(out).unwrap(),
                String::from_utf8(err).unwrap(),
            )
        }
    }

    #[test]
    fn test_set_then_get() {
        let h = Harness::new();

        let (result, out, _) = h.run(&["set", "feed", "<rss/>", "60"]);
        assert!(result.is_ok());
        assert_eq!(out, "Success: Transient added.\n");

        let (_, out, _) = h.run(&["get", "feed"]);
        assert_eq!(out, "<rss/>\n");

        assert_eq!(h.transients.scope(Scope::Local).timeout_of("feed"), Some(T0 + 60));
    }

    #[test]
    fn test_get_missing_warns() {
        let h = Harness::new();

        let (result, out, err) = h.run(&["get", "nope"]);
        assert!(result.is_ok());
        assert!(out.is_empty());
        assert_eq!(err, "Warning: Transient with key \"nope\" is not set.\n");
    }

    #[test]
    fn test_set_same_value_twice_errors() {
        let h = Harness::new();

        assert!(h.run(&["set", "k", "v"]).0.is_ok());
        let (result, _, _) = h.run(&["set", "k", "v"]);
        assert_eq!(result.unwrap_err().to_string(), "Transient could not be set.");
    }

    #[test]
    fn test_json_format_round_trip() {
        let h = Harness::new();

        h.run(&["set", "cfg", r#"{"enabled":true}"#, "--format", "json", "--network"]);
        assert_eq!(
            h.transients.scope(Scope::Global).get("cfg"),
            Some(json!({"enabled": true}))
        );

        let (_, out, _) = h.run(&["get", "cfg", "--network", "--format", "yaml"]);
        assert_eq!(out, "enabled: true\n");
    }

    #[test]
    fn test_update_keeps_expiry() {
        let h = Harness::new();

        h.run(&["set", "k", "a", "30"]);
        h.clock.advance(10);
        let (result, out, _) = h.run(&["update", "k", "b", "500"]);

        assert!(result.is_ok());
        assert_eq!(out, "Success: Transient updated.\n");
        assert_eq!(h.transients.scope(Scope::Local).timeout_of("k"), Some(T0 + 30));
    }

    #[test]
    fn test_get_all_table() {
        let h = Harness::new();
        h.run(&["set", "a", "one"]);
        h.run(&["set", "b", "two", "300"]);

        let (_, out, _) = h.run(&["get", "--all"]);
        assert!(out.contains("| a   | one   | No Timeout |"));
        assert!(out.contains("| b   | two   | in 5 mins  |"));
    }

    #[test]
    fn test_delete_variants() {
        let h = Harness::new();
        h.run(&["set", "a", "1"]);
        h.run(&["set", "b", "2"]);
        h.run(&["set", "c", "3", "--network"]);

        let (_, out, _) = h.run(&["delete", "a"]);
        assert_eq!(out, "Success: Transient deleted.\n");

        let (_, _, err) = h.run(&["delete", "a"]);
        assert!(err.starts_with("Warning: Transient was not deleted"));

        let (_, out, _) = h.run(&["delete", "--all"]);
        assert_eq!(out, "Success: 1 transient deleted from the database.\n");

        let (_, out, _) = h.run(&["delete", "--all"]);
        assert_eq!(out, "Success: No transients found.\n");

        assert!(h.transients.scope(Scope::Global).get("c").is_some());
    }

    #[test]
    fn test_missing_key_without_all() {
        let h = Harness::new();
        let (result, _, _) = h.run(&["delete"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_clean() {
        let h = Harness::new();
        h.run(&["set", "old", "x", "10"]);
        h.run(&["set", "older", "x", "5", "--network"]);
        h.clock.advance(600);

        let (_, out, _) = h.run(&["clean"]);
        assert_eq!(out, "Success: 2 expired transients deleted from the database.\n");
    }
}
