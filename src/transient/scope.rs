//! Scope Module
//!
//! Maps logical transient keys to option names for each namespace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::options::MAX_OPTION_NAME_LENGTH;

// == Public Constants ==
/// Network keys that never expire unless deleted
pub const DEFAULT_NETWORK_NO_TIMEOUT: [&str; 3] = ["update_core", "update_plugins", "update_themes"];

// == Scope ==
/// Namespace a transient lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Per-site transients
    Local,
    /// Network-wide transients shared by every site
    Global,
}

impl Scope {
    /// Both scopes, local first.
    pub const ALL: [Scope; 2] = [Scope::Local, Scope::Global];

    /// Picks the scope for a `--network` style flag.
    pub fn from_network(network: bool) -> Self {
        if network {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    /// Prefix of value record names.
    pub fn value_prefix(self) -> &'static str {
        match self {
            Scope::Local => "_transient_",
            Scope::Global => "_site_transient_",
        }
    }

    /// Prefix of timeout record names.
    pub fn timeout_prefix(self) -> &'static str {
        match self {
            Scope::Local => "_transient_timeout_",
            Scope::Global => "_site_transient_timeout_",
        }
    }

    pub fn value_name(self, key: &str) -> String {
        format!("{}{}", self.value_prefix(), key)
    }

    pub fn timeout_name(self, key: &str) -> String {
        format!("{}{}", self.timeout_prefix(), key)
    }

    /// Whether eagerly loaded value rows are trusted to carry no timeout.
    ///
    /// Only the local namespace has an autoloaded set; network rows are
    /// always checked against their timeout record.
    pub fn honours_autoload(self) -> bool {
        matches!(self, Scope::Local)
    }

    /// Longest key whose timeout record name still fits an option name.
    pub fn max_key_length(self) -> usize {
        MAX_OPTION_NAME_LENGTH - self.timeout_prefix().len()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Local => write!(f, "local"),
            Scope::Global => write!(f, "network"),
        }
    }
}
