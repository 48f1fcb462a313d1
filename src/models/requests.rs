//! Request DTOs for the transient API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::transient::Scope;

/// Request body for PUT and PATCH /transients/:key
///
/// # Fields
/// - `value`: Any JSON payload
/// - `expiration`: Seconds until expiry; 0 or absent means none
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    /// The value to store
    pub value: Value,
    /// Optional expiration in seconds
    #[serde(default)]
    pub expiration: u64,
}

/// Query string selecting the transient scope (`?network=true`)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub network: bool,
}

impl ScopeQuery {
    pub fn scope(&self) -> Scope {
        Scope::from_network(self.network)
    }
}

/// Validates a key taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(key: &str, scope: Scope) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > scope.max_key_length() {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            scope.max_key_length()
        ));
    }
    None
}
