//! Response DTOs for the transient API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::transient::{Listing, Scope, SweepReport};

/// Response body for GET /transients/:key
#[derive(Debug, Clone, Serialize)]
pub struct TransientResponse {
    /// The requested key
    pub key: String,
    /// Scope the key was read from
    pub scope: Scope,
    /// The stored value
    pub value: Value,
}

impl TransientResponse {
    pub fn new(key: impl Into<String>, scope: Scope, value: Value) -> Self {
        Self {
            key: key.into(),
            scope,
            value,
        }
    }
}

/// Response body for PUT, PATCH and DELETE /transients/:key
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    /// Success message
    pub message: String,
    /// The key that was written
    pub key: String,
    pub scope: Scope,
}

impl WriteResponse {
    fn with_verb(key: impl Into<String>, scope: Scope, verb: &str) -> Self {
        let key = key.into();
        Self {
            message: format!("Transient '{}' {}", key, verb),
            key,
            scope,
        }
    }

    pub fn added(key: impl Into<String>, scope: Scope) -> Self {
        Self::with_verb(key, scope, "added")
    }

    pub fn updated(key: impl Into<String>, scope: Scope) -> Self {
        Self::with_verb(key, scope, "updated")
    }

    pub fn deleted(key: impl Into<String>, scope: Scope) -> Self {
        Self::with_verb(key, scope, "deleted")
    }
}

/// One row of GET /transients
#[derive(Debug, Clone, Serialize)]
pub struct ListingResponse {
    pub key: String,
    pub value: Value,
    /// Expiry instant in epoch seconds, null = no timeout
    pub timeout: Option<i64>,
    /// Seconds until expiry (negative once expired), null = no timeout
    pub expires_in: Option<i64>,
}

impl ListingResponse {
    pub fn new(listing: Listing, now: i64) -> Self {
        Self {
            expires_in: listing.timeout.map(|timeout| timeout - now),
            key: listing.key,
            value: listing.value,
            timeout: listing.timeout,
        }
    }
}

/// Response body for GET /transients
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub scope: Scope,
    pub transients: Vec<ListingResponse>,
}

/// Response body for DELETE /transients
#[derive(Debug, Clone, Serialize)]
pub struct DeleteAllResponse {
    pub scope: Scope,
    /// Number of transients removed
    pub deleted: usize,
}

/// Response body for POST /sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    /// False when a hook skipped the sweep
    pub ran: bool,
    pub report: Option<SweepReport>,
}

impl From<Option<SweepReport>> for SweepResponse {
    fn from(report: Option<SweepReport>) -> Self {
        Self {
            ran: report.is_some(),
            report,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
