//! API Module
//!
//! HTTP handlers and routing for the transient REST API.
//!
//! # Endpoints
//! - `GET /transients` - List transients in a scope
//! - `DELETE /transients` - Delete every transient in a scope
//! - `GET /transients/:key` - Read a transient
//! - `PUT /transients/:key` - Set a transient
//! - `PATCH /transients/:key` - Update a transient, keeping its expiry
//! - `DELETE /transients/:key` - Delete a transient
//! - `POST /sweep` - Reclaim expired transients now
//! - `GET /health` - Health check endpoint
//!
//! Append `?network=true` to address the network scope.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
