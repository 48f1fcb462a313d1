//! Transient Store - A durable key-value store with expiring entries
//!
//! Entries live in a per-site or network-wide scope on top of a generic
//! option table, expire lazily on read, and are reclaimed in bulk by a sweep.

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod options;
pub mod server;
pub mod tasks;
pub mod transient;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweep_task;
pub use transient::{Scope, Transients};
