//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sweep: Reclaims transients that expired longer ago than the grace window

mod sweep;

pub use sweep::spawn_sweep_task;
