//! Sweep Module
//!
//! Bulk reclamation of expired transients. The sweeper never deletes value
//! records itself; it reads each stale key through the scope's own `get`,
//! whose lazy expiry does the deletion. Expired timeout records with no value
//! record go the same way.
//!
//! Lazy expiry leaves two kinds of orphan behind: keys exempt from timeout
//! checks and keys whose read a hook short-circuited. Those are only removed
//! when `purge_orphaned_timeouts` is set.

use serde::Serialize;
use tracing::{debug, info};

use super::{Scope, ScopedStore, Transients};

// == Public Constants ==
/// Seconds an entry must have been expired before a sweep touches it
pub const DEFAULT_SWEEP_GRACE: i64 = 60;

// == Sweep Settings ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Grace window in seconds
    pub grace: i64,
    /// Also remove orphaned timeout records that a read leaves in place
    pub purge_orphaned_timeouts: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            grace: DEFAULT_SWEEP_GRACE,
            purge_orphaned_timeouts: false,
        }
    }
}

// == Sweep Report ==
/// Per-scope outcome of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScopeSweep {
    /// Timeout records older than the cutoff
    pub scanned: usize,
    /// Transients whose value record was removed
    pub reclaimed: usize,
    /// Orphaned timeout records removed directly
    pub orphans_purged: usize,
}

/// Aggregate outcome of a sweep across both scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Instant below which timeouts were considered stale
    pub cutoff: i64,
    pub local: ScopeSweep,
    pub network: ScopeSweep,
}

impl SweepReport {
    /// Transients reclaimed in both scopes.
    pub fn reclaimed(&self) -> usize {
        self.local.reclaimed + self.network.reclaimed
    }
}

// == Sweeper ==
/// Runs a single sweep over a [`Transients`] instance.
pub struct Sweeper<'a> {
    transients: &'a Transients,
    settings: SweepSettings,
}

impl<'a> Sweeper<'a> {
    pub fn new(transients: &'a Transients, settings: SweepSettings) -> Self {
        Self {
            transients,
            settings,
        }
    }

    /// Sweeps both scopes. Returns `None` when a hook short-circuited it.
    pub fn run(&self) -> Option<SweepReport> {
        let hooks = self.transients.hooks();
        if hooks.pre_sweep() {
            debug!("Sweep skipped by hook");
            return None;
        }

        let cutoff = self.transients.now() - self.settings.grace;
        let report = SweepReport {
            cutoff,
            local: self.sweep_scope(Scope::Local, cutoff),
            network: self.sweep_scope(Scope::Global, cutoff),
        };

        if report.reclaimed() > 0 {
            info!(
                cutoff,
                local = report.local.reclaimed,
                network = report.network.reclaimed,
                "Sweep reclaimed expired transients"
            );
        } else {
            debug!(cutoff, "Sweep found no expired transients");
        }

        hooks.after_sweep(&report);
        Some(report)
    }

    fn sweep_scope(&self, scope: Scope, cutoff: i64) -> ScopeSweep {
        let store = self.transients.scope(scope);
        let mut outcome = ScopeSweep::default();
        store.batch(&mut || outcome = self.reclaim(store, cutoff));
        outcome
    }

    fn reclaim(&self, store: &ScopedStore, cutoff: i64) -> ScopeSweep {
        let stale = store.timed_out_before(cutoff);

        let mut outcome = ScopeSweep {
            scanned: stale.len(),
            ..ScopeSweep::default()
        };

        for key in &stale {
            let present = store.has_value(key);
            store.get(key);

            if present {
                if !store.has_value(key) {
                    outcome.reclaimed += 1;
                }
            } else if store.timeout_of(key).is_none()
                || (self.settings.purge_orphaned_timeouts
                    && store.purge_orphaned_timeout(key, cutoff))
            {
                outcome.orphans_purged += 1;
            }
        }

        outcome
    }
}
