//! Transient Module
//!
//! Expiring key-value entries layered on an [`OptionStore`], in a per-site
//! (local) and a network-wide (global) namespace.

mod hooks;
mod scope;
mod store;
mod sweep;


use std::collections::HashSet;
use std::sync::Arc;

pub use hooks::{HookRegistry, TransientHooks};
pub use scope::{Scope, DEFAULT_NETWORK_NO_TIMEOUT};
pub use store::{Listing, ScopedStore};
pub use sweep::{ScopeSweep, SweepReport, SweepSettings, Sweeper, DEFAULT_SWEEP_GRACE};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::options::OptionStore;

// == Transients ==
/// Both transient scopes plus the sweep that serves them.
pub struct Transients {
    local: ScopedStore,
    network: ScopedStore,
    clock: Arc<dyn Clock>,
    hooks: Arc<HookRegistry>,
    sweep: SweepSettings,
}

impl Transients {
    /// Starts a builder with `options` backing both scopes.
    pub fn builder(options: Arc<dyn OptionStore>) -> TransientsBuilder {
        TransientsBuilder::new(options)
    }

    /// Wires up both scopes from configuration.
    pub fn from_config(config: &Config, options: Arc<dyn OptionStore>) -> Self {
        Self::builder(options)
            .network_no_timeout(config.network_no_timeout.iter().cloned())
            .sweep_settings(SweepSettings {
                grace: config.sweep_grace,
                purge_orphaned_timeouts: config.purge_orphaned_timeouts,
            })
            .build()
    }

    /// The store for `scope`.
    pub fn scope(&self, scope: Scope) -> &ScopedStore {
        match scope {
            Scope::Local => &self.local,
            Scope::Global => &self.network,
        }
    }

    /// Reclaims entries expired for longer than the grace window.
    pub fn sweep(&self) -> Option<SweepReport> {
        Sweeper::new(self, self.sweep).run()
    }

    pub fn sweep_settings(&self) -> SweepSettings {
        self.sweep
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub(crate) fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }
}

// == Transients Builder ==
pub struct TransientsBuilder {
    local_options: Arc<dyn OptionStore>,
    network_options: Option<Arc<dyn OptionStore>>,
    clock: Arc<dyn Clock>,
    hooks: HookRegistry,
    network_no_timeout: HashSet<String>,
    sweep: SweepSettings,
}

impl TransientsBuilder {
    fn new(options: Arc<dyn OptionStore>) -> Self {
        Self {
            local_options: options,
            network_options: None,
            clock: Arc::new(SystemClock),
            hooks: HookRegistry::new(),
            network_no_timeout: DEFAULT_NETWORK_NO_TIMEOUT
                .iter()
                .map(|key| key.to_string())
                .collect(),
            sweep: SweepSettings::default(),
        }
    }

    /// Backs the network scope with its own option store.
    pub fn network_options(mut self, options: Arc<dyn OptionStore>) -> Self {
        self.network_options = Some(options);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn hook(mut self, hook: Arc<dyn TransientHooks>) -> Self {
        self.hooks.register(hook);
        self
    }

    /// Replaces the set of network keys exempt from expiry.
    pub fn network_no_timeout<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.network_no_timeout = keys.into_iter().collect();
        self
    }

    pub fn sweep_settings(mut self, settings: SweepSettings) -> Self {
        self.sweep = settings;
        self
    }

    pub fn build(self) -> Transients {
        let hooks = Arc::new(self.hooks);
        let network_options = self
            .network_options
            .unwrap_or_else(|| self.local_options.clone());

        Transients {
            local: ScopedStore::new(
                Scope::Local,
                self.local_options,
                self.clock.clone(),
                hooks.clone(),
                HashSet::new(),
            ),
            network: ScopedStore::new(
                Scope::Global,
                network_options,
                self.clock.clone(),
                hooks.clone(),
                self.network_no_timeout,
            ),
            clock: self.clock,
            hooks,
            sweep: self.sweep,
        }
    }
}
