//! Scoped Store Module
//!
//! Transient semantics for a single namespace. Every entry is up to two
//! option rows: the value record and an optional timeout record holding the
//! absolute expiry in epoch seconds. The rows are correlated only by name.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{HookRegistry, Scope};
use crate::clock::Clock;
use crate::options::{as_epoch, OptionStore};

// == Listing ==
/// Raw view of a stored transient, as found in the option table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// Logical key
    pub key: String,
    /// Stored value
    pub value: Value,
    /// Expiry instant in epoch seconds, None = no timeout record
    pub timeout: Option<i64>,
}

// == Scoped Store ==
/// Set/get/update/delete for one scope.
pub struct ScopedStore {
    scope: Scope,
    options: Arc<dyn OptionStore>,
    clock: Arc<dyn Clock>,
    hooks: Arc<HookRegistry>,
    /// Keys exempt from timeout checks
    no_timeout: HashSet<String>,
}

impl ScopedStore {
    // == Constructor ==
    pub fn new(
        scope: Scope,
        options: Arc<dyn OptionStore>,
        clock: Arc<dyn Clock>,
        hooks: Arc<HookRegistry>,
        no_timeout: HashSet<String>,
    ) -> Self {
        Self {
            scope,
            options,
            clock,
            hooks,
            no_timeout,
        }
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    fn is_valid_key(&self, key: &str) -> bool {
        let valid = !key.is_empty() && key.len() <= self.scope.max_key_length();
        if !valid {
            debug!(scope = %self.scope, len = key.len(), "Rejected transient key");
        }
        valid
    }

    /// Writes the timeout record whether or not one already exists.
    fn put_timeout(&self, key: &str, deadline: i64) {
        let name = self.scope.timeout_name(key);
        if !self.options.add(&name, json!(deadline), false) {
            self.options.update(&name, json!(deadline));
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `expiration` seconds from now.
    ///
    /// An `expiration` of 0 means no expiry for a new entry and "keep the
    /// current timeout" for an existing one. Returns whether the value record
    /// write took effect; writing an identical value reports `false`.
    pub fn set(&self, key: &str, value: Value, expiration: u64) -> bool {
        if !self.is_valid_key(key) {
            return false;
        }

        let value = self.hooks.pre_set_value(self.scope, key, value);
        let expiration = self
            .hooks
            .pre_set_expiration(self.scope, key, expiration, &value);

        let value_name = self.scope.value_name(key);
        let ttl = i64::try_from(expiration).unwrap_or(i64::MAX);
        let deadline = self.clock.now().saturating_add(ttl);

        let written = if self.options.get(&value_name).is_none() {
            // Timeout first: a reader in between sees a value-less pair, i.e. absent.
            if expiration > 0 {
                self.put_timeout(key, deadline);
            } else {
                // Drop any orphan so the new entry is not paired with it.
                self.options.delete(&self.scope.timeout_name(key));
            }
            let autoload = expiration == 0 && self.scope.honours_autoload();
            self.options.add(&value_name, value.clone(), autoload)
        } else if expiration == 0 {
            self.options.update(&value_name, value.clone())
        } else if self.options.get(&self.scope.timeout_name(key)).is_some() {
            self.put_timeout(key, deadline);
            self.options.update(&value_name, value.clone())
        } else if self.scope.honours_autoload() {
            // The autoload flag is fixed at insert, so the row is recreated
            // as a lazily loaded one alongside its new timeout.
            self.options.delete(&value_name);
            self.put_timeout(key, deadline);
            self.options.add(&value_name, value.clone(), false)
        } else {
            self.put_timeout(key, deadline);
            self.options.update(&value_name, value.clone())
        };

        if written {
            self.hooks.after_set(self.scope, key, &value, expiration);
        } else {
            debug!(scope = %self.scope, key, "Transient set did not take effect");
        }
        written
    }

    // == Get ==
    /// Reads a transient, reclaiming it first if it has expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        if !self.is_valid_key(key) {
            return None;
        }

        if let Some(value) = self.hooks.pre_get(self.scope, key) {
            return Some(value);
        }

        let value_name = self.scope.value_name(key);

        let eager = if self.scope.honours_autoload() {
            self.options.get_autoloaded(&value_name)
        } else {
            None
        };

        let value = match eager {
            Some(value) => Some(value),
            None if self.no_timeout.contains(key) => self.options.get(&value_name),
            None if self.reclaim_if_expired(key) => None,
            None => self.options.get(&value_name),
        };

        self.hooks.post_get(self.scope, key, value)
    }

    /// Deletes both rows when the timeout record has passed. A timeout
    /// record without a value record beside it goes the same way.
    ///
    /// The timeout record is only removed while it still holds the instant
    /// that was judged expired, so a deadline written by a concurrent `set`
    /// survives.
    fn reclaim_if_expired(&self, key: &str) -> bool {
        let timeout_name = self.scope.timeout_name(key);
        let Some(stored) = self.options.get(&timeout_name) else {
            return false;
        };
        let Some(deadline) = as_epoch(&stored) else {
            return false;
        };
        let now = self.clock.now();
        if now < deadline {
            return false;
        }

        self.options.delete(&self.scope.value_name(key));
        self.options.delete_if(&timeout_name, &stored);
        debug!(scope = %self.scope, key, deadline, now, "Reclaimed expired transient");
        true
    }

    // == Update ==
    /// Changes the value of an existing transient without touching its
    /// timeout. Falls back to [`ScopedStore::set`] with `expiration` when the
    /// transient is absent.
    ///
    /// Presence is decided by [`ScopedStore::get`] returning a value, so a
    /// stored JSON `false` counts as present and is updated in place.
    pub fn update(&self, key: &str, value: Value, expiration: u64) -> bool {
        if !self.is_valid_key(key) {
            return false;
        }

        let value = self.hooks.pre_update_value(self.scope, key, value);

        if self.get(key).is_none() {
            return self.set(key, value, expiration);
        }

        let written = self
            .options
            .update(&self.scope.value_name(key), value.clone());

        if written {
            self.hooks.after_update(self.scope, key, &value, expiration);
        } else {
            debug!(scope = %self.scope, key, "Transient update did not take effect");
        }
        written
    }

    // == Delete ==
    /// Removes a transient. The value record goes first; the timeout record
    /// is only removed once that succeeded.
    pub fn delete(&self, key: &str) -> bool {
        if !self.is_valid_key(key) {
            return false;
        }

        self.hooks.before_delete(self.scope, key);

        let deleted = self.options.delete(&self.scope.value_name(key));
        if deleted {
            self.options.delete(&self.scope.timeout_name(key));
            self.hooks.after_delete(self.scope, key);
        }
        deleted
    }

    // == Bulk ==
    /// Keys of every stored value record, in name order.
    pub fn keys(&self) -> Vec<String> {
        self.options
            .scan_names(self.scope.value_prefix(), Some(self.scope.timeout_prefix()))
    }

    /// Every stored transient with its raw value and timeout, expired or not.
    pub fn list(&self) -> Vec<Listing> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.options.get(&self.scope.value_name(&key))?;
                let timeout = self.timeout_of(&key);
                Some(Listing {
                    key,
                    value,
                    timeout,
                })
            })
            .collect()
    }

    /// Deletes every transient in the scope, returning how many went.
    pub fn delete_all(&self) -> usize {
        let keys = self.keys();
        let mut deleted = 0;
        self.batch(&mut || deleted = keys.iter().filter(|key| self.delete(key)).count());
        deleted
    }

    /// Stored expiry instant of `key`, if it has a readable timeout record.
    pub fn timeout_of(&self, key: &str) -> Option<i64> {
        self.options
            .get(&self.scope.timeout_name(key))
            .as_ref()
            .and_then(as_epoch)
    }

    /// Whether the value record is physically present.
    pub(crate) fn has_value(&self, key: &str) -> bool {
        self.options.get(&self.scope.value_name(key)).is_some()
    }

    /// Keys whose timeout record holds an instant before `cutoff`.
    pub(crate) fn timed_out_before(&self, cutoff: i64) -> Vec<String> {
        self.options
            .scan_older_than(self.scope.timeout_prefix(), cutoff)
    }

    /// Removes a timeout record that has no value record beside it and still
    /// holds an instant before `cutoff`.
    ///
    /// A `set` writes its timeout record before its value record, so a fresh
    /// deadline seen here belongs to a write in flight and is left alone.
    pub(crate) fn purge_orphaned_timeout(&self, key: &str, cutoff: i64) -> bool {
        let timeout_name = self.scope.timeout_name(key);
        let Some(stored) = self.options.get(&timeout_name) else {
            return false;
        };
        if !as_epoch(&stored).is_some_and(|deadline| deadline < cutoff) || self.has_value(key) {
            return false;
        }
        self.options.delete_if(&timeout_name, &stored)
    }

    /// Runs `work` as one persistence unit of the backing option store.
    pub(crate) fn batch(&self, work: &mut dyn FnMut()) {
        self.options.batch(work)
    }
}
