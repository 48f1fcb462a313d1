//! Hooks Module
//!
//! Typed interception points around every transient operation. A host
//! registers observers once at start-up; the registry is read-only after
//! that and shared by both scopes and the sweeper.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::{Scope, SweepReport};

// == Transient Hooks ==
/// Callbacks invoked around transient operations.
///
/// Every method has a pass-through default, so observers only implement the
/// points they care about. Key-specific behaviour is expressed by matching on
/// `key` inside the callback.
#[allow(unused_variables)]
pub trait TransientHooks: Send + Sync {
    /// Returning `Some` answers a get without touching storage.
    fn pre_get(&self, scope: Scope, key: &str) -> Option<Value> {
        None
    }

    /// Last chance to rewrite the result of a get.
    fn post_get(&self, scope: Scope, key: &str, value: Option<Value>) -> Option<Value> {
        value
    }

    fn pre_set_value(&self, scope: Scope, key: &str, value: Value) -> Value {
        value
    }

    fn pre_set_expiration(&self, scope: Scope, key: &str, expiration: u64, value: &Value) -> u64 {
        expiration
    }

    fn pre_update_value(&self, scope: Scope, key: &str, value: Value) -> Value {
        value
    }

    fn after_set(&self, scope: Scope, key: &str, value: &Value, expiration: u64) {}

    fn after_update(&self, scope: Scope, key: &str, value: &Value, expiration: u64) {}

    fn before_delete(&self, scope: Scope, key: &str) {}

    fn after_delete(&self, scope: Scope, key: &str) {}

    /// Returning `true` skips the sweep entirely.
    fn pre_sweep(&self) -> bool {
        false
    }

    fn after_sweep(&self, report: &SweepReport) {}
}

// == Hook Registry ==
/// Ordered set of registered observers.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn TransientHooks>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observer; filters run in registration order.
    pub fn register(&mut self, hook: Arc<dyn TransientHooks>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub(crate) fn pre_get(&self, scope: Scope, key: &str) -> Option<Value> {
        self.hooks.iter().find_map(|h| h.pre_get(scope, key))
    }

    pub(crate) fn post_get(&self, scope: Scope, key: &str, value: Option<Value>) -> Option<Value> {
        self.hooks
            .iter()
            .fold(value, |value, h| h.post_get(scope, key, value))
    }

    pub(crate) fn pre_set_value(&self, scope: Scope, key: &str, value: Value) -> Value {
        self.hooks
            .iter()
            .fold(value, |value, h| h.pre_set_value(scope, key, value))
    }

    pub(crate) fn pre_set_expiration(
        &self,
        scope: Scope,
        key: &str,
        expiration: u64,
        value: &Value,
    ) -> u64 {
        self.hooks.iter().fold(expiration, |expiration, h| {
            h.pre_set_expiration(scope, key, expiration, value)
        })
    }

    pub(crate) fn pre_update_value(&self, scope: Scope, key: &str, value: Value) -> Value {
        self.hooks
            .iter()
            .fold(value, |value, h| h.pre_update_value(scope, key, value))
    }

    pub(crate) fn after_set(&self, scope: Scope, key: &str, value: &Value, expiration: u64) {
        for h in &self.hooks {
            h.after_set(scope, key, value, expiration);
        }
    }

    pub(crate) fn after_update(&self, scope: Scope, key: &str, value: &Value, expiration: u64) {
        for h in &self.hooks {
            h.after_update(scope, key, value, expiration);
        }
    }

    pub(crate) fn before_delete(&self, scope: Scope, key: &str) {
        for h in &self.hooks {
            h.before_delete(scope, key);
        }
    }

    pub(crate) fn after_delete(&self, scope: Scope, key: &str) {
        for h in &self.hooks {
            h.after_delete(scope, key);
        }
    }

    pub(crate) fn pre_sweep(&self) -> bool {
        self.hooks.iter().any(|h| h.pre_sweep())
    }

    pub(crate) fn after_sweep(&self, report: &SweepReport) {
        for h in &self.hooks {
            h.after_sweep(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    impl TransientHooks for Upper {
        fn pre_set_value(&self, _scope: Scope, _key: &str, value: Value) -> Value {
            match value {
                Value::String(s) => Value::String(s.to_uppercase()),
                other => other,
            }
        }
    }

    struct Exclaim;

    impl TransientHooks for Exclaim {
        fn pre_set_value(&self, _scope: Scope, _key: &str, value: Value) -> Value {
            match value {
                Value::String(s) => Value::String(format!("{s}!")),
                other => other,
            }
        }

        fn pre_get(&self, _scope: Scope, key: &str) -> Option<Value> {
            (key == "pinned").then(|| json!("from hook"))
        }
    }

    #[test]
    fn test_filters_fold_in_registration_order() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Exclaim));

        let value = registry.pre_set_value(Scope::Local, "k", json!("hi"));
        assert_eq!(value, json!("HI!"));
    }

    #[test]
    fn test_pre_get_first_match_wins() {
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(Upper));
        registry.register(Arc::new(Exclaim));

        assert_eq!(
            registry.pre_get(Scope::Global, "pinned"),
            Some(json!("from hook"))
        );
        assert!(registry.pre_get(Scope::Global, "other").is_none());
    }

    #[test]
    fn test_empty_registry_passes_through() {
        let registry = HookRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.post_get(Scope::Local, "k", Some(json!(1))),
            Some(json!(1))
        );
        assert_eq!(registry.pre_set_expiration(Scope::Local, "k", 30, &json!(1)), 30);
        assert!(!registry.pre_sweep());
    }
}
