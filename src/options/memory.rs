//! In-memory option store.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde_json::Value;

use super::{OptionStore, OptionTable};

// == Memory Options ==
/// Option rows held in process memory.
#[derive(Debug, Default)]
pub struct MemoryOptions {
    table: RwLock<OptionTable>,
}

impl MemoryOptions {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl OptionStore for MemoryOptions {
    fn add(&self, name: &str, value: Value, autoload: bool) -> bool {
        self.table.write().add(name, value, autoload)
    }

    fn update(&self, name: &str, value: Value) -> bool {
        self.table.write().update(name, value).is_some()
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.table.read().get(name).cloned()
    }

    fn delete(&self, name: &str) -> bool {
        self.table.write().remove(name).is_some()
    }

    fn delete_if(&self, name: &str, expected: &Value) -> bool {
        self.table.write().remove_if(name, expected).is_some()
    }

    fn get_autoloaded(&self, name: &str) -> Option<Value> {
        self.table.read().get_autoloaded(name).cloned()
    }

    fn autoloaded(&self) -> BTreeMap<String, Value> {
        self.table.read().autoloaded()
    }

    fn scan_names(&self, prefix: &str, exclude: Option<&str>) -> Vec<String> {
        self.table.read().scan_names(prefix, exclude)
    }

    fn scan_older_than(&self, prefix: &str, cutoff: i64) -> Vec<String> {
        self.table.read().scan_older_than(prefix, cutoff)
    }
}
