//! Option Table Module
//!
//! Ordered in-memory rows shared by the memory and file substrates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Option Row ==
/// A single stored option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRow {
    /// Stored payload
    pub value: Value,
    /// Whether the row belongs to the eagerly loaded set
    #[serde(default)]
    pub autoload: bool,
}

// == Option Table ==
/// Rows keyed by option name, kept in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionTable {
    rows: BTreeMap<String, OptionRow>,
}

impl OptionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row unless one already exists.
    pub fn add(&mut self, name: &str, value: Value, autoload: bool) -> bool {
        if self.rows.contains_key(name) {
            return false;
        }
        self.rows
            .insert(name.to_string(), OptionRow { value, autoload });
        true
    }

    /// Replaces an existing row's value; returns the previous value on change.
    pub fn update(&mut self, name: &str, value: Value) -> Option<Value> {
        let row = self.rows.get_mut(name)?;
        if row.value == value {
            return None;
        }
        Some(std::mem::replace(&mut row.value, value))
    }

    /// Reads a row's value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.rows.get(name).map(|row| &row.value)
    }

    /// Reads a row's value only if it belongs to the autoloaded set.
    pub fn get_autoloaded(&self, name: &str) -> Option<&Value> {
        self.rows
            .get(name)
            .filter(|row| row.autoload)
            .map(|row| &row.value)
    }

    /// Removes a row and hands it back.
    pub fn remove(&mut self, name: &str) -> Option<OptionRow> {
        self.rows.remove(name)
    }

    /// Removes a row only while it still holds `expected`.
    pub fn remove_if(&mut self, name: &str, expected: &Value) -> Option<OptionRow> {
        if self.get(name) != Some(expected) {
            return None;
        }
        self.rows.remove(name)
    }

    /// Puts a previously removed row back in place.
    pub fn restore(&mut self, name: &str, row: OptionRow) {
        self.rows.insert(name.to_string(), row);
    }

    /// Collects all autoloaded rows.
    pub fn autoloaded(&self) -> BTreeMap<String, Value> {
        self.rows
            .iter()
            .filter(|(_, row)| row.autoload)
            .map(|(name, row)| (name.clone(), row.value.clone()))
            .collect()
    }

    /// Suffixes of names under `prefix`, minus those under `exclude`.
    pub fn scan_names(&self, prefix: &str, exclude: Option<&str>) -> Vec<String> {
        self.rows
            .range(prefix.to_string()..)
            .map(|(name, _)| name)
            .take_while(|name| name.starts_with(prefix))
            .filter(|name| exclude.map_or(true, |ex| !name.starts_with(ex)))
            .map(|name| name[prefix.len()..].to_string())
            .collect()
    }

    /// Suffixes of names under `prefix` holding an integer below `cutoff`.
    pub fn scan_older_than(&self, prefix: &str, cutoff: i64) -> Vec<String> {
        self.rows
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .filter(|(_, row)| as_epoch(&row.value).is_some_and(|instant| instant < cutoff))
            .map(|(name, _)| name[prefix.len()..].to_string())
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads an epoch-seconds value, accepting numeric strings as well.
pub(crate) fn as_epoch(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_refuses_existing_row() {
        let mut table = OptionTable::new();
        assert!(table.add("a", json!(1), true));
        assert!(!table.add("a", json!(2), false));
        assert_eq!(table.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_update_identical_value_is_noop() {
        let mut table = OptionTable::new();
        table.add("a", json!("x"), false);

        assert!(table.update("a", json!("x")).is_none());
        assert_eq!(table.update("a", json!("y")), Some(json!("x")));
        assert!(table.update("missing", json!("y")).is_none());
    }

    #[test]
    fn test_scan_names_with_exclusion() {
        let mut table = OptionTable::new();
        table.add("_transient_b", json!(1), true);
        table.add("_transient_a", json!(1), true);
        table.add("_transient_timeout_a", json!(10), false);
        table.add("_site_transient_a", json!(1), true);
        table.add("siteurl", json!("x"), true);

        let names = table.scan_names("_transient_", Some("_transient_timeout_"));
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_scan_older_than() {
        let mut table = OptionTable::new();
        table.add("_transient_timeout_old", json!(100), false);
        table.add("_transient_timeout_edge", json!(200), false);
        table.add("_transient_timeout_new", json!(300), false);
        table.add("_transient_timeout_text", json!("150"), false);
        table.add("_transient_timeout_junk", json!("soon"), false);

        let names = table.scan_older_than("_transient_timeout_", 200);
        assert_eq!(names, vec!["old".to_string(), "text".to_string()]);
    }

    #[test]
    fn test_autoloaded_only_includes_flagged_rows() {
        let mut table = OptionTable::new();
        table.add("eager", json!(1), true);
        table.add("lazy", json!(2), false);

        let loaded = table.autoloaded();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("eager"));

        assert_eq!(table.get_autoloaded("eager"), Some(&json!(1)));
        assert!(table.get_autoloaded("lazy").is_none());
        assert!(table.get_autoloaded("missing").is_none());
    }

    #[test]
    fn test_remove_if_checks_current_value() {
        let mut table = OptionTable::new();
        table.add("_transient_timeout_k", json!(100), false);

        assert!(table.remove_if("_transient_timeout_k", &json!(50)).is_none());
        assert_eq!(table.len(), 1);

        assert!(table.remove_if("_transient_timeout_k", &json!(100)).is_some());
        assert!(table.is_empty());
        assert!(table.remove_if("_transient_timeout_k", &json!(100)).is_none());
    }

    #[test]
    fn test_remove_and_restore() {
        let mut table = OptionTable::new();
        table.add("a", json!(1), true);

        let row = table.remove("a").unwrap();
        assert!(table.is_empty());

        table.restore("a", row);
        assert_eq!(table.len(), 1);
        assert_eq!(table.autoloaded().len(), 1);
    }
}
