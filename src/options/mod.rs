//! Options Module
//!
//! The generic name/value persistence substrate transients are layered on.
//! Every row is independently addressable; there are no multi-row
//! transactions, so callers must tolerate partial writes.

mod file;
mod memory;
mod table;

use std::collections::BTreeMap;

use serde_json::Value;

pub use file::FileOptions;
pub use memory::MemoryOptions;
pub use table::{OptionRow, OptionTable};
pub(crate) use table::as_epoch;

// == Public Constants ==
/// Maximum length of an option name in bytes
pub const MAX_OPTION_NAME_LENGTH: usize = 191;

// == Option Store ==
/// Row-level key/value storage.
///
/// Each call is atomic for the single row it touches and nothing more.
pub trait OptionStore: Send + Sync {
    /// Inserts a row if no row with `name` exists yet.
    ///
    /// `autoload` marks the row as part of the eagerly loaded set; the flag is
    /// fixed for the lifetime of the row.
    fn add(&self, name: &str, value: Value, autoload: bool) -> bool;

    /// Replaces the value of an existing row.
    ///
    /// Returns `false` when the row is absent or already holds `value`.
    fn update(&self, name: &str, value: Value) -> bool;

    /// Reads a single row.
    fn get(&self, name: &str) -> Option<Value>;

    /// Removes a row, returning whether it existed.
    fn delete(&self, name: &str) -> bool;

    /// Removes a row only if it still holds `expected`, as one step.
    fn delete_if(&self, name: &str, expected: &Value) -> bool;

    /// Reads a single row if it was added with `autoload = true`.
    fn get_autoloaded(&self, name: &str) -> Option<Value>;

    /// Returns every row that was added with `autoload = true`.
    fn autoloaded(&self) -> BTreeMap<String, Value>;

    /// Lists the suffixes of names starting with `prefix`, skipping names that
    /// start with `exclude`. Ordered by name.
    fn scan_names(&self, prefix: &str, exclude: Option<&str>) -> Vec<String>;

    /// Lists the suffixes of names starting with `prefix` whose value is an
    /// integer strictly below `cutoff`. Ordered by name.
    fn scan_older_than(&self, prefix: &str, cutoff: i64) -> Vec<String>;

    /// Runs `work` as one unit of persistence.
    ///
    /// Durable substrates may hold back their writes until `work` returns and
    /// then persist once. In-memory substrates just run it.
    fn batch(&self, work: &mut dyn FnMut()) {
        work()
    }
}
