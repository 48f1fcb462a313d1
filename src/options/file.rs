//! File-backed option store.
//!
//! The whole table lives in memory and is written through to a JSON document
//! after every mutation. Writes go to a sibling temp file first and are then
//! renamed over the original.
//!
//! Each write serialises the full table, so a run of N mutations costs N
//! rewrites. Bulk work (sweeps, delete-all) runs inside [`OptionStore::batch`],
//! which defers the rewrite to a single flush at the end.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use super::{OptionStore, OptionTable};
use crate::error::{Result, TransientError};

// == File Options ==
/// Option rows persisted to a JSON file.
#[derive(Debug)]
pub struct FileOptions {
    path: PathBuf,
    table: RwLock<OptionTable>,
    /// Open batches; writes are held back while non-zero
    deferred: AtomicUsize,
    /// In-memory changes not yet on disk
    dirty: AtomicBool,
}

impl FileOptions {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let table = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                OptionTable::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| {
                    TransientError::Storage(format!("{} is not a valid option table: {e}", path.display()))
                })?
            }
        } else {
            OptionTable::new()
        };

        debug!(path = %path.display(), rows = table.len(), "Option table opened");

        Ok(Self {
            path,
            table: RwLock::new(table),
            deferred: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &OptionTable) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Persists after a mutation of `name`, or marks the table dirty while a
    /// batch is open. Must be called with the write lock held; `false` means
    /// the caller has to roll the mutation back.
    fn commit(&self, table: &OptionTable, name: &str) -> bool {
        if self.deferred.load(Ordering::Acquire) > 0 {
            self.dirty.store(true, Ordering::Release);
            return true;
        }
        match self.persist(table) {
            Ok(()) => {
                self.dirty.store(false, Ordering::Release);
                true
            }
            Err(e) => {
                warn!(option = name, path = %self.path.display(), "Failed to persist option table: {e}");
                false
            }
        }
    }

    /// Writes out changes held back by a batch. A failed flush keeps the
    /// changes in memory; the next successful write carries them to disk.
    fn flush(&self) {
        let table = self.table.read();
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return;
        }
        match self.persist(&table) {
            Ok(()) => debug!(path = %self.path.display(), rows = table.len(), "Batched option writes flushed"),
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to flush option table: {e}");
                self.dirty.store(true, Ordering::Release);
            }
        }
    }
}

/// Closes a batch on drop, flushing when it was the outermost one.
struct Deferred<'a>(&'a FileOptions);

impl Drop for Deferred<'_> {
    fn drop(&mut self) {
        if self.0.deferred.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.flush();
        }
    }
}

impl OptionStore for FileOptions {
    fn add(&self, name: &str, value: Value, autoload: bool) -> bool {
        let mut table = self.table.write();
        if !table.add(name, value, autoload) {
            return false;
        }
        if self.commit(&table, name) {
            return true;
        }
        table.remove(name);
        false
    }

    fn update(&self, name: &str, value: Value) -> bool {
        let mut table = self.table.write();
        let Some(previous) = table.update(name, value) else {
            return false;
        };
        if self.commit(&table, name) {
            return true;
        }
        table.update(name, previous);
        false
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.table.read().get(name).cloned()
    }

    fn delete(&self, name: &str) -> bool {
        let mut table = self.table.write();
        let Some(row) = table.remove(name) else {
            return false;
        };
        if self.commit(&table, name) {
            return true;
        }
        table.restore(name, row);
        false
    }

    fn delete_if(&self, name: &str, expected: &Value) -> bool {
        let mut table = self.table.write();
        let Some(row) = table.remove_if(name, expected) else {
            return false;
        };
        if self.commit(&table, name) {
            return true;
        }
        table.restore(name, row);
        false
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

    fn batch(&self, work: &mut dyn FnMut()) {
        self.deferred.fetch_add(1, Ordering::AcqRel);
        let _deferred = Deferred(self);
        work();
    }
}
