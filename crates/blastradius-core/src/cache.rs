use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Memoizes "which files consume this symbol" lookups across calls, keyed by
/// the symbol's stable identity (defining file path + symbol name).
///
/// The cache is an explicit object threaded through matcher calls, never a
/// process-wide singleton; concurrent runs over the same project may share
/// one instance. Re-analysis after the project changes must invalidate the
/// touched files (or clear) before reuse.
#[derive(Debug, Default)]
pub struct ReferenceCache {
    consumers: DashMap<String, Arc<BTreeSet<String>>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(file_path: &str, symbol: &str) -> String {
        format!("{}::{}", file_path, symbol)
    }

    pub fn get(&self, key: &str) -> Option<Arc<BTreeSet<String>>> {
        self.consumers.get(key).map(|entry| Arc::clone(&entry))
    }

    pub fn insert(&self, key: String, consumers: BTreeSet<String>) -> Arc<BTreeSet<String>> {
        let shared = Arc::new(consumers);
        self.consumers.insert(key, Arc::clone(&shared));
        shared
    }

    /// Drops every memoized symbol of one defining file.
    pub fn invalidate_file(&self, file_path: &str) {
        let prefix = format!("{}::", file_path);
        self.consumers.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn clear(&self) {
        self.consumers.clear();
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }
}
