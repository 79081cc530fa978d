use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::metrics;

/// Process-wide map from principal to the last value it wrote.
///
/// Lives for the lifetime of the process; nothing is evicted or persisted.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the value stored for `principal`, returning the previous one.
    pub fn write(&self, principal: &str, value: impl Into<String>) -> Option<String> {
        metrics::STORE_WRITES.inc();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(principal.to_string(), value.into())
    }

    pub fn read(&self, principal: &str) -> Option<String> {
        metrics::STORE_READS.inc();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(principal)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
