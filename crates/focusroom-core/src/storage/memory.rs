use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::PersistenceGateway;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// In-process gateway. Clones share the same map, so a test can keep one
/// handle while the engine owns another. Reads and writes can be made to
/// fail on demand.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // A panicking test thread must not hide the map from the others.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful `set`/`remove` calls so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Raw value, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }
}

impl PersistenceGateway for MemoryGateway {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.lock();
        if inner.fail_reads {
            return Err(StorageError::read(key, "injected read failure"));
        }
        Ok(inner.values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::write(key, "injected write failure"));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::write(key, "injected write failure"));
        }
        inner.values.remove(key);
        inner.writes += 1;
        Ok(())
    }
}
