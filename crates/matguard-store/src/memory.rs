use std::collections::HashMap;
use std::sync::Arc;

use matguard_error::{MatGuardError, Result};
use parking_lot::Mutex;

use crate::traits::KvStore;

#[derive(Debug, Default)]
struct MemoryStoreInner {
    entries: HashMap<String, String>,
    /// Bytes currently charged against the quota (`key.len() + value.len()`).
    used_bytes: usize,
}

/// An in-memory store for volatile tiers and tests.
///
/// Clones share the same map, so a clone handed to the durability layer and
/// one kept by a test observe each other's writes. An optional byte quota
/// reproduces the quota-exceeded failures browsers raise.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store without a quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes past `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently charged against the quota.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.inner.lock().used_bytes
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, as a browser does when the session ends.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.used_bytes = 0;
    }
}

impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let previous = inner
            .entries
            .get(key)
            .map_or(0, |old| key.len() + old.len());
        let needed = key.len() + value.len();
        let used_without = inner.used_bytes - previous;

        if let Some(quota) = self.quota_bytes {
            let available = quota.saturating_sub(used_without);
            if needed > available {
                return Err(MatGuardError::QuotaExceeded {
                    key: key.to_owned(),
                    needed,
                    available,
                });
            }
        }

        inner.entries.insert(key.to_owned(), value.to_owned());
        inner.used_bytes = used_without + needed;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.remove(key) {
            inner.used_bytes -= key.len() + old.len();
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().entries.keys().cloned().collect())
    }
}
