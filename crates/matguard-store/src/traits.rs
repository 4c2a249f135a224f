use std::sync::Arc;

use matguard_error::Result;

/// A string key-value store.
///
/// This trait abstracts the host's storage, allowing different backends: a
/// directory on disk (durable), an in-memory map (volatile, testing), or a
/// host binding such as browser `localStorage`/`sessionStorage`.
///
/// Calls are synchronous and expected to finish in microseconds to low
/// milliseconds. `set` may fail (quota, I/O); callers in the durability
/// layer absorb that failure.
pub trait KvStore: Send + Sync {
    /// Short backend name for logs (e.g., "memory", "dir").
    fn name(&self) -> &'static str;

    /// Read the value stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present, in unspecified order.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}
