//! Get-or-create handle cache shared by every hierarchy level.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use cattlectl_core::Result;
use parking_lot::Mutex;

pub(crate) struct HandleCache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> Default for HandleCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V> HandleCache<K, V> {
    /// Cached handle for `key`, built by `make` on first access.
    pub(crate) fn get_or_insert_with(&self, key: K, make: impl FnOnce() -> V) -> Arc<V> {
        Arc::clone(
            self.entries
                .lock()
                .entry(key)
                .or_insert_with(|| Arc::new(make())),
        )
    }

    /// Like [`HandleCache::get_or_insert_with`], but failed constructions
    /// are not cached.
    pub(crate) fn try_get_or_insert_with(
        &self,
        key: K,
        make: impl FnOnce() -> Result<V>,
    ) -> Result<Arc<V>> {
        let mut entries = self.entries.lock();
        if let Some(handle) = entries.get(&key) {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(make()?);
        entries.insert(key, Arc::clone(&handle));
        Ok(handle)
    }

    /// Register an existing handle under another key, keeping any entry
    /// already present.
    pub(crate) fn share(&self, key: K, handle: &Arc<V>) {
        self.entries
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::clone(handle));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
