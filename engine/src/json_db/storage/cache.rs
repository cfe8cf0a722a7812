// FICHIER : engine/src/json_db/storage/cache.rs

//! Module de gestion de cache LRU (Least Recently Used) thread-safe.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(n) => n,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
pub struct Cache<K: Hash + Eq, V> {
    // Mutex car LruCache réordonne les entrées à chaque lecture
    store: Arc<Mutex<LruCache<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            store: Arc::new(Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut guard = self.store.lock().ok()?;
        guard.get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        if let Ok(mut guard) = self.store.lock() {
            // L'insertion gère l'éviction si la capacité est dépassée
            guard.put(key, value);
        }
    }

    pub fn remove(&self, key: &K) {
        if let Ok(mut guard) = self.store.lock() {
            guard.pop(key);
        }
    }

    /// Retire toutes les entrées dont la clé satisfait le prédicat.
    pub fn remove_where<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool,
    {
        if let Ok(mut guard) = self.store.lock() {
            let doomed: Vec<K> = guard
                .iter()
                .filter(|(k, _)| predicate(k))
                .map(|(k, _)| k.clone())
                .collect();
            for key in doomed {
                guard.pop(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
