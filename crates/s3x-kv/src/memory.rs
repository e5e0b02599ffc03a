use std::collections::HashMap;
use std::sync::RwLock;

use crate::config::KvConfig;
use crate::error::{KvError, KvResult};
use crate::traits::KvStore;

/// In-memory KV store for tests and embedding.
pub struct InMemoryKvStore {
    max_value_size: usize,
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryKvStore {
    pub fn new(config: &KvConfig) -> Self {
        Self {
            max_value_size: config.max_value_size,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }

    pub fn len(&self) -> usize {
        self.values.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new(&KvConfig::default())
    }
}

impl KvStore for InMemoryKvStore {
    fn put(&self, key: &str, value: &[u8]) -> KvResult<()> {
        if value.len() > self.max_value_size {
            return Err(KvError::ValueTooLarge {
                size: value.len(),
                max: self.max_value_size,
            });
        }
        let mut map = self.values.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> KvResult<Vec<u8>> {
        let map = self.values.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| KvError::NotFound(key.to_string()))
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        let mut map = self.values.write().expect("lock poisoned");
        Ok(map.remove(key).is_some())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("max_value_size", &self.max_value_size)
            .field("key_count", &self.len())
            .finish()
    }
}
