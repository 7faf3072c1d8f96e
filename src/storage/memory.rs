use super::{ObjectStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Fixed set of objects held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.into(), body.into());
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
