use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-process store for tests and development
#[derive(Default)]
pub struct InMemoryStore {
    collections: Arc<DashMap<String, Vec<Value>>>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection without going through a service
    pub fn with_collection(self, collection: &str, items: Vec<Value>) -> Self {
        self.collections.insert(collection.to_string(), items);
        self
    }

    /// Make every subsequent write fail as if the medium were unreachable
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, collection: &str) -> StoreResult<Vec<Value>> {
        Ok(self
            .collections
            .get(collection)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn write(&self, collection: &str, items: Vec<Value>) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "write to '{collection}' rejected"
            )));
        }
        self.collections.insert(collection.to_string(), items);
        Ok(())
    }
}
