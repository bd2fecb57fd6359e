use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Error context information attached to a failed operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub operation: Option<String>,
    pub collection: Option<String>,
    pub aggregate_id: Option<String>,
    pub additional: HashMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_aggregate_id(mut self, aggregate_id: impl Into<String>) -> Self {
        self.aggregate_id = Some(aggregate_id.into());
        self
    }

    pub fn add_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    /// Render as `key=value` pairs for log lines
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(op) = &self.operation {
            parts.push(format!("operation={op}"));
        }
        if let Some(collection) = &self.collection {
            parts.push(format!("collection={collection}"));
        }
        if let Some(id) = &self.aggregate_id {
            parts.push(format!("id={id}"));
        }
        let mut extra: Vec<_> = self.additional.iter().collect();
        extra.sort();
        for (k, v) in extra {
            parts.push(format!("{k}={v}"));
        }
        parts.join(" ")
    }
}
