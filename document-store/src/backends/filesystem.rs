use crate::error::{StoreError, StoreResult};
use crate::store::{is_valid_collection_name, DocumentStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Local file store, one JSON document per collection
///
/// Each `<collection>.json` holds `{ "<collection>": [ ... ] }`. Writes go to
/// a sibling temp file that is renamed over the original, so a crash mid-write
/// leaves the previous document intact.
pub struct FileSystemStore {
    /// Base directory for storage
    base_path: PathBuf,
}

impl FileSystemStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Create the base directory
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub async fn initialize(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn document_path(&self, collection: &str) -> StoreResult<PathBuf> {
        if !is_valid_collection_name(collection) {
            return Err(StoreError::Unavailable(format!(
                "invalid collection name '{collection}'"
            )));
        }
        Ok(self.base_path.join(format!("{collection}.json")))
    }

    fn extract_items(collection: &str, document: Value) -> StoreResult<Vec<Value>> {
        let corrupted = |reason: &str| StoreError::Corrupted {
            collection: collection.to_string(),
            reason: reason.to_string(),
        };

        match document {
            Value::Object(mut map) => match map.remove(collection) {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Array(items)) => Ok(items),
                Some(_) => Err(corrupted("collection key does not hold an array")),
            },
            Value::Null => Ok(Vec::new()),
            _ => Err(corrupted("document root is not an object")),
        }
    }
}

#[async_trait]
impl DocumentStore for FileSystemStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn read(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let path = self.document_path(collection)?;

        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: Value = serde_json::from_str(&content).map_err(|e| StoreError::Corrupted {
            collection: collection.to_string(),
            reason: e.to_string(),
        })?;

        let items = Self::extract_items(collection, document)?;
        debug!(collection, path = %path.display(), count = items.len(), "Read document");
        Ok(items)
    }

    async fn write(&self, collection: &str, items: Vec<Value>) -> StoreResult<()> {
        let path = self.document_path(collection)?;
        fs::create_dir_all(&self.base_path).await?;

        let count = items.len();
        let mut document = Map::new();
        document.insert(collection.to_string(), Value::Array(items));
        let content = serde_json::to_string_pretty(&Value::Object(document)).map_err(|e| {
            StoreError::Corrupted {
                collection: collection.to_string(),
                reason: e.to_string(),
            }
        })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!(collection, path = %path.display(), count, "Wrote document");
        Ok(())
    }
}
