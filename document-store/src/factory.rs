use crate::backends::{FileSystemStore, InMemoryStore, JsonBinStore};
use crate::collection::Store;
use crate::store::DocumentStore;
use config_engine::{StoreBackend, StoreConfig};
use error_common::{ClinicError, Result};
use std::sync::Arc;
use tracing::info;

/// Build the process-wide [`Store`] for the configured backend
///
/// # Errors
///
/// `Config` if the backend settings are incomplete, `StoreUnavailable` if the
/// backend cannot be initialised.
pub async fn open_store(config: &StoreConfig) -> Result<Store> {
    let backend: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
        StoreBackend::File => {
            let data_dir = config.data_dir.as_ref().ok_or_else(|| {
                ClinicError::Config("file backend requires store.data_dir".to_string())
            })?;
            let store = FileSystemStore::new(data_dir);
            store.initialize().await?;
            Arc::new(store)
        }
        StoreBackend::JsonBin => {
            Arc::new(JsonBinStore::new(config.json_bin.clone(), config.timeout())?)
        }
    };

    info!(
        backend = backend.backend_name(),
        timeout_seconds = config.timeout_seconds,
        "Document store opened"
    );
    Ok(Store::new(backend, config.timeout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_opens_memory_store_by_default() {
        let store = open_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_file_backend_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("clinic-data");
        let config = StoreConfig {
            backend: StoreBackend::File,
            data_dir: Some(data_dir.clone()),
            ..StoreConfig::default()
        };

        let store = open_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "file");
        assert!(data_dir.is_dir());
    }

    #[tokio::test]
    async fn test_file_backend_without_dir_is_config_error() {
        let config = StoreConfig {
            backend: StoreBackend::File,
            ..StoreConfig::default()
        };
        let err = open_store(&config).await.err().unwrap();
        assert!(matches!(err, ClinicError::Config(_)));
    }
}
