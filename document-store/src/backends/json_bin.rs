use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;
use async_trait::async_trait;
use config_engine::JsonBinConfig;
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// Remote JSON-bin document service
///
/// Each collection maps to one bin. `GET {base_url}/b/{bin}` returns
/// `{ "record": { "<collection>": [...] }, "metadata": {...} }`, and `PUT`
/// replaces the record. Several collections may share one bin, so a write
/// re-reads the record and only replaces its own key, holding the bin's lock
/// from the read until the `PUT` completes.
pub struct JsonBinStore {
    client: Client,
    config: JsonBinConfig,
    bin_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl JsonBinStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the HTTP client cannot be built.
    pub fn new(config: JsonBinConfig, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            bin_locks: DashMap::new(),
        })
    }

    fn bin_lock(&self, url: &str) -> Arc<Mutex<()>> {
        self.bin_locks
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn bin_url(&self, collection: &str) -> StoreResult<String> {
        let bin = self.config.bins.get(collection).ok_or_else(|| {
            StoreError::Unavailable(format!("no bin configured for collection '{collection}'"))
        })?;
        Ok(format!(
            "{}/b/{}",
            self.config.base_url.trim_end_matches('/'),
            bin
        ))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.master_key {
            Some(key) => request.header(MASTER_KEY_HEADER, key),
            None => request,
        }
    }

    /// Current record of a bin, `None` if the bin does not exist yet
    async fn fetch_record(&self, url: &str) -> StoreResult<Option<Map<String, Value>>> {
        let response = self.with_auth(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            warn!(status = %response.status(), "JSONBin read failed");
            return Err(StoreError::Http(format!(
                "JSONBin API error: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Object(mut envelope) => match envelope.remove("record") {
                Some(Value::Object(record)) => Ok(Some(record)),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonBinStore {
    fn backend_name(&self) -> &'static str {
        "json_bin"
    }

    async fn read(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let url = self.bin_url(collection)?;
        let record = self.fetch_record(&url).await?;

        let items = match record.and_then(|mut r| r.remove(collection)) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(StoreError::Corrupted {
                    collection: collection.to_string(),
                    reason: "collection key does not hold an array".to_string(),
                })
            }
        };

        debug!(collection, count = items.len(), "Read bin");
        Ok(items)
    }

    async fn write(&self, collection: &str, items: Vec<Value>) -> StoreResult<()> {
        let url = self.bin_url(collection)?;
        let count = items.len();

        let lock = self.bin_lock(&url);
        let _guard = lock.lock().await;
        let mut record = self.fetch_record(&url).await?.unwrap_or_default();
        record.insert(collection.to_string(), Value::Array(items));

        let response = self
            .with_auth(self.client.put(&url))
            .json(&Value::Object(record))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(collection, status = %response.status(), "JSONBin write rejected");
            return Err(StoreError::Unavailable(format!(
                "JSONBin API error: {}",
                response.status()
            )));
        }

        debug!(collection, count, "Wrote bin");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::collections::HashMap;

    fn create_test_store(base_url: &str, master_key: Option<&str>) -> JsonBinStore {
        let config = JsonBinConfig {
            base_url: base_url.to_string(),
            master_key: master_key.map(str::to_string),
            bins: HashMap::from([
                ("charges".to_string(), "bin-charges".to_string()),
                ("patients".to_string(), "bin-shared".to_string()),
                ("payment_methods".to_string(), "bin-shared".to_string()),
            ]),
        };
        JsonBinStore::new(config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_read_unwraps_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/b/bin-charges")
            .match_header("x-master-key", "key-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"record":{"charges":[{"id":"ch_1"}]},"metadata":{"id":"bin-charges"}}"#)
            .create_async()
            .await;

        let store = create_test_store(&server.url(), Some("key-1"));
        let items = store.read("charges").await.unwrap();

        mock.assert_async().await;
        assert_eq!(items, vec![json!({"id": "ch_1"})]);
    }

    #[tokio::test]
    async fn test_missing_bin_reads_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/b/bin-charges")
            .with_status(404)
            .create_async()
            .await;

        let store = create_test_store(&server.url(), None);
        assert!(store.read("charges").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/b/bin-charges")
            .with_status(503)
            .create_async()
            .await;

        let store = create_test_store(&server.url(), None);
        assert!(matches!(
            store.read("charges").await.unwrap_err(),
            StoreError::Http(_)
        ));
    }

    #[tokio::test]
    async fn test_write_preserves_sibling_collection_in_shared_bin() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/b/bin-shared")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"record":{"patients":[{"id":"p_1"}]}}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/b/bin-shared")
            .match_body(Matcher::Json(json!({
                "patients": [{"id": "p_1"}],
                "payment_methods": [{"id": "pm_1"}]
            })))
            .with_status(200)
            .create_async()
            .await;

        let store = create_test_store(&server.url(), None);
        store
            .write("payment_methods", vec![json!({"id": "pm_1"})])
            .await
            .unwrap();

        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_shared_bin_keep_both_collections() {
        let mut server = mockito::Server::new_async().await;
        let bin = Arc::new(std::sync::Mutex::new(json!({"patients": [{"id": "p_1"}]})));

        let current = Arc::clone(&bin);
        server
            .mock("GET", "/b/bin-shared")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                let record = current.lock().unwrap().clone();
                json!({ "record": record }).to_string().into_bytes()
            })
            .expect_at_least(2)
            .create_async()
            .await;

        let stored = Arc::clone(&bin);
        server
            .mock("PUT", "/b/bin-shared")
            .with_status(200)
            .with_body_from_request(move |request| {
                let body: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
                *stored.lock().unwrap() = body;
                b"{}".to_vec()
            })
            .expect(2)
            .create_async()
            .await;

        let store = Arc::new(create_test_store(&server.url(), None));
        let (a, b) = tokio::join!(
            store.write("payment_methods", vec![json!({"id": "pm_1"})]),
            store.write("patients", vec![json!({"id": "p_1"}), json!({"id": "p_2"})]),
        );
        a.unwrap();
        b.unwrap();

        let record = bin.lock().unwrap().clone();
        assert_eq!(record["payment_methods"], json!([{"id": "pm_1"}]));
        assert_eq!(record["patients"], json!([{"id": "p_1"}, {"id": "p_2"}]));
    }

    #[tokio::test]
    async fn test_rejected_write_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/b/bin-charges")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("PUT", "/b/bin-charges")
            .with_status(401)
            .create_async()
            .await;

        let store = create_test_store(&server.url(), None);
        let err = store.write("charges", vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_collection_is_unavailable() {
        let store = create_test_store("http://127.0.0.1:9", None);
        let err = store.read("alerts").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
