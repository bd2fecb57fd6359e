use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;
use dashmap::DashMap;
use error_common::{log_error, ClinicError, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A top-level persisted entity identified by a unique `id`
pub trait Aggregate: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the aggregate lives in
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages, e.g. "Charge"
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// Process-wide handle to the document store
///
/// Constructed once at startup and cloned into every service. It owns one
/// writer lock per collection, so two services working on the same
/// collection still serialise their read-transform-write cycles.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn DocumentStore>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    timeout: Duration,
}

impl Store {
    pub fn new(backend: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        Self {
            backend,
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Typed view over the collection of `T`
    pub fn collection<T: Aggregate>(&self) -> Collection<T> {
        let lock = self
            .locks
            .entry(T::COLLECTION.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        Collection {
            backend: Arc::clone(&self.backend),
            lock,
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

/// Typed, writer-serialised access to one collection
///
/// Every mutation loads a fresh copy of the collection, transforms the copy
/// and reports success only once the store has accepted the write. A failed
/// write therefore leaves both the store and the caller's view unchanged.
pub struct Collection<T: Aggregate> {
    backend: Arc<dyn DocumentStore>,
    lock: Arc<Mutex<()>>,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Aggregate> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            lock: Arc::clone(&self.lock),
            timeout: self.timeout,
            _marker: PhantomData,
        }
    }
}

impl<T: Aggregate> Collection<T> {
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    /// Run a store call under the configured timeout
    async fn bounded<R>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<R>>,
    ) -> Result<R> {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };

        outcome.map_err(|e| {
            let err = ClinicError::from(e);
            let context = ErrorContext::new()
                .with_operation(operation)
                .with_collection(T::COLLECTION)
                .add_context("backend", self.backend.backend_name());
            log_error(&context.describe(), &err);
            err
        })
    }

    /// Decode the whole collection
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` if the backend cannot be read, `Serialization` if an
    /// item does not decode into `T`.
    pub async fn load(&self) -> Result<Vec<T>> {
        let raw = self
            .bounded("read", self.backend.read(T::COLLECTION))
            .await?;

        let items = raw
            .into_iter()
            .map(serde_json::from_value::<T>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                ClinicError::Serialization(format!(
                    "Collection '{}' holds an invalid {}: {}",
                    T::COLLECTION,
                    T::KIND,
                    e
                ))
            })?;

        debug!(collection = T::COLLECTION, count = items.len(), "Loaded collection");
        Ok(items)
    }

    async fn save(&self, items: &[T]) -> Result<()> {
        let raw = items
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;

        self.bounded("write", self.backend.write(T::COLLECTION, raw))
            .await
    }

    pub async fn all(&self) -> Result<Vec<T>> {
        self.load().await
    }

    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        Ok(self.load().await?.into_iter().find(|item| item.id() == id))
    }

    pub async fn filter<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|item| predicate(item))
            .collect())
    }

    /// Whole-collection read-transform-write under the collection lock.
    ///
    /// `transform` works on a private copy; nothing is written if it fails.
    ///
    /// # Errors
    ///
    /// Any error returned by `transform`, or the store's read/write error.
    pub async fn mutate<R, F>(&self, transform: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?;
        let outcome = transform(&mut items)?;
        self.save(&items).await?;
        Ok(outcome)
    }

    /// Append a new aggregate, rejecting id collisions
    ///
    /// # Errors
    ///
    /// `Duplicate` if an aggregate with the same id exists.
    pub async fn insert(&self, item: T) -> Result<T> {
        let id = item.id().to_string();
        let stored = self
            .mutate(|items| {
                if items.iter().any(|existing| existing.id() == item.id()) {
                    return Err(ClinicError::duplicate(format!(
                        "{} with ID '{}' already exists",
                        T::KIND,
                        item.id()
                    )));
                }
                items.push(item.clone());
                Ok(item)
            })
            .await?;

        info!(collection = T::COLLECTION, id = %id, "Inserted aggregate");
        Ok(stored)
    }

    /// Apply `update` to the aggregate with `id` and persist the collection
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent, or any error returned by `update`.
    pub async fn update_with<F>(&self, id: &str, update: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let updated = self
            .mutate(|items| {
                let item = items
                    .iter_mut()
                    .find(|item| item.id() == id)
                    .ok_or_else(|| Self::not_found(id))?;
                update(&mut *item)?;
                Ok(item.clone())
            })
            .await?;

        info!(collection = T::COLLECTION, id, "Updated aggregate");
        Ok(updated)
    }

    /// Remove the aggregate with `id` and return it
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` is absent.
    pub async fn delete(&self, id: &str) -> Result<T> {
        let removed = self
            .mutate(|items| {
                let index = items
                    .iter()
                    .position(|item| item.id() == id)
                    .ok_or_else(|| Self::not_found(id))?;
                Ok(items.remove(index))
            })
            .await?;

        info!(collection = T::COLLECTION, id, "Deleted aggregate");
        Ok(removed)
    }

    pub fn not_found(id: &str) -> ClinicError {
        ClinicError::not_found(format!("{} with ID '{}' not found", T::KIND, id))
    }
}
