use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;

/// Names of the collections the clinic application persists
pub mod collections {
    pub const CHARGES: &str = "charges";
    pub const PAYMENT_METHODS: &str = "payment_methods";
    pub const PATIENTS: &str = "patients";
    pub const EVENTS: &str = "events";
    pub const MEMOS: &str = "memos";
    pub const DOCTOR_NOTES: &str = "doctor_notes";
    pub const ALERTS: &str = "alerts";

    pub const ALL: [&str; 7] = [CHARGES, PAYMENT_METHODS, PATIENTS, EVENTS, MEMOS, DOCTOR_NOTES, ALERTS];
}

/// Whole-collection persistence interface
///
/// There is no single-record primitive: every mutation is read-whole,
/// transform-whole, write-whole. Serialisation of concurrent writers is the
/// job of [`crate::Collection`], not of the backend.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short name used in logs
    fn backend_name(&self) -> &'static str;

    /// Current contents of `collection`.
    ///
    /// A collection that was never written reads as empty, never as an error.
    async fn read(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// Replace the entire collection.
    async fn write(&self, collection: &str, items: Vec<Value>) -> StoreResult<()>;
}

/// Reject names that could escape a data directory or a URL path segment
pub(crate) fn is_valid_collection_name(collection: &str) -> bool {
    !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
