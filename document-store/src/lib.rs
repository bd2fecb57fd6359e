//! Whole-collection JSON document store
//!
//! Each entity type lives in one named collection, a flat ordered array of
//! JSON documents keyed by `id`. Backends only know how to read and replace a
//! whole collection; [`Collection`] layers typed access, id checks, timeouts
//! and per-collection writer serialisation on top.
//!
//! # Example
//!
//! ```rust,no_run
//! use document_store::{open_store, Aggregate};
//! use config_engine::StoreConfig;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct Memo {
//!     id: String,
//!     note: String,
//! }
//!
//! impl Aggregate for Memo {
//!     const COLLECTION: &'static str = "memos";
//!     const KIND: &'static str = "Memo";
//!     fn id(&self) -> &str {
//!         &self.id
//!     }
//! }
//!
//! # async fn example() -> error_common::Result<()> {
//! let store = open_store(&StoreConfig::default()).await?;
//! let memos = store.collection::<Memo>();
//! memos.insert(Memo { id: "m1".into(), note: "Call back".into() }).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod collection;
pub mod error;
pub mod factory;
pub mod flags;
pub mod store;

pub use backends::{FileSystemStore, InMemoryStore, JsonBinStore};
pub use collection::{Aggregate, Collection, Store};
pub use error::{StoreError, StoreResult};
pub use factory::open_store;
pub use flags::{clear_flag_siblings, flagged_count, Flagged};
pub use store::{collections, DocumentStore};
