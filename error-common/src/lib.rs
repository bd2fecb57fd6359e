//! Common error handling utilities for the ClinicDesk engine
//!
//! Every service in the workspace reports failures through [`ClinicError`],
//! so callers (UI actions, tests, the bootstrap crate) only ever deal with
//! one taxonomy:
//!
//! - **Validation**: a required field is missing or empty on a write
//! - **Duplicate**: an id collision on create
//! - **NotFound**: an id referenced by update/delete/apply does not exist
//! - **StoreUnavailable**: the backing medium is unreachable, timed out or
//!   rejected the write
//!
//! Empty query results are never errors.
//!
//! # Example
//!
//! ```rust
//! use error_common::{ClinicError, Result};
//!
//! fn require_id(id: &str) -> Result<&str> {
//!     if id.trim().is_empty() {
//!         return Err(ClinicError::validation("Charge ID is required"));
//!     }
//!     Ok(id)
//! }
//!
//! let err = require_id("").unwrap_err();
//! assert_eq!(err.code(), error_common::codes::validation::MISSING_REQUIRED_FIELD);
//! ```

pub mod codes;
pub mod context;
pub mod types;

pub use context::*;
pub use types::*;
