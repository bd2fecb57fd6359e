//! Patient alerts: form submissions, scheduled appointments and incoming
//! messages that a provider has to look at.
//!
//! An alert is open while it has no `resolvedDate`. [`AlertService::resolve`]
//! closes it and records the resolving provider, [`AlertService::reopen`]
//! puts it back on the action list.

pub mod models;
pub mod service;

pub use models::*;
pub use service::*;
