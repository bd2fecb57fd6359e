//! Billing for the clinic: patient charges and stored payment methods
//!
//! Provides:
//! - The charge ledger, which keeps `totalOutstanding` and the payment-driven
//!   status consistent with a charge's payments and adjustments
//! - The payment method registry, which keeps at most one default method per
//!   patient
//! - Per-patient balance summaries
//!
//! Both services take a shared [`document_store::Store`] at construction.

pub mod ledger;
pub mod models;
pub mod payment_methods;
pub mod reporting;

pub use ledger::*;
pub use models::*;
pub use payment_methods::*;
pub use reporting::*;
