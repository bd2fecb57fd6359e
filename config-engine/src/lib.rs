//! Configuration management for the ClinicDesk engine
//!
//! Configuration is layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults (in-memory store, 10 second store timeout, `info` logs)
//! 2. An optional configuration file (YAML, TOML or JSON, detected by extension)
//! 3. Environment variables prefixed with `CLINIC__`, nested with `__`
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::{ClinicConfig, StoreBackend};
//!
//! // CLINIC__STORE__BACKEND=file CLINIC__STORE__DATA_DIR=/var/lib/clinic
//! let config = ClinicConfig::load(Some("clinic.yaml".as_ref()))?;
//! if config.store.backend == StoreBackend::File {
//!     println!("documents live in {:?}", config.store.data_dir);
//! }
//! # Ok::<(), error_common::ClinicError>(())
//! ```
//!
//! ```yaml
//! store:
//!   backend: json_bin
//!   timeout_seconds: 10
//!   json_bin:
//!     base_url: https://api.jsonbin.io/v3
//!     bins:
//!       charges: 6864be378960c979a5b5a0cd
//!       alerts: 6864be468a456b7966b9dd28
//! logging:
//!   log_level: info
//!   format: json
//! ```

pub mod settings;
pub mod validation;

pub use settings::*;
