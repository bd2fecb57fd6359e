use config::{Config, Environment, File};
use error_common::{ClinicError, Result};
use logger_redacted::LoggerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable prefix, e.g. `CLINIC__STORE__BACKEND`
pub const ENV_PREFIX: &str = "CLINIC";

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_JSON_BIN_URL: &str = "https://api.jsonbin.io/v3";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicConfig {
    pub store: StoreConfig,
    pub logging: LoggerConfig,
}

/// Which physical medium backs the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
    JsonBin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Directory holding one `<collection>.json` file per collection
    pub data_dir: Option<PathBuf>,
    /// Upper bound on every single read or write against the backend
    pub timeout_seconds: u64,
    pub json_bin: JsonBinConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            data_dir: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            json_bin: JsonBinConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Remote JSON-bin service settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonBinConfig {
    pub base_url: String,
    /// Sent as `X-Master-Key` when present
    pub master_key: Option<String>,
    /// Collection name to bin id
    pub bins: HashMap<String, String>,
}

impl Default for JsonBinConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_JSON_BIN_URL.to_string(),
            master_key: None,
            bins: HashMap::new(),
        }
    }
}

impl fmt::Debug for JsonBinConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonBinConfig")
            .field("base_url", &self.base_url)
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field("bins", &self.bins)
            .finish()
    }
}

impl ClinicConfig {
    /// Load defaults, then the optional file, then `CLINIC__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] if a source cannot be parsed or the
    /// merged configuration fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

        let config: ClinicConfig = builder
            .build()
            .and_then(|c| c.try_deserialize::<ClinicConfig>())
            .map_err(|e| ClinicError::Config(format!("Failed to load configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}
