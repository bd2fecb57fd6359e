use crate::settings::{ClinicConfig, StoreBackend};
use error_common::{ClinicError, Result};

impl ClinicConfig {
    /// Reject configurations that could never reach a store.
    ///
    /// Bins for individual collections are checked lazily, when a collection
    /// is first accessed, so a deployment may only configure the ones it uses.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.store.timeout_seconds == 0 {
            return Err(ClinicError::Config(
                "store.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        match self.store.backend {
            StoreBackend::Memory => {}
            StoreBackend::File => {
                if self.store.data_dir.is_none() {
                    return Err(ClinicError::Config(
                        "store.data_dir is required for the file backend".to_string(),
                    ));
                }
            }
            StoreBackend::JsonBin => {
                let base_url = self.store.json_bin.base_url.trim();
                if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                    return Err(ClinicError::Config(format!(
                        "store.json_bin.base_url must be an http(s) URL, got '{base_url}'"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ClinicConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ClinicConfig::default();
        config.store.timeout_seconds = 0;
        assert!(matches!(config.validate(), Err(ClinicError::Config(_))));
    }

    #[test]
    fn test_file_backend_requires_data_dir() {
        let mut config = ClinicConfig::default();
        config.store.backend = StoreBackend::File;
        assert!(config.validate().is_err());

        config.store.data_dir = Some(PathBuf::from("/tmp/clinic"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_bin_requires_http_url() {
        let mut config = ClinicConfig::default();
        config.store.backend = StoreBackend::JsonBin;
        config.store.json_bin.base_url = "ftp://bins".to_string();
        assert!(config.validate().is_err());
    }
}
