use error_common::ClinicError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Corrupted document in collection '{collection}': {reason}")]
    Corrupted { collection: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Unavailable(format!("request timed out: {err}"))
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

impl From<StoreError> for ClinicError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupted { .. } => ClinicError::Serialization(err.to_string()),
            other => ClinicError::StoreUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_store_unavailable() {
        let err: ClinicError = StoreError::Timeout(Duration::from_secs(2)).into();
        assert!(matches!(err, ClinicError::StoreUnavailable(_)));
    }

    #[test]
    fn test_corrupted_maps_to_serialization() {
        let err: ClinicError = StoreError::Corrupted {
            collection: "charges".into(),
            reason: "expected array".into(),
        }
        .into();
        assert!(matches!(err, ClinicError::Serialization(_)));
    }
}
