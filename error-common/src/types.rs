use crate::codes;
use thiserror::Error;

/// Error taxonomy shared by every ClinicDesk service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClinicError {
    /// Missing or empty required field on a write operation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Id collision on create
    #[error("Duplicate error: {0}")]
    Duplicate(String),

    /// Id referenced by update/delete/apply does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing medium unreachable, timed out, or write rejected
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored document could not be decoded into the aggregate type
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClinicError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Stable code for API responses and log correlation
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => codes::validation::MISSING_REQUIRED_FIELD,
            Self::Duplicate(_) => codes::conflict::DUPLICATE_ID,
            Self::NotFound(_) => codes::lookup::NOT_FOUND,
            Self::StoreUnavailable(_) => codes::store::UNAVAILABLE,
            Self::Serialization(_) => codes::store::CORRUPTED_DOCUMENT,
            Self::Config(_) => codes::configuration::INVALID_CONFIG,
        }
    }

    /// Short category name, used as a structured log field
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Duplicate(_) => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Serialization(_) => "serialization",
            Self::Config(_) => "config",
        }
    }

    /// Whether the failure was caused by the caller's input rather than the system
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Duplicate(_) | Self::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for ClinicDesk operations
pub type Result<T> = std::result::Result<T, ClinicError>;

/// Log an error with its code and category.
///
/// Client errors are logged at `warn`, system errors at `error`.
pub fn log_error(context: &str, error: &ClinicError) {
    if error.is_client_error() {
        tracing::warn!(
            context = context,
            error_code = error.code(),
            error_type = error.error_type(),
            "{}",
            error
        );
    } else {
        tracing::error!(
            context = context,
            error_code = error.code(),
            error_type = error.error_type(),
            "{}",
            error
        );
    }
}

/// Reject an empty or whitespace-only required field with `Validation`
///
/// # Errors
///
/// `ClinicError::Validation` carrying `message` when `value` is blank.
pub fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClinicError::validation(message));
    }
    Ok(())
}
