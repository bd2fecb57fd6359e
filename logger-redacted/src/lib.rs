pub mod config;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use redactor::*;

#[doc(hidden)]
pub use tracing;

use error_common::{ClinicError, Result};
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, fmt::time::ChronoUtc, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Structured logging with PII redaction for clinic data
///
/// Patient names, emails, phone numbers and payment instrument details travel
/// through the billing and alert services. Free-text that may carry them is
/// passed through [`redact`] (or the `redacted_*!` macros) before it reaches a
/// log line.
///
/// # Example
///
/// ```rust
/// use logger_redacted::{RedactedLogger, LoggerConfig, LogFormat};
///
/// let config = LoggerConfig {
///     format: LogFormat::Json,
///     ..LoggerConfig::default()
/// };
/// RedactedLogger::init(&config).ok();
///
/// logger_redacted::redacted_info!("Payment method added for {}", "jane.doe@example.com");
/// // Output: "Payment method added for EMAIL[…]"
/// ```
pub struct RedactedLogger;

lazy_static! {
    static ref GLOBAL_REDACTOR: PiiRedactor = PiiRedactor::default();
}

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

impl RedactedLogger {
    /// Install the global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over `config.log_level`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::Config`] if the filter directive is invalid or a
    /// global subscriber is already installed.
    pub fn init(config: &LoggerConfig) -> Result<()> {
        REDACTION_ENABLED.store(config.redaction_enabled, Ordering::Relaxed);

        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
                ClinicError::Config(format!("Invalid log level '{}': {}", config.log_level, e))
            })?,
        };

        let registry = tracing_subscriber::registry().with(env_filter);
        let installed = match config.format {
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_level(true),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .json(),
                )
                .try_init(),
        };

        installed.map_err(|e| ClinicError::Config(format!("Failed to install logger: {e}")))
    }
}

/// Redact PII from free text with the process-wide redactor
pub fn redact(text: &str) -> String {
    if REDACTION_ENABLED.load(Ordering::Relaxed) {
        GLOBAL_REDACTOR.redact(text)
    } else {
        text.to_string()
    }
}
