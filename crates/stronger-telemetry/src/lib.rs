//! # Stronger Telemetry
//!
//! Observability for the in-process event bus.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with env filter, plain or JSON output
//! - **Metrics**: Prometheus counters for publish, drop and handler outcomes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stronger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `stronger-notify` | Service name in logs |
//! | `STRONGER_LOG_LEVEL` | `info` | Log level filter |
//! | `STRONGER_JSON_LOGS` | `false` | JSON log output |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{gather_text, register_metrics, DropReason, FailureKind, HandlerTimer};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    Ok(())
}
